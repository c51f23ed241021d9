//! swar - packed-lane integer arithmetic
//!
//! Stores many small unsigned lanes in one arbitrary-width integer and
//! operates on all of them at once ("SIMD within a register"):
//! - Shape: lane count, value width and padding width
//! - Masks: per-shape bit masks, cached process-wide
//! - Lanes: the packed array with lane-wise arithmetic, bitwise operators,
//!   shifts, comparisons and reductions
//!
//! Lane arithmetic wraps modulo `2^bits_val`. Padding bits absorb carries and
//! borrows and are always zero between operations.

pub mod bits;
pub mod cmp;
pub mod error;
pub mod lanes;
pub mod mask;
pub mod ops;
pub mod shape;
pub mod telemetry;

pub use bits::Iter;
pub use error::{Result, SwarError};
pub use lanes::Lanes;
pub use mask::Masks;
pub use shape::{Shape, MAX_FIELD_BITS, MAX_TOTAL_BITS};
pub use telemetry::{default_directive, init_tracing};

/// swar library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
