//! Bit masks over packed arrays.
//!
//! Every lane-parallel operation is whole-integer arithmetic followed by a
//! mask, so masks are computed once per [`Shape`] and shared through a
//! process-wide cache.
//!
//! Pictured for `S(len=5, bv=4, bp=4)`, lane 0 on the right:
//!
//! ```text
//! lane_ones   0000 0001  0000 0001  0000 0001  0000 0001  0000 0001
//! value_mask  0000 1111  0000 1111  0000 1111  0000 1111  0000 1111
//! pad_low     0001 0000  0001 0000  0001 0000  0001 0000  0001 0000
//! pad_mask    1111 0000  1111 0000  1111 0000  1111 0000  1111 0000
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::trace;

use crate::shape::Shape;

/// `n` low bits set.
pub fn ones(n: u64) -> BigUint {
    (BigUint::one() << n) - 1u32
}

/// The value 1 in each of `len` lanes of `bits_item` bits.
pub fn lane_ones(len: usize, bits_item: u32) -> BigUint {
    if len == 0 {
        return BigUint::zero();
    }
    // (2^(len*bi) - 1) / (2^bi - 1) == 1 + 2^bi + 2^(2*bi) + ...
    ones(len as u64 * u64::from(bits_item)) / ones(u64::from(bits_item))
}

type Cache = Mutex<HashMap<Shape, Arc<Masks>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Precomputed masks for one shape.
#[derive(Debug, PartialEq, Eq)]
pub struct Masks {
    shape: Shape,
    lane_ones: BigUint,
    value_mask: BigUint,
    pad_low: BigUint,
    pad_mask: BigUint,
    full: BigUint,
}

impl Masks {
    /// Compute the masks for `shape` without consulting the cache.
    pub fn compute(shape: Shape) -> Self {
        let lane_ones = lane_ones(shape.len(), shape.bits_item());
        let value_mask = &lane_ones * ones(u64::from(shape.bits_val()));
        let pad_low = &lane_ones << shape.bits_val();
        let pad_mask = &pad_low * ones(u64::from(shape.bits_pad()));
        let full = ones(shape.total_bits());
        Self {
            shape,
            lane_ones,
            value_mask,
            pad_low,
            pad_mask,
            full,
        }
    }

    /// Shared masks for `shape`, computed on first use.
    pub fn for_shape(shape: Shape) -> Arc<Self> {
        let mut cache = cache().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .entry(shape)
            .or_insert_with(|| {
                trace!(%shape, "computing lane masks");
                Arc::new(Self::compute(shape))
            })
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn is_cached(shape: Shape) -> bool {
        cache()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(&shape)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// 1 in every lane.
    pub fn lane_ones(&self) -> &BigUint {
        &self.lane_ones
    }

    /// Every value bit.
    pub fn value_mask(&self) -> &BigUint {
        &self.value_mask
    }

    /// Lowest padding bit of every lane (`2^bits_val` per lane).
    pub fn pad_low(&self) -> &BigUint {
        &self.pad_low
    }

    /// Every padding bit.
    pub fn pad_mask(&self) -> &BigUint {
        &self.pad_mask
    }

    /// Every bit of the array.
    pub fn full(&self) -> &BigUint {
        &self.full
    }

    /// Low `bits` value bits of every lane, clamped to `bits_val`. Spans the
    /// whole array, not one lane.
    pub fn low_value_bits(&self, bits: u32) -> BigUint {
        let bits = bits.min(self.shape.bits_val());
        &self.lane_ones * ones(u64::from(bits))
    }
}
