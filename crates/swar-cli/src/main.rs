//! swar - packed-lane arithmetic from the command line
//!
//! ## Commands
//!
//! - `show`: decode a packed integer into its lanes
//! - `pack`: build a packed integer from lane values
//! - `binary`: apply a lane-wise binary operation or comparison
//! - `unary`: apply a lane-wise unary operation
//!
//! The lane layout comes from `--shape LEN,BV,BP` or the `SWAR_SHAPE`
//! environment variable.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use num_bigint::BigUint;
use serde::Serialize;
use swar_core::{Lanes, Shape};
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "swar")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Packed-lane integer arithmetic (SIMD within a register)", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Lane layout as LEN,BV,BP (lanes, value bits, padding bits)
    #[arg(short, long, global = true, env = "SWAR_SHAPE")]
    shape: Option<Shape>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a packed integer (0x.., 0b.. or decimal)
    Show {
        data: String,
    },

    /// Pack lane values, lane 0 first
    Pack {
        #[arg(required = true)]
        values: Vec<u64>,
    },

    /// Lane-wise binary operation
    Binary {
        #[arg(value_enum)]
        op: BinaryOp,

        /// Left operand (packed integer)
        lhs: String,

        /// Right operand (packed integer)
        #[arg(required_unless_present = "scalar")]
        rhs: Option<String>,

        /// Use a scalar broadcast to every lane as the right operand
        #[arg(long, conflicts_with = "rhs")]
        scalar: Option<u64>,
    },

    /// Lane-wise unary operation
    Unary {
        #[arg(value_enum)]
        op: UnaryOp,

        /// Operand (packed integer)
        data: String,

        /// Shift amount for shl/shr
        #[arg(short, long, default_value_t = 1)]
        amount: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum UnaryOp {
    Neg,
    Not,
    IsTrue,
    IsFalse,
    Shl,
    Shr,
}

/// Right-hand side of a binary operation.
enum Operand {
    Lanes(Lanes),
    Scalar(u64),
}

/// JSON form of a result.
#[derive(Debug, Serialize)]
struct LanesReport {
    shape: Shape,
    data: String,
    values: Vec<u64>,
    display: String,
}

impl From<&Lanes> for LanesReport {
    fn from(lanes: &Lanes) -> Self {
        Self {
            shape: lanes.shape(),
            data: format!("{:#x}", lanes.data()),
            values: lanes.to_vec(),
            display: lanes.to_string(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    swar_core::init_tracing(cli.json, level);

    let shape = cli
        .shape
        .context("No lane layout given: pass --shape LEN,BV,BP or set SWAR_SHAPE")?;
    info!(%shape, "using lane layout");

    let result = match cli.command {
        Commands::Show { data } => cmd_show(shape, &data),
        Commands::Pack { values } => cmd_pack(shape, values),
        Commands::Binary {
            op,
            lhs,
            rhs,
            scalar,
        } => cmd_binary(shape, op, &lhs, rhs.as_deref(), scalar),
        Commands::Unary { op, data, amount } => cmd_unary(shape, op, &data, amount),
    }?;

    print_lanes(&result, cli.json)
}

/// Parse a packed integer written as `0x..`, `0b..`, `0o..` or decimal.
/// Underscores are ignored.
fn parse_data(raw: &str) -> Result<BigUint> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else {
        (lower.as_str(), 10)
    };
    if digits.is_empty() {
        bail!("Empty integer literal '{raw}'");
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| anyhow!("Invalid base-{radix} integer '{raw}'"))
}

fn load_lanes(shape: Shape, raw: &str) -> Result<Lanes> {
    let data = parse_data(raw)?;
    Lanes::new(data, shape).with_context(|| format!("'{raw}' is not a valid {shape} array"))
}

fn cmd_show(shape: Shape, raw: &str) -> Result<Lanes> {
    load_lanes(shape, raw)
}

fn cmd_pack(shape: Shape, values: Vec<u64>) -> Result<Lanes> {
    Lanes::from_values(values, shape).context("Failed to pack lane values")
}

fn cmd_binary(
    shape: Shape,
    op: BinaryOp,
    lhs: &str,
    rhs: Option<&str>,
    scalar: Option<u64>,
) -> Result<Lanes> {
    let lhs = load_lanes(shape, lhs)?;
    let rhs = match (rhs, scalar) {
        (_, Some(value)) => Operand::Scalar(value),
        (Some(raw), None) => Operand::Lanes(load_lanes(shape, raw)?),
        (None, None) => bail!("Binary operation needs a right operand or --scalar"),
    };
    debug!(?op, "applying binary operation");
    apply_binary(op, &lhs, &rhs)
}

fn apply_binary(op: BinaryOp, lhs: &Lanes, rhs: &Operand) -> Result<Lanes> {
    let out = match rhs {
        Operand::Lanes(rhs) => match op {
            BinaryOp::Add => lhs.try_add(rhs)?,
            BinaryOp::Sub => lhs.try_sub(rhs)?,
            BinaryOp::Mul => lhs.try_mul(rhs)?,
            BinaryOp::And => lhs.try_and(rhs)?,
            BinaryOp::Or => lhs.try_or(rhs)?,
            BinaryOp::Xor => lhs.try_xor(rhs)?,
            BinaryOp::Eq => lhs.simd_eq(rhs)?,
            BinaryOp::Ne => lhs.simd_ne(rhs)?,
            BinaryOp::Lt => lhs.simd_lt(rhs)?,
            BinaryOp::Gt => lhs.simd_gt(rhs)?,
            BinaryOp::Le => lhs.simd_le(rhs)?,
            BinaryOp::Ge => lhs.simd_ge(rhs)?,
        },
        Operand::Scalar(value) => {
            let value = *value;
            match op {
                BinaryOp::Add => lhs.add_scalar(value),
                BinaryOp::Sub => lhs.sub_scalar(value),
                BinaryOp::Mul => lhs.mul_scalar(value),
                BinaryOp::And => lhs.and_scalar(value),
                BinaryOp::Or => lhs.or_scalar(value),
                BinaryOp::Xor => lhs.xor_scalar(value),
                BinaryOp::Eq => lhs.simd_eq_scalar(value),
                BinaryOp::Ne => lhs.simd_ne_scalar(value),
                BinaryOp::Lt => lhs.simd_lt_scalar(value),
                BinaryOp::Gt => lhs.simd_gt_scalar(value),
                BinaryOp::Le => lhs.simd_le_scalar(value),
                BinaryOp::Ge => lhs.simd_ge_scalar(value),
            }
        }
    };
    Ok(out)
}

fn cmd_unary(shape: Shape, op: UnaryOp, raw: &str, amount: u32) -> Result<Lanes> {
    let lanes = load_lanes(shape, raw)?;
    debug!(?op, amount, "applying unary operation");
    Ok(match op {
        UnaryOp::Neg => lanes.negate(),
        UnaryOp::Not => lanes.invert(),
        UnaryOp::IsTrue => lanes.is_true(),
        UnaryOp::IsFalse => lanes.is_false(),
        UnaryOp::Shl => lanes.shift_left(amount),
        UnaryOp::Shr => lanes.shift_right(amount),
    })
}

fn print_lanes(lanes: &Lanes, json: bool) -> Result<()> {
    if json {
        let report = LanesReport::from(lanes);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let values: Vec<String> = lanes.iter().map(|v| v.to_string()).collect();
    println!("{lanes}");
    println!("{lanes:?}");
    println!("values: {}", values.join(" "));
    Ok(())
}
