//! Generation for the `decimal` logical type on bytes and fixed schemas.
//!
//! The wire value is the two's-complement big-endian encoding of the
//! unscaled integer `value * 10^scale`. Two modes:
//!
//! - **range mode** - a `range` directive (or its `±10^(precision-scale)`
//!   defaults) bounds a uniform double, which is then scaled and rounded to
//!   an unscaled big integer;
//! - **precision mode** - with no `range` directive on a bytes schema, the
//!   unscaled integer is assembled from random 15-digit blocks until the
//!   requested precision is reached, trimmed, and given a random sign.

use crate::directives::{
    double_field, require_object, Props, RANGE_PROP, RANGE_PROP_MAX, RANGE_PROP_MIN,
};
use crate::error::{GeneratorError, Result};
use crate::iterators::decimal_parts;
use datagen_core::DecimalType;
use num_bigint::{BigInt, Sign};
use num_traits::Zero;
use rand::Rng;

/// 10^15, the largest power of ten whose random multiples fit a double's
/// significand.
const BLOCK: u64 = 1_000_000_000_000_000;
const BLOCK_DIGITS: u32 = 15;

/// Generate the encoded unscaled value for a decimal node.
///
/// `fixed_size` is the declared size for fixed schemas; the encoding is
/// sign-extended up to it, and an encoding that cannot fit is an error.
pub(crate) fn generate_decimal<R: Rng>(
    rng: &mut R,
    decimal: DecimalType,
    range: Option<&serde_json::Value>,
    fixed_size: Option<usize>,
) -> Result<Vec<u8>> {
    let unscaled = match range {
        Some(range) => ranged_unscaled(rng, decimal, require_object(RANGE_PROP, range)?)?,
        None => random_unscaled(rng, decimal.precision),
    };
    encode(unscaled, decimal, fixed_size)
}

/// Range mode: a uniform double in `[min, max)` scaled to the unscaled
/// integer, rounding half away from zero.
fn ranged_unscaled<R: Rng>(
    rng: &mut R,
    decimal: DecimalType,
    range: &Props,
) -> Result<BigInt> {
    let default = 10f64.powi((decimal.precision - decimal.scale) as i32);
    let min = double_field(RANGE_PROP, RANGE_PROP_MIN, range)?.unwrap_or(-default);
    let max = double_field(RANGE_PROP, RANGE_PROP_MAX, range)?.unwrap_or(default);
    if min >= max {
        return Err(GeneratorError::Bounds {
            directive: RANGE_PROP,
            reason: format!(
                "'{RANGE_PROP_MIN}' field must be strictly less than '{RANGE_PROP_MAX}' field"
            ),
        });
    }
    let value = min + rng.random::<f64>() * (max - min);
    Ok(scale_to_unscaled(value, decimal.scale))
}

/// Precision mode: accumulate 15-digit random blocks, trim to the target
/// precision, pick a random sign.
fn random_unscaled<R: Rng>(rng: &mut R, precision: u32) -> BigInt {
    let mut unscaled = BigInt::zero();
    let mut digits = 0;
    while digits < precision {
        let increment = (rng.random::<f64>() * BLOCK as f64) as u64;
        unscaled = unscaled * BLOCK + increment;
        digits += BLOCK_DIGITS;
    }
    unscaled /= BigInt::from(10u32).pow(digits - precision);
    if rng.random::<bool>() {
        unscaled = -unscaled;
    }
    unscaled
}

/// `round(value * 10^scale)` in exact decimal arithmetic.
fn scale_to_unscaled(value: f64, scale: u32) -> BigInt {
    let (unscaled, value_scale) = decimal_parts(value);
    if value_scale <= scale {
        unscaled * BigInt::from(10u32).pow(scale - value_scale)
    } else {
        let divisor = BigInt::from(10u32).pow(value_scale - scale);
        let quotient = &unscaled / &divisor;
        let remainder = &unscaled % &divisor;
        if remainder.magnitude() * 2u32 >= *divisor.magnitude() {
            // round half away from zero
            if unscaled.sign() == Sign::Minus {
                quotient - 1
            } else {
                quotient + 1
            }
        } else {
            quotient
        }
    }
}

fn encode(unscaled: BigInt, decimal: DecimalType, fixed_size: Option<usize>) -> Result<Vec<u8>> {
    let mut bytes = unscaled.to_signed_bytes_be();
    let Some(size) = fixed_size else {
        return Ok(bytes);
    };
    if bytes.len() > size {
        return Err(GeneratorError::Coercion {
            schema: "fixed",
            reason: format!(
                "decimal with precision {} does not fit in {size} bytes",
                decimal.precision
            ),
        });
    }
    let fill = if unscaled.sign() == Sign::Minus {
        0xff
    } else {
        0x00
    };
    let mut padded = vec![fill; size - bytes.len()];
    padded.append(&mut bytes);
    Ok(padded)
}
