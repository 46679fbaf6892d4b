//! Iteration strategies: deterministic wrap-around arithmetic progressions.
//!
//! Three iterator kinds, one per family of schema types: integral (int,
//! long, and the integer stream behind string iteration), decimal (float,
//! double) and boolean. Each is an infinite stream with a single `next()`.
//!
//! All arithmetic runs in arbitrary precision: the construction-time
//! fast-forward multiplies the generation offset by the step, which can
//! overflow native width long before the modulus reduces it. Decimal values
//! are handled as unscaled big integers at a common power-of-ten scale, so
//! the progression is exact; narrowing to f32/f64 happens only on output.

use crate::directives::{
    boolean_field, double_field, float_field, int_field, integral_field, ITERATION_PROP,
    ITERATION_PROP_INITIAL, ITERATION_PROP_RESTART, ITERATION_PROP_START, ITERATION_PROP_STEP,
};
use crate::directives::Props;
use crate::error::{GeneratorError, Result};
use datagen_core::Value;
use num_bigint::{BigInt, Sign};
use num_traits::{One, Signed, ToPrimitive, Zero};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntegralWidth {
    Int,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecimalWidth {
    Float,
    Double,
}

/// Cached iteration state for one schema node.
pub(crate) enum IterState {
    Integral(IntegralIterator),
    Decimal(DecimalIterator),
    Boolean(BooleanIterator),
}

impl IterState {
    pub(crate) fn next(&mut self) -> Value {
        match self {
            IterState::Integral(iterator) => iterator.next(),
            IterState::Decimal(iterator) => iterator.next(),
            IterState::Boolean(iterator) => iterator.next(),
        }
    }
}

/// Wrap-around progression over arbitrary-precision integers.
pub(crate) struct IntegralIterator {
    start: BigInt,
    step: BigInt,
    modulus: BigInt,
    direction: BigInt,
    current: BigInt,
    width: IntegralWidth,
}

impl IntegralIterator {
    fn new(
        start: BigInt,
        restart: BigInt,
        step: BigInt,
        initial: BigInt,
        generation: u64,
        width: IntegralWidth,
    ) -> Result<Self> {
        let modulus = (&restart - &start).abs();
        if modulus.is_zero() {
            return Err(equal_fields_error());
        }
        let direction = step.signum();
        let mut current = initial - &start;
        if generation > 0 {
            current = ((BigInt::from(generation) * &step + current).abs() % &modulus) * &direction;
        }
        Ok(IntegralIterator {
            start,
            step,
            modulus,
            direction,
            current,
            width,
        })
    }

    pub(crate) fn next(&mut self) -> Value {
        let result = &self.current + &self.start;
        self.current =
            ((&self.current + &self.step).abs() % &self.modulus) * &self.direction;
        match self.width {
            IntegralWidth::Int => Value::Int(to_i32_wrapping(&result)),
            IntegralWidth::Long => Value::Long(to_i64_wrapping(&result)),
        }
    }
}

/// Wrap-around progression over scaled arbitrary-precision decimals.
///
/// The remainder follows the sign of the dividend (truncated division),
/// matching arbitrary-precision decimal remainder semantics.
pub(crate) struct DecimalIterator {
    start: BigInt,
    step: BigInt,
    modulus: BigInt,
    current: BigInt,
    scale: u32,
    width: DecimalWidth,
}

impl DecimalIterator {
    fn new(
        start: f64,
        restart: f64,
        step: f64,
        initial: f64,
        generation: u64,
        width: DecimalWidth,
    ) -> Result<Self> {
        let parts = [
            decimal_parts(start),
            decimal_parts(restart),
            decimal_parts(step),
            decimal_parts(initial),
        ];
        let scale = parts.iter().map(|(_, scale)| *scale).max().unwrap_or(0);
        let [start, restart, step, initial] = parts.map(|part| rescale(part, scale));

        let modulus = &restart - &start;
        if modulus.is_zero() {
            return Err(equal_fields_error());
        }
        let mut current = initial - &start;
        if generation > 0 {
            current = (BigInt::from(generation) * &step + current) % &modulus;
        }
        Ok(DecimalIterator {
            start,
            step,
            modulus,
            current,
            scale,
            width,
        })
    }

    pub(crate) fn next(&mut self) -> Value {
        let result = &self.current + &self.start;
        self.current = (&self.current + &self.step) % &self.modulus;
        let value = big_to_f64(&result) / 10f64.powi(self.scale as i32);
        match self.width {
            DecimalWidth::Float => Value::Float(value as f32),
            DecimalWidth::Double => Value::Double(value),
        }
    }
}

/// Alternating boolean stream.
pub(crate) struct BooleanIterator {
    current: bool,
}

impl BooleanIterator {
    fn new(start: bool, generation: u64) -> Self {
        // An odd number of previously generated records means the boolean
        // has effectively flipped once, so the start state is inverted.
        BooleanIterator {
            current: (generation % 2 == 1) ^ start,
        }
    }

    pub(crate) fn next(&mut self) -> Value {
        let result = self.current;
        self.current = !self.current;
        Value::Boolean(result)
    }
}

/// Build an integral iterator from an `iteration` directive object.
pub(crate) fn integral_iterator(
    iteration: &Props,
    width: IntegralWidth,
    generation: u64,
) -> Result<IntegralIterator> {
    let field = |name: &str| -> Result<Option<i64>> {
        match width {
            IntegralWidth::Int => {
                Ok(int_field(ITERATION_PROP, name, iteration)?.map(i64::from))
            }
            IntegralWidth::Long => integral_field(ITERATION_PROP, name, iteration),
        }
    };
    let start = field(ITERATION_PROP_START)?.ok_or_else(missing_start_error)?;
    let restart = field(ITERATION_PROP_RESTART)?;
    let step = field(ITERATION_PROP_STEP)?;
    let initial = field(ITERATION_PROP_INITIAL)?.unwrap_or(start);

    let (restart_high, type_min) = match width {
        IntegralWidth::Int => (BigInt::from(i32::MAX), BigInt::from(i32::MIN)),
        IntegralWidth::Long => (BigInt::from(i64::MAX), BigInt::from(i64::MIN)),
    };
    let start = BigInt::from(start);
    let (restart, step) = resolve_progression(
        &start,
        restart.map(BigInt::from),
        step.map(BigInt::from),
        restart_high,
        -type_min,
    )?;
    IntegralIterator::new(start, restart, step, BigInt::from(initial), generation, width)
}

/// Build a decimal iterator from an `iteration` directive object.
pub(crate) fn decimal_iterator(
    iteration: &Props,
    width: DecimalWidth,
    generation: u64,
) -> Result<DecimalIterator> {
    let field = |name: &str| -> Result<Option<f64>> {
        match width {
            DecimalWidth::Float => {
                Ok(float_field(ITERATION_PROP, name, iteration)?.map(f64::from))
            }
            DecimalWidth::Double => double_field(ITERATION_PROP, name, iteration),
        }
    };
    let start = field(ITERATION_PROP_START)?.ok_or_else(missing_start_error)?;
    let restart = field(ITERATION_PROP_RESTART)?;
    let step = field(ITERATION_PROP_STEP)?;
    let initial = field(ITERATION_PROP_INITIAL)?.unwrap_or(start);

    let restart_high = match width {
        DecimalWidth::Float => f32::MAX as f64,
        DecimalWidth::Double => f64::MAX,
    };
    let (restart, step) = resolve_progression_f64(start, restart, step, restart_high)?;
    DecimalIterator::new(start, restart, step, initial, generation, width)
}

/// Build a boolean iterator from an `iteration` directive object.
pub(crate) fn boolean_iterator(iteration: &Props, generation: u64) -> Result<BooleanIterator> {
    let start =
        boolean_field(ITERATION_PROP, ITERATION_PROP_START, iteration)?.ok_or_else(|| {
            GeneratorError::Shape {
                directive: ITERATION_PROP,
                reason: format!(
                    "'{ITERATION_PROP_START}' field for a boolean schema must be a boolean"
                ),
            }
        })?;
    for field in [ITERATION_PROP_RESTART, ITERATION_PROP_STEP] {
        if iteration.contains_key(field) {
            return Err(GeneratorError::Shape {
                directive: ITERATION_PROP,
                reason: format!("cannot contain '{field}' field for a boolean schema"),
            });
        }
    }
    Ok(BooleanIterator::new(start, generation))
}

/// Apply the restart/step default and validation rules.
///
/// `restart_negative_default` is the restart used when only a negative step
/// is given: the negated type minimum for integral types.
fn resolve_progression(
    start: &BigInt,
    restart: Option<BigInt>,
    step: Option<BigInt>,
    restart_high_default: BigInt,
    restart_negative_default: BigInt,
) -> Result<(BigInt, BigInt)> {
    match (restart, step) {
        (None, None) => Ok((restart_high_default, BigInt::one())),
        (None, Some(step)) => match step.sign() {
            Sign::Plus => Ok((restart_high_default, step)),
            Sign::Minus => Ok((restart_negative_default, step)),
            Sign::NoSign => Err(zero_step_error()),
        },
        (Some(restart), None) => {
            if &restart > start {
                Ok((restart, BigInt::one()))
            } else if &restart < start {
                Ok((restart, -BigInt::one()))
            } else {
                Err(equal_fields_error())
            }
        }
        (Some(restart), Some(step)) => {
            if step.is_zero() {
                return Err(zero_step_error());
            }
            if &restart == start {
                return Err(equal_fields_error());
            }
            if &restart > start && step.is_negative() {
                return Err(step_sign_error(true));
            }
            if &restart < start && step.is_positive() {
                return Err(step_sign_error(false));
            }
            Ok((restart, step))
        }
    }
}

/// f64 flavor of [`resolve_progression`]; the negative-step restart default
/// for decimal types is the negated negative extreme, i.e. the positive
/// maximum again.
fn resolve_progression_f64(
    start: f64,
    restart: Option<f64>,
    step: Option<f64>,
    restart_high_default: f64,
) -> Result<(f64, f64)> {
    match (restart, step) {
        (None, None) => Ok((restart_high_default, 1.0)),
        (None, Some(step)) => {
            if step == 0.0 {
                Err(zero_step_error())
            } else {
                Ok((restart_high_default, step))
            }
        }
        (Some(restart), None) => {
            if restart > start {
                Ok((restart, 1.0))
            } else if restart < start {
                Ok((restart, -1.0))
            } else {
                Err(equal_fields_error())
            }
        }
        (Some(restart), Some(step)) => {
            if step == 0.0 {
                return Err(zero_step_error());
            }
            if restart == start {
                return Err(equal_fields_error());
            }
            if restart > start && step < 0.0 {
                return Err(step_sign_error(true));
            }
            if restart < start && step > 0.0 {
                return Err(step_sign_error(false));
            }
            Ok((restart, step))
        }
    }
}

fn missing_start_error() -> GeneratorError {
    GeneratorError::Shape {
        directive: ITERATION_PROP,
        reason: format!("must contain '{ITERATION_PROP_START}' field"),
    }
}

fn zero_step_error() -> GeneratorError {
    GeneratorError::Bounds {
        directive: ITERATION_PROP,
        reason: format!("'{ITERATION_PROP_STEP}' field cannot be zero"),
    }
}

fn equal_fields_error() -> GeneratorError {
    GeneratorError::Bounds {
        directive: ITERATION_PROP,
        reason: format!(
            "'{ITERATION_PROP_START}' and '{ITERATION_PROP_RESTART}' fields cannot be equal"
        ),
    }
}

fn step_sign_error(restart_above_start: bool) -> GeneratorError {
    let (expected, relation) = if restart_above_start {
        ("positive", "greater than")
    } else {
        ("negative", "less than")
    };
    GeneratorError::Bounds {
        directive: ITERATION_PROP,
        reason: format!(
            "'{ITERATION_PROP_STEP}' field must be {expected} when '{ITERATION_PROP_RESTART}' \
             field is {relation} '{ITERATION_PROP_START}' field"
        ),
    }
}

/// Exact decimal decomposition of an f64 via its shortest base-10 rendering:
/// returns the unscaled integer and the number of fractional digits.
pub(crate) fn decimal_parts(value: f64) -> (BigInt, u32) {
    let text = format!("{value}");
    match text.split_once('.') {
        Some((int_part, frac_part)) => {
            let digits = format!("{int_part}{frac_part}");
            (
                digits.parse().unwrap_or_default(),
                frac_part.len() as u32,
            )
        }
        None => (text.parse().unwrap_or_default(), 0),
    }
}

fn rescale((unscaled, scale): (BigInt, u32), target: u32) -> BigInt {
    unscaled * BigInt::from(10u32).pow(target - scale)
}

fn big_to_f64(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or_else(|| {
        if value.sign() == Sign::Minus {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }
    })
}

fn low_bits(value: &BigInt, bits: u64) -> u64 {
    // num-bigint bit operations use two's-complement semantics for negative
    // values, which is exactly the wrap-around narrowing we need.
    let mask = (BigInt::one() << bits) - 1;
    (value & &mask).to_u64().unwrap_or(0)
}

pub(crate) fn to_i64_wrapping(value: &BigInt) -> i64 {
    low_bits(value, 64) as i64
}

pub(crate) fn to_i32_wrapping(value: &BigInt) -> i32 {
    low_bits(value, 32) as u32 as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn iteration(value: serde_json::Value) -> Props {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn long_iteration_wraps_below_restart() {
        let props = iteration(json!({"start": -50, "restart": 0, "step": 47}));
        let mut iterator = integral_iterator(&props, IntegralWidth::Long, 0).unwrap();
        assert_eq!(iterator.next(), Value::Long(-50));
        assert_eq!(iterator.next(), Value::Long(-3));
        assert_eq!(iterator.next(), Value::Long(-6));
    }

    #[test]
    fn restart_only_defaults_to_unit_step() {
        let props = iteration(json!({"start": 1, "restart": 3}));
        let mut iterator = integral_iterator(&props, IntegralWidth::Int, 0).unwrap();
        let values: Vec<_> = (0..4).map(|_| iterator.next()).collect();
        assert_eq!(
            values,
            vec![Value::Int(1), Value::Int(2), Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn descending_restart_defaults_to_negative_step() {
        let props = iteration(json!({"start": 2, "restart": 0}));
        let mut iterator = integral_iterator(&props, IntegralWidth::Int, 0).unwrap();
        let values: Vec<_> = (0..3).map(|_| iterator.next()).collect();
        assert_eq!(values, vec![Value::Int(2), Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn fast_forward_matches_stepping() {
        let props = iteration(json!({"start": -50, "restart": 0, "step": 47, "initial": -50}));
        for offset in 0..200u64 {
            let mut reference = integral_iterator(&props, IntegralWidth::Long, 0).unwrap();
            for _ in 0..offset {
                reference.next();
            }
            let mut skipped = integral_iterator(&props, IntegralWidth::Long, offset).unwrap();
            assert_eq!(
                skipped.next(),
                reference.next(),
                "mismatch at offset {offset}"
            );
        }
    }

    #[test]
    fn fast_forward_offset_exceeding_native_width() {
        // step * offset overflows i64; the reduction must still be exact.
        let props = iteration(json!({"start": 0, "restart": 7, "step": 3}));
        let mut iterator =
            integral_iterator(&props, IntegralWidth::Long, u64::MAX).unwrap();
        // (u64::MAX * 3) mod 7 == 3: first value is 3 + 0.
        assert_eq!(iterator.next(), Value::Long(3));
    }

    #[test]
    fn initial_field_offsets_first_value() {
        let props = iteration(json!({"start": 0, "restart": 50, "step": 10, "initial": 40}));
        let mut iterator = integral_iterator(&props, IntegralWidth::Int, 0).unwrap();
        assert_eq!(iterator.next(), Value::Int(40));
        assert_eq!(iterator.next(), Value::Int(0));
    }

    #[test]
    fn decimal_iteration_is_exact() {
        let props = iteration(json!({"start": 0.0, "restart": 5.0, "step": 1.5}));
        let mut iterator = decimal_iterator(&props, DecimalWidth::Double, 0).unwrap();
        let values: Vec<_> = (0..5).map(|_| iterator.next()).collect();
        assert_eq!(
            values,
            vec![
                Value::Double(0.0),
                Value::Double(1.5),
                Value::Double(3.0),
                Value::Double(4.5),
                Value::Double(1.0),
            ]
        );
    }

    #[test]
    fn decimal_fast_forward_matches_stepping() {
        let props = iteration(json!({"start": -2.5, "restart": 2.5, "step": 0.75}));
        for offset in 0..100u64 {
            let mut reference = decimal_iterator(&props, DecimalWidth::Double, 0).unwrap();
            for _ in 0..offset {
                reference.next();
            }
            let mut skipped = decimal_iterator(&props, DecimalWidth::Double, offset).unwrap();
            assert_eq!(
                skipped.next(),
                reference.next(),
                "mismatch at offset {offset}"
            );
        }
    }

    #[test]
    fn boolean_iterator_alternates_and_honors_offset() {
        let props = iteration(json!({"start": true}));
        let mut iterator = boolean_iterator(&props, 0).unwrap();
        assert_eq!(iterator.next(), Value::Boolean(true));
        assert_eq!(iterator.next(), Value::Boolean(false));
        assert_eq!(iterator.next(), Value::Boolean(true));

        for generation in 0..6u64 {
            let mut iterator = boolean_iterator(&props, generation).unwrap();
            let expected = generation % 2 == 0;
            assert_eq!(iterator.next(), Value::Boolean(expected));
        }
    }

    #[test]
    fn boolean_iterator_rejects_restart_and_step() {
        assert!(boolean_iterator(&iteration(json!({"start": true, "restart": false})), 0).is_err());
        assert!(boolean_iterator(&iteration(json!({"start": true, "step": 1})), 0).is_err());
        assert!(boolean_iterator(&iteration(json!({"start": 1})), 0).is_err());
    }

    #[test]
    fn validation_rejects_degenerate_directives() {
        let zero_step = iteration(json!({"start": 0, "restart": 5, "step": 0}));
        assert!(integral_iterator(&zero_step, IntegralWidth::Long, 0).is_err());

        let equal = iteration(json!({"start": 5, "restart": 5}));
        assert!(integral_iterator(&equal, IntegralWidth::Long, 0).is_err());

        let wrong_sign = iteration(json!({"start": 0, "restart": 5, "step": -1}));
        assert!(integral_iterator(&wrong_sign, IntegralWidth::Long, 0).is_err());

        let wrong_sign = iteration(json!({"start": 5, "restart": 0, "step": 1}));
        assert!(integral_iterator(&wrong_sign, IntegralWidth::Long, 0).is_err());

        let missing_start = iteration(json!({"restart": 5}));
        assert!(integral_iterator(&missing_start, IntegralWidth::Long, 0).is_err());
    }

    #[test]
    fn int_width_rejects_long_fields() {
        let props = iteration(json!({"start": 4294967296i64}));
        assert!(integral_iterator(&props, IntegralWidth::Int, 0).is_err());
        assert!(integral_iterator(&props, IntegralWidth::Long, 0).is_ok());
    }

    #[test]
    fn wrapping_narrowing_matches_twos_complement() {
        assert_eq!(to_i32_wrapping(&BigInt::from(i64::from(i32::MAX) + 1)), i32::MIN);
        assert_eq!(to_i32_wrapping(&BigInt::from(-1)), -1);
        assert_eq!(
            to_i64_wrapping(&(BigInt::from(i64::MAX) + 1)),
            i64::MIN
        );
    }

    #[test]
    fn decimal_parts_are_exact() {
        assert_eq!(decimal_parts(-0.5), (BigInt::from(-5), 1));
        assert_eq!(decimal_parts(47.0), (BigInt::from(47), 0));
        assert_eq!(decimal_parts(1.25), (BigInt::from(125), 2));
    }
}
