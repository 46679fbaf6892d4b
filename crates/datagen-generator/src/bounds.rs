//! Length bounds for generated strings, byte buffers, arrays and maps.

use crate::directives::{LENGTH_PROP, LENGTH_PROP_MAX, LENGTH_PROP_MIN};
use crate::error::{GeneratorError, Result};
use rand::Rng;
use serde_json::Value as JsonValue;

/// An inclusive-lower, exclusive-upper length interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    min: usize,
    max: usize,
}

impl LengthBounds {
    pub const DEFAULT_MIN: usize = 8;
    pub const DEFAULT_MAX: usize = 16;

    /// Bounds `[min, max)`; callers guarantee `min < max`.
    pub fn new(min: usize, max: usize) -> Self {
        debug_assert!(min < max);
        LengthBounds { min, max }
    }

    /// Bounds that always sample exactly `length`.
    pub fn exact(length: usize) -> Self {
        LengthBounds {
            min: length,
            max: length + 1,
        }
    }

    /// Resolve a `length` directive value.
    ///
    /// Absent means the default `[8, 16)`; an integer L means exactly L; an
    /// object carries `min` and/or `max` with at least one present.
    pub fn from_directive(length: Option<&JsonValue>) -> Result<Self> {
        let Some(length) = length else {
            return Ok(LengthBounds::default());
        };
        match length {
            JsonValue::Number(number) => {
                let exact =
                    number
                        .as_i64()
                        .filter(|&value| value >= 0)
                        .ok_or_else(|| GeneratorError::Bounds {
                            directive: LENGTH_PROP,
                            reason: "cannot be negative when given as integral number".to_string(),
                        })?;
                Ok(LengthBounds::exact(exact as usize))
            }
            JsonValue::Object(fields) => {
                let min = crate::directives::int_field(LENGTH_PROP, LENGTH_PROP_MIN, fields)?;
                let max = crate::directives::int_field(LENGTH_PROP, LENGTH_PROP_MAX, fields)?;
                if min.is_none() && max.is_none() {
                    return Err(GeneratorError::Shape {
                        directive: LENGTH_PROP,
                        reason: format!(
                            "must contain at least one of '{LENGTH_PROP_MIN}' or \
                             '{LENGTH_PROP_MAX}' fields when given as object"
                        ),
                    });
                }
                let min = min.unwrap_or(0);
                let max = max.unwrap_or(i32::MAX);
                if min < 0 {
                    return Err(GeneratorError::Bounds {
                        directive: LENGTH_PROP,
                        reason: format!("'{LENGTH_PROP_MIN}' field cannot be negative"),
                    });
                }
                if max <= min {
                    return Err(GeneratorError::Bounds {
                        directive: LENGTH_PROP,
                        reason: format!(
                            "'{LENGTH_PROP_MAX}' field must be strictly greater than \
                             '{LENGTH_PROP_MIN}' field"
                        ),
                    });
                }
                Ok(LengthBounds::new(min as usize, max as usize))
            }
            other => Err(GeneratorError::Shape {
                directive: LENGTH_PROP,
                reason: format!("must either be an integral number or an object, was {other}"),
            }),
        }
    }

    /// Sample a length uniformly from `[min, max)`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        self.min + rng.random_range(0..self.max - self.min)
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for LengthBounds {
    fn default() -> Self {
        LengthBounds {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn default_bounds() {
        let bounds = LengthBounds::from_directive(None).unwrap();
        assert_eq!(bounds, LengthBounds::new(8, 16));
    }

    #[test]
    fn exact_length_always_samples_itself() {
        let mut rng = StdRng::seed_from_u64(42);
        let bounds = LengthBounds::from_directive(Some(&json!(5))).unwrap();
        for _ in 0..50 {
            assert_eq!(bounds.sample(&mut rng), 5);
        }
    }

    #[test]
    fn samples_stay_in_window() {
        let mut rng = StdRng::seed_from_u64(42);
        let bounds = LengthBounds::from_directive(Some(&json!({"min": 3, "max": 9}))).unwrap();
        for _ in 0..200 {
            let length = bounds.sample(&mut rng);
            assert!((3..9).contains(&length), "length {length} out of [3, 9)");
        }
    }

    #[test]
    fn single_sided_bounds_get_defaults() {
        let bounds = LengthBounds::from_directive(Some(&json!({"max": 4}))).unwrap();
        assert_eq!(bounds.min(), 0);
        assert_eq!(bounds.max(), 4);

        let bounds = LengthBounds::from_directive(Some(&json!({"min": 4}))).unwrap();
        assert_eq!(bounds.min(), 4);
        assert_eq!(bounds.max(), i32::MAX as usize);
    }

    #[test]
    fn rejects_bad_directives() {
        assert!(LengthBounds::from_directive(Some(&json!(-1))).is_err());
        assert!(LengthBounds::from_directive(Some(&json!({}))).is_err());
        assert!(LengthBounds::from_directive(Some(&json!({"min": 5, "max": 5}))).is_err());
        assert!(LengthBounds::from_directive(Some(&json!("8"))).is_err());
    }
}
