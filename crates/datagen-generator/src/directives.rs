//! Directive extraction from a node's `arg.properties` object.
//!
//! Directive objects arrive as JSON; this module provides the typed field
//! accessors (with integral/float width checks) and the mutual-exclusion
//! check that every strategy runs before using its directive.

use crate::error::{GeneratorError, Result};
use serde_json::{Map, Value as JsonValue};

/// Directive object attached to a schema node.
pub(crate) type Props = Map<String, JsonValue>;

pub const LENGTH_PROP: &str = "length";
pub const LENGTH_PROP_MIN: &str = "min";
pub const LENGTH_PROP_MAX: &str = "max";

pub const REGEX_PROP: &str = "regex";
pub const PREFIX_PROP: &str = "prefix";
pub const SUFFIX_PROP: &str = "suffix";

pub const OPTIONS_PROP: &str = "options";
pub const OPTIONS_PROP_FILE: &str = "file";
pub const OPTIONS_PROP_ENCODING: &str = "encoding";

pub const KEYS_PROP: &str = "keys";

pub const RANGE_PROP: &str = "range";
pub const RANGE_PROP_MIN: &str = "min";
pub const RANGE_PROP_MAX: &str = "max";

pub const ODDS_PROP: &str = "odds";

pub const ITERATION_PROP: &str = "iteration";
pub const ITERATION_PROP_START: &str = "start";
pub const ITERATION_PROP_RESTART: &str = "restart";
pub const ITERATION_PROP_STEP: &str = "step";
pub const ITERATION_PROP_INITIAL: &str = "initial";

/// Fail if any of `excluded` coexists with `included` on one node.
pub(crate) fn enforce_mutual_exclusion(
    props: &Props,
    included: &'static str,
    excluded: &[&'static str],
) -> Result<()> {
    for &prop in excluded {
        if props.contains_key(prop) {
            return Err(GeneratorError::Exclusion {
                included,
                excluded: prop,
            });
        }
    }
    Ok(())
}

/// Fetch a directive value that must be a JSON object.
pub(crate) fn require_object<'a>(
    directive: &'static str,
    value: &'a JsonValue,
) -> Result<&'a Props> {
    value.as_object().ok_or_else(|| GeneratorError::Shape {
        directive,
        reason: "must be an object".to_string(),
    })
}

/// An optional integral field; floating-point numbers are rejected.
pub(crate) fn integral_field(
    directive: &'static str,
    field: &str,
    props: &Props,
) -> Result<Option<i64>> {
    match props.get(field) {
        None => Ok(None),
        Some(JsonValue::Number(number)) if number.as_i64().is_some() => Ok(number.as_i64()),
        Some(other) => Err(GeneratorError::Shape {
            directive,
            reason: format!("'{field}' field must be an integral number, was {other}"),
        }),
    }
}

/// An optional integral field narrowed to i32, for int-typed schemas.
pub(crate) fn int_field(
    directive: &'static str,
    field: &str,
    props: &Props,
) -> Result<Option<i32>> {
    match integral_field(directive, field, props)? {
        None => Ok(None),
        Some(value) => {
            i32::try_from(value)
                .map(Some)
                .map_err(|_| GeneratorError::Shape {
                    directive,
                    reason: format!("'{field}' field must be a valid int for int schemas"),
                })
        }
    }
}

/// An optional numeric field read as f64.
pub(crate) fn double_field(
    directive: &'static str,
    field: &str,
    props: &Props,
) -> Result<Option<f64>> {
    match props.get(field) {
        None => Ok(None),
        Some(JsonValue::Number(number)) => Ok(number.as_f64()),
        Some(other) => Err(GeneratorError::Shape {
            directive,
            reason: format!("'{field}' field must be a number, was {other}"),
        }),
    }
}

/// An optional numeric field narrowed to f32, for float-typed schemas.
pub(crate) fn float_field(
    directive: &'static str,
    field: &str,
    props: &Props,
) -> Result<Option<f32>> {
    match double_field(directive, field, props)? {
        None => Ok(None),
        Some(value) if value.abs() <= f32::MAX as f64 => Ok(Some(value as f32)),
        Some(_) => Err(GeneratorError::Shape {
            directive,
            reason: format!("'{field}' field must be a valid float for float schemas"),
        }),
    }
}

/// An optional string field.
pub(crate) fn string_field<'a>(
    directive: &'static str,
    field: &str,
    props: &'a Props,
) -> Result<Option<&'a str>> {
    match props.get(field) {
        None => Ok(None),
        Some(JsonValue::String(value)) => Ok(Some(value)),
        Some(other) => Err(GeneratorError::Shape {
            directive,
            reason: format!("'{field}' field must be a string, was {other}"),
        }),
    }
}

/// An optional boolean field.
pub(crate) fn boolean_field(
    directive: &'static str,
    field: &str,
    props: &Props,
) -> Result<Option<bool>> {
    match props.get(field) {
        None => Ok(None),
        Some(JsonValue::Bool(value)) => Ok(Some(*value)),
        Some(other) => Err(GeneratorError::Shape {
            directive,
            reason: format!("'{field}' field must be a boolean, was {other}"),
        }),
    }
}
