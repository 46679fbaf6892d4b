//! The options strategy: a finite set of pre-supplied values.
//!
//! Inline option entries arrive as JSON and are coerced into the node
//! schema's runtime shape (string to bytes, integer to long, double to
//! float, object to record, and so on), then validated. Options files are
//! decoded by [`crate::codec`] and flow through the same coercion.

use crate::codec;
use crate::directives::{
    enforce_mutual_exclusion, string_field, Props, ITERATION_PROP, LENGTH_PROP, OPTIONS_PROP,
    OPTIONS_PROP_ENCODING, OPTIONS_PROP_FILE, RANGE_PROP, REGEX_PROP,
};
use crate::error::{GeneratorError, Result};
use datagen_core::{SchemaKind, SchemaNode, Value};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Resolve the options list for a node carrying an `options` directive.
pub(crate) fn resolve_options(schema: &SchemaNode, props: &Props) -> Result<Vec<Value>> {
    enforce_mutual_exclusion(
        props,
        OPTIONS_PROP,
        &[LENGTH_PROP, REGEX_PROP, ITERATION_PROP, RANGE_PROP],
    )?;

    match props.get(OPTIONS_PROP) {
        Some(JsonValue::Array(entries)) => {
            if entries.is_empty() {
                return Err(GeneratorError::Shape {
                    directive: OPTIONS_PROP,
                    reason: "cannot be empty".to_string(),
                });
            }
            entries
                .iter()
                .map(|entry| coerce_option(schema, entry))
                .collect()
        }
        Some(JsonValue::Object(fields)) => {
            let file = string_field(OPTIONS_PROP, OPTIONS_PROP_FILE, fields)?.ok_or_else(|| {
                GeneratorError::Shape {
                    directive: OPTIONS_PROP,
                    reason: format!(
                        "must contain '{OPTIONS_PROP_FILE}' field when given as object"
                    ),
                }
            })?;
            let encoding = string_field(OPTIONS_PROP, OPTIONS_PROP_ENCODING, fields)?
                .ok_or_else(|| GeneratorError::Shape {
                    directive: OPTIONS_PROP,
                    reason: format!(
                        "must contain '{OPTIONS_PROP_ENCODING}' field when given as object"
                    ),
                })?;
            let options = match encoding {
                "json" => codec::read_json_options(file)?
                    .iter()
                    .map(|entry| coerce_option(schema, entry))
                    .collect::<Result<Vec<_>>>()?,
                "binary" => codec::read_binary_options(file, schema)?,
                _ => {
                    return Err(GeneratorError::Shape {
                        directive: OPTIONS_PROP,
                        reason: format!(
                            "'{OPTIONS_PROP_ENCODING}' field only supports two formats: \
                             'binary' and 'json'"
                        ),
                    })
                }
            };
            if options.is_empty() {
                return Err(GeneratorError::Resource {
                    path: file.to_string(),
                    reason: "file contains no options".to_string(),
                });
            }
            Ok(options)
        }
        Some(other) => Err(GeneratorError::Shape {
            directive: OPTIONS_PROP,
            reason: format!("must be an array or an object, was {other}"),
        }),
        None => unreachable!("caller checked the options prop is present"),
    }
}

/// Coerce one option entry into the runtime shape of `schema` and validate
/// it.
pub(crate) fn coerce_option(schema: &SchemaNode, option: &JsonValue) -> Result<Value> {
    match schema.kind() {
        SchemaKind::Null => match option {
            JsonValue::Null => Ok(Value::Null),
            _ => Err(mismatch(schema, option)),
        },
        SchemaKind::Boolean => option
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| mismatch(schema, option)),
        SchemaKind::Int => option
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .map(Value::Int)
            .ok_or_else(|| mismatch(schema, option)),
        SchemaKind::Long => option
            .as_i64()
            .map(Value::Long)
            .ok_or_else(|| mismatch(schema, option)),
        SchemaKind::Float => {
            // a JSON double narrows to float; anything else is invalid
            if option.is_f64() {
                Ok(Value::Float(option.as_f64().unwrap_or_default() as f32))
            } else {
                Err(mismatch(schema, option))
            }
        }
        SchemaKind::Double => {
            if option.is_f64() {
                Ok(Value::Double(option.as_f64().unwrap_or_default()))
            } else {
                Err(mismatch(schema, option))
            }
        }
        SchemaKind::Bytes { .. } => option
            .as_str()
            .map(|text| Value::Bytes(text.as_bytes().to_vec()))
            .ok_or_else(|| mismatch(schema, option)),
        SchemaKind::String => option
            .as_str()
            .map(|text| Value::String(text.to_string()))
            .ok_or_else(|| mismatch(schema, option)),
        SchemaKind::Fixed { size, .. } => {
            let bytes = option
                .as_str()
                .map(|text| text.as_bytes().to_vec())
                .ok_or_else(|| mismatch(schema, option))?;
            if bytes.len() != *size {
                return Err(GeneratorError::Coercion {
                    schema: schema.type_name(),
                    reason: format!("value '{option}' is not {size} bytes long"),
                });
            }
            Ok(Value::Fixed(bytes))
        }
        SchemaKind::Enum { symbols, .. } => {
            let symbol = option.as_str().ok_or_else(|| mismatch(schema, option))?;
            symbols
                .iter()
                .position(|candidate| candidate == symbol)
                .map(|ordinal| Value::Enum {
                    ordinal,
                    symbol: symbol.to_string(),
                })
                .ok_or_else(|| GeneratorError::Coercion {
                    schema: schema.type_name(),
                    reason: format!("'{symbol}' is not one of the declared symbols"),
                })
        }
        SchemaKind::Array { items } => option
            .as_array()
            .ok_or_else(|| mismatch(schema, option))?
            .iter()
            .map(|element| coerce_option(items, element))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        SchemaKind::Map { values } => option
            .as_object()
            .ok_or_else(|| mismatch(schema, option))?
            .iter()
            .map(|(key, value)| Ok((key.clone(), coerce_option(values, value)?)))
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Value::Map),
        SchemaKind::Record { name, fields } => {
            let object = option.as_object().ok_or_else(|| mismatch(schema, option))?;
            let fields = fields
                .iter()
                .map(|field| {
                    let value = object.get(&field.name).ok_or_else(|| {
                        GeneratorError::Coercion {
                            schema: schema.type_name(),
                            reason: format!("missing value for field '{}'", field.name),
                        }
                    })?;
                    Ok((field.name.clone(), coerce_option(&field.schema, value)?))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Record {
                name: name.clone(),
                fields,
            })
        }
        SchemaKind::Union { branches } => branches
            .iter()
            .find_map(|branch| coerce_option(branch, option).ok())
            .ok_or_else(|| GeneratorError::Coercion {
                schema: schema.type_name(),
                reason: format!("value '{option}' matches none of the union branches"),
            }),
    }
}

fn mismatch(schema: &SchemaNode, option: &JsonValue) -> GeneratorError {
    GeneratorError::Coercion {
        schema: schema.type_name(),
        reason: format!("cannot use value '{option}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(text: &str) -> SchemaNode {
        SchemaNode::parse_str(text).unwrap()
    }

    fn props(value: serde_json::Value) -> Props {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn integers_widen_to_long() {
        let node = schema(r#""long""#);
        assert_eq!(coerce_option(&node, &json!(7)).unwrap(), Value::Long(7));
    }

    #[test]
    fn doubles_narrow_to_float() {
        let node = schema(r#""float""#);
        assert_eq!(
            coerce_option(&node, &json!(1.5)).unwrap(),
            Value::Float(1.5)
        );
        assert!(coerce_option(&node, &json!(1)).is_err());
    }

    #[test]
    fn strings_become_bytes_and_fixed() {
        let node = schema(r#""bytes""#);
        assert_eq!(
            coerce_option(&node, &json!("ab")).unwrap(),
            Value::Bytes(vec![b'a', b'b'])
        );

        let node = schema(r#"{"type": "fixed", "name": "Two", "size": 2}"#);
        assert_eq!(
            coerce_option(&node, &json!("ab")).unwrap(),
            Value::Fixed(vec![b'a', b'b'])
        );
        assert!(coerce_option(&node, &json!("abc")).is_err());
    }

    #[test]
    fn enum_symbols_are_validated() {
        let node = schema(r#"{"type": "enum", "name": "Color", "symbols": ["RED", "BLUE"]}"#);
        assert_eq!(
            coerce_option(&node, &json!("BLUE")).unwrap(),
            Value::Enum {
                ordinal: 1,
                symbol: "BLUE".to_string()
            }
        );
        assert!(coerce_option(&node, &json!("GREEN")).is_err());
    }

    #[test]
    fn records_coerce_by_field_name() {
        let node = schema(
            r#"{"type": "record", "name": "Point",
                "fields": [{"name": "x", "type": "int"}, {"name": "y", "type": "int"}]}"#,
        );
        let value = coerce_option(&node, &json!({"x": 1, "y": 2})).unwrap();
        assert_eq!(value.field("x"), Some(&Value::Int(1)));
        assert_eq!(value.field("y"), Some(&Value::Int(2)));

        assert!(coerce_option(&node, &json!({"x": 1})).is_err());
    }

    #[test]
    fn unions_try_branches_in_order() {
        let node = schema(r#"["null", "string"]"#);
        assert_eq!(coerce_option(&node, &json!(null)).unwrap(), Value::Null);
        assert_eq!(
            coerce_option(&node, &json!("hi")).unwrap(),
            Value::String("hi".to_string())
        );
        assert!(coerce_option(&node, &json!(5)).is_err());
    }

    #[test]
    fn options_exclude_other_strategies() {
        let node = schema(r#""string""#);
        let props = props(json!({"options": ["a"], "regex": "[a-z]"}));
        assert!(matches!(
            resolve_options(&node, &props),
            Err(GeneratorError::Exclusion { .. })
        ));
    }

    #[test]
    fn empty_inline_options_are_rejected() {
        let node = schema(r#""string""#);
        let props = props(json!({"options": []}));
        assert!(resolve_options(&node, &props).is_err());
    }

    #[test]
    fn unknown_encodings_are_rejected() {
        let node = schema(r#""string""#);
        let props = props(json!({"options": {"file": "opts.avro", "encoding": "xml"}}));
        assert!(matches!(
            resolve_options(&node, &props),
            Err(GeneratorError::Shape { .. })
        ));
    }
}
