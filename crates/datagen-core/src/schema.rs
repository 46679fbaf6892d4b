//! Avro schema model for the generator.
//!
//! Schemas are parsed from their JSON representation into a tree of
//! [`SchemaNode`]s. Every node is assigned a [`NodeId`] when it is created;
//! generator caches key off this id. Two textually identical nodes written
//! in different places therefore keep independent generation state, while a
//! named type referenced by name shares the id of its definition.

use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

/// Reserved user-property key carrying generator directives.
pub const ARG_PROPERTIES: &str = "arg.properties";

/// Name of the decimal logical type in schema JSON.
pub const DECIMAL_LOGICAL_TYPE: &str = "decimal";

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading a schema file
    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// The schema document is not valid JSON
    #[error("failed to parse schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The schema JSON does not describe a valid Avro schema
    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// Identity token for a schema node.
///
/// Ids are allocated from a process-wide counter, so nodes from different
/// trees never collide. Cloning a node keeps its id; this is what makes a
/// named-type reference share generation state with its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(0);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Decimal logical type attached to a bytes or fixed schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalType {
    /// Total number of significant digits
    pub precision: u32,
    /// Digits after the decimal point
    pub scale: u32,
}

/// A single field of a record schema.
#[derive(Debug, Clone)]
pub struct RecordField {
    /// Field name
    pub name: String,
    /// Field value schema
    pub schema: SchemaNode,
}

/// The type variant of a schema node.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes {
        decimal: Option<DecimalType>,
    },
    String,
    Fixed {
        name: String,
        size: usize,
        decimal: Option<DecimalType>,
    },
    Enum {
        name: String,
        symbols: Vec<String>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    Map {
        values: Box<SchemaNode>,
    },
    Record {
        name: String,
        fields: Vec<RecordField>,
    },
    Union {
        branches: Vec<SchemaNode>,
    },
}

/// A node of the parsed schema tree.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    id: NodeId,
    kind: SchemaKind,
    properties: Option<Map<String, JsonValue>>,
}

impl SchemaNode {
    /// Build a schema node directly from a kind, with no user properties.
    ///
    /// Used for implicit schemas, e.g. the string schema that map-key
    /// directives are resolved against.
    pub fn new(kind: SchemaKind) -> Self {
        SchemaNode {
            id: NodeId::next(),
            kind,
            properties: None,
        }
    }

    /// Parse a schema from its JSON text.
    pub fn parse_str(input: &str) -> Result<Self, SchemaError> {
        let json: JsonValue = serde_json::from_str(input)?;
        Self::parse_value(&json)
    }

    /// Read and parse a schema file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Parse a schema from an already-decoded JSON document.
    pub fn parse_value(json: &JsonValue) -> Result<Self, SchemaError> {
        Parser::default().parse(json)
    }

    /// The identity token of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The type variant of this node.
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// The `arg.properties` directive object attached to this node, if any.
    pub fn directive_properties(&self) -> Option<&Map<String, JsonValue>> {
        self.properties.as_ref()
    }

    /// The decimal logical type of this node, for bytes and fixed schemas.
    pub fn decimal(&self) -> Option<DecimalType> {
        match &self.kind {
            SchemaKind::Bytes { decimal } | SchemaKind::Fixed { decimal, .. } => *decimal,
            _ => None,
        }
    }

    /// Avro name of the type variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes { .. } => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Fixed { .. } => "fixed",
            SchemaKind::Enum { .. } => "enum",
            SchemaKind::Array { .. } => "array",
            SchemaKind::Map { .. } => "map",
            SchemaKind::Record { .. } => "record",
            SchemaKind::Union { .. } => "union",
        }
    }
}

/// Recursive-descent parser over schema JSON.
///
/// Named types (record, enum, fixed) are registered as they are defined so
/// later references by name resolve to the same node (same [`NodeId`]).
#[derive(Default)]
struct Parser {
    named: HashMap<String, SchemaNode>,
}

impl Parser {
    fn parse(&mut self, json: &JsonValue) -> Result<SchemaNode, SchemaError> {
        match json {
            JsonValue::String(name) => self.parse_name(name),
            JsonValue::Array(branches) => self.parse_union(branches, None),
            JsonValue::Object(object) => self.parse_object(object),
            other => Err(SchemaError::Invalid(format!(
                "schema must be a string, array or object, was {other}"
            ))),
        }
    }

    fn parse_name(&mut self, name: &str) -> Result<SchemaNode, SchemaError> {
        let kind = match name {
            "null" => SchemaKind::Null,
            "boolean" => SchemaKind::Boolean,
            "int" => SchemaKind::Int,
            "long" => SchemaKind::Long,
            "float" => SchemaKind::Float,
            "double" => SchemaKind::Double,
            "bytes" => SchemaKind::Bytes { decimal: None },
            "string" => SchemaKind::String,
            other => {
                // Reference to a previously defined named type. The clone
                // keeps the definition's id, so both positions share
                // generation state, matching how a parsed schema re-uses
                // one object for every reference.
                return self
                    .named
                    .get(other)
                    .cloned()
                    .ok_or_else(|| SchemaError::Invalid(format!("undefined type name '{other}'")));
            }
        };
        Ok(SchemaNode {
            id: NodeId::next(),
            kind,
            properties: None,
        })
    }

    fn parse_union(
        &mut self,
        branches: &[JsonValue],
        properties: Option<Map<String, JsonValue>>,
    ) -> Result<SchemaNode, SchemaError> {
        if branches.is_empty() {
            return Err(SchemaError::Invalid(
                "union must have at least one branch".to_string(),
            ));
        }
        let branches = branches
            .iter()
            .map(|branch| self.parse(branch))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SchemaNode {
            id: NodeId::next(),
            kind: SchemaKind::Union { branches },
            properties,
        })
    }

    fn parse_object(&mut self, object: &Map<String, JsonValue>) -> Result<SchemaNode, SchemaError> {
        let properties = directive_object(object)?;

        let type_field = object
            .get("type")
            .ok_or_else(|| SchemaError::Invalid("schema object is missing 'type'".to_string()))?;

        // {"type": [...]} and {"type": {...}} wrap another schema; only the
        // string form introduces a type of its own.
        let type_name = match type_field {
            JsonValue::String(name) => name.as_str(),
            JsonValue::Array(branches) => return self.parse_union(branches, properties),
            JsonValue::Object(_) => {
                let mut inner = self.parse(type_field)?;
                if inner.properties.is_none() {
                    inner.properties = properties;
                }
                return Ok(inner);
            }
            other => {
                return Err(SchemaError::Invalid(format!(
                    "'type' must be a string, array or object, was {other}"
                )))
            }
        };

        let kind = match type_name {
            "null" => SchemaKind::Null,
            "boolean" => SchemaKind::Boolean,
            "int" => SchemaKind::Int,
            "long" => SchemaKind::Long,
            "float" => SchemaKind::Float,
            "double" => SchemaKind::Double,
            "string" => SchemaKind::String,
            "bytes" => SchemaKind::Bytes {
                decimal: decimal_logical_type(object)?,
            },
            "fixed" => {
                let name = required_name(object, "fixed")?;
                let size = object
                    .get("size")
                    .and_then(JsonValue::as_u64)
                    .ok_or_else(|| {
                        SchemaError::Invalid(format!(
                            "fixed schema '{name}' must have a non-negative integer 'size'"
                        ))
                    })? as usize;
                SchemaKind::Fixed {
                    name,
                    size,
                    decimal: decimal_logical_type(object)?,
                }
            }
            "enum" => {
                let name = required_name(object, "enum")?;
                let symbols = object
                    .get("symbols")
                    .and_then(JsonValue::as_array)
                    .ok_or_else(|| {
                        SchemaError::Invalid(format!("enum schema '{name}' must have 'symbols'"))
                    })?
                    .iter()
                    .map(|symbol| {
                        symbol.as_str().map(str::to_string).ok_or_else(|| {
                            SchemaError::Invalid(format!(
                                "enum schema '{name}' symbols must be strings"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if symbols.is_empty() {
                    return Err(SchemaError::Invalid(format!(
                        "enum schema '{name}' must have at least one symbol"
                    )));
                }
                SchemaKind::Enum { name, symbols }
            }
            "array" => {
                let items = object.get("items").ok_or_else(|| {
                    SchemaError::Invalid("array schema must have 'items'".to_string())
                })?;
                SchemaKind::Array {
                    items: Box::new(self.parse(items)?),
                }
            }
            "map" => {
                let values = object.get("values").ok_or_else(|| {
                    SchemaError::Invalid("map schema must have 'values'".to_string())
                })?;
                SchemaKind::Map {
                    values: Box::new(self.parse(values)?),
                }
            }
            "record" => {
                let name = required_name(object, "record")?;
                let fields = object
                    .get("fields")
                    .and_then(JsonValue::as_array)
                    .ok_or_else(|| {
                        SchemaError::Invalid(format!("record schema '{name}' must have 'fields'"))
                    })?;
                let fields = fields
                    .iter()
                    .map(|field| self.parse_field(&name, field))
                    .collect::<Result<Vec<_>, _>>()?;
                SchemaKind::Record { name, fields }
            }
            other => return self.parse_name(other).map(|mut node| {
                if node.properties.is_none() {
                    node.properties = properties;
                }
                node
            }),
        };

        let node = SchemaNode {
            id: NodeId::next(),
            kind,
            properties,
        };
        self.register_named(&node);
        Ok(node)
    }

    fn parse_field(
        &mut self,
        record: &str,
        field: &JsonValue,
    ) -> Result<RecordField, SchemaError> {
        let object = field.as_object().ok_or_else(|| {
            SchemaError::Invalid(format!("fields of record '{record}' must be objects"))
        })?;
        let name = object
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                SchemaError::Invalid(format!("fields of record '{record}' must have a 'name'"))
            })?
            .to_string();
        let schema = object.get("type").ok_or_else(|| {
            SchemaError::Invalid(format!("field '{name}' of record '{record}' has no 'type'"))
        })?;
        Ok(RecordField {
            name,
            schema: self.parse(schema)?,
        })
    }

    fn register_named(&mut self, node: &SchemaNode) {
        let name = match &node.kind {
            SchemaKind::Record { name, .. }
            | SchemaKind::Enum { name, .. }
            | SchemaKind::Fixed { name, .. } => name.clone(),
            _ => return,
        };
        self.named.insert(name, node.clone());
    }
}

fn required_name(object: &Map<String, JsonValue>, kind: &str) -> Result<String, SchemaError> {
    let name = object
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| SchemaError::Invalid(format!("{kind} schema must have a 'name'")))?;
    match object.get("namespace").and_then(JsonValue::as_str) {
        Some(namespace) if !name.contains('.') => Ok(format!("{namespace}.{name}")),
        _ => Ok(name.to_string()),
    }
}

fn directive_object(
    object: &Map<String, JsonValue>,
) -> Result<Option<Map<String, JsonValue>>, SchemaError> {
    match object.get(ARG_PROPERTIES) {
        None => Ok(None),
        Some(JsonValue::Object(properties)) => Ok(Some(properties.clone())),
        Some(other) => Err(SchemaError::Invalid(format!(
            "{ARG_PROPERTIES} property must be given as object, was {other}"
        ))),
    }
}

fn decimal_logical_type(
    object: &Map<String, JsonValue>,
) -> Result<Option<DecimalType>, SchemaError> {
    match object.get("logicalType").and_then(JsonValue::as_str) {
        Some(DECIMAL_LOGICAL_TYPE) => {}
        _ => return Ok(None),
    }
    let precision = object
        .get("precision")
        .and_then(JsonValue::as_u64)
        .ok_or_else(|| {
            SchemaError::Invalid("decimal logical type must have an integer 'precision'".to_string())
        })?;
    if precision < 1 {
        return Err(SchemaError::Invalid(
            "decimal precision must be at least 1".to_string(),
        ));
    }
    let scale = object.get("scale").and_then(JsonValue::as_u64).unwrap_or(0);
    if scale > precision {
        return Err(SchemaError::Invalid(format!(
            "decimal scale {scale} must not exceed precision {precision}"
        )));
    }
    Ok(Some(DecimalType {
        precision: precision as u32,
        scale: scale as u32,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_SCHEMA: &str = r#"
    {
      "type": "record",
      "name": "User",
      "fields": [
        {"name": "id", "type": {"type": "long", "arg.properties": {"iteration": {"start": 0}}}},
        {"name": "name", "type": "string"},
        {"name": "balance", "type": {"type": "bytes", "logicalType": "decimal", "precision": 10, "scale": 2}},
        {"name": "tags", "type": {"type": "array", "items": "string"}},
        {"name": "status", "type": {"type": "enum", "name": "Status", "symbols": ["ACTIVE", "DELETED"]}},
        {"name": "extra", "type": ["null", "string"]}
      ]
    }"#;

    #[test]
    fn parses_record_schema() {
        let schema = SchemaNode::parse_str(USER_SCHEMA).unwrap();
        let SchemaKind::Record { name, fields } = schema.kind() else {
            panic!("expected record, got {}", schema.type_name());
        };
        assert_eq!(name, "User");
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0].name, "id");
        assert!(fields[0].schema.directive_properties().is_some());
        assert!(fields[1].schema.directive_properties().is_none());
    }

    #[test]
    fn parses_decimal_logical_type() {
        let schema = SchemaNode::parse_str(USER_SCHEMA).unwrap();
        let SchemaKind::Record { fields, .. } = schema.kind() else {
            unreachable!()
        };
        let decimal = fields[2].schema.decimal().unwrap();
        assert_eq!(decimal.precision, 10);
        assert_eq!(decimal.scale, 2);
    }

    #[test]
    fn rejects_invalid_decimal_scale() {
        let result = SchemaNode::parse_str(
            r#"{"type": "bytes", "logicalType": "decimal", "precision": 2, "scale": 5}"#,
        );
        assert!(matches!(result, Err(SchemaError::Invalid(_))));
    }

    #[test]
    fn structurally_equal_nodes_have_distinct_ids() {
        let schema = SchemaNode::parse_str(
            r#"
            {
              "type": "record",
              "name": "Pair",
              "fields": [
                {"name": "a", "type": {"type": "long", "arg.properties": {"iteration": {"start": 0}}}},
                {"name": "b", "type": {"type": "long", "arg.properties": {"iteration": {"start": 0}}}}
              ]
            }"#,
        )
        .unwrap();
        let SchemaKind::Record { fields, .. } = schema.kind() else {
            unreachable!()
        };
        assert_ne!(fields[0].schema.id(), fields[1].schema.id());
    }

    #[test]
    fn named_type_reference_shares_id() {
        let schema = SchemaNode::parse_str(
            r#"
            {
              "type": "record",
              "name": "Wrapper",
              "fields": [
                {"name": "first", "type": {"type": "enum", "name": "Color", "symbols": ["RED", "BLUE"]}},
                {"name": "second", "type": "Color"}
              ]
            }"#,
        )
        .unwrap();
        let SchemaKind::Record { fields, .. } = schema.kind() else {
            unreachable!()
        };
        assert_eq!(fields[0].schema.id(), fields[1].schema.id());
    }

    #[test]
    fn rejects_non_object_directives() {
        let result = SchemaNode::parse_str(r#"{"type": "long", "arg.properties": 12}"#);
        assert!(matches!(result, Err(SchemaError::Invalid(_))));
    }

    #[test]
    fn rejects_undefined_type_name() {
        let result = SchemaNode::parse_str(r#""Mystery""#);
        assert!(matches!(result, Err(SchemaError::Invalid(_))));
    }

    #[test]
    fn parses_namespaced_names() {
        let schema = SchemaNode::parse_str(
            r#"{"type": "fixed", "name": "Digest", "namespace": "com.example", "size": 16}"#,
        )
        .unwrap();
        let SchemaKind::Fixed { name, size, .. } = schema.kind() else {
            panic!("expected fixed");
        };
        assert_eq!(name, "com.example.Digest");
        assert_eq!(*size, 16);
    }
}
