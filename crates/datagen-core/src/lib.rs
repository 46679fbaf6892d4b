//! Core types for avro-datagen.
//!
//! This crate provides the foundational types used across the generator:
//!
//! - [`SchemaNode`] - parsed Avro schema tree with per-node identity and
//!   generator directives (the reserved `arg.properties` user property)
//! - [`Value`] - the generated value tree
//!
//! # Architecture
//!
//! ```text
//! datagen-core (this crate)
//!    │
//!    ├─── datagen-generator  (walks SchemaNode, produces Value)
//!    │
//!    └─── avro-datagen       (CLI; projects Value to JSON output)
//! ```

pub mod schema;
pub mod values;

// Re-exports for convenience
pub use schema::{
    DecimalType, NodeId, RecordField, SchemaError, SchemaKind, SchemaNode, ARG_PROPERTIES,
};
pub use values::Value;
