//! avro-datagen
//!
//! Generates random data conforming to an Avro schema, driven by generator
//! directives attached to schema nodes under the reserved `arg.properties`
//! user property.
//!
//! The heavy lifting lives in two library crates, re-exported here:
//!
//! - [`datagen_core`] - schema tree ([`SchemaNode`]) and value model
//!   ([`Value`])
//! - [`datagen_generator`] - the generation core ([`Generator`])
//!
//! # Library usage
//!
//! ```rust
//! use avro_datagen::Generator;
//!
//! let mut generator = Generator::builder()
//!     .schema_str(r#"{"type": "string", "arg.properties": {"options": ["a", "b"]}}"#)
//!     .unwrap()
//!     .seed(42)
//!     .build()
//!     .unwrap();
//! let value = generator.generate().unwrap();
//! assert!(matches!(value.as_str(), Some("a") | Some("b")));
//! ```
//!
//! # CLI usage
//!
//! ```bash
//! # one pretty-printed record from a schema file
//! avro-datagen -f schema.avsc
//!
//! # a reproducible NDJSON stream
//! avro-datagen -f schema.avsc -i 100 --format ndjson --seed 42
//!
//! # resume a deterministic sequence at record 1000
//! avro-datagen -f schema.avsc --seed 42 --generation 1000
//! ```

pub use datagen_core::{DecimalType, SchemaError, SchemaKind, SchemaNode, Value};
pub use datagen_generator::{Generator, GeneratorBuilder, GeneratorError, LengthBounds};
