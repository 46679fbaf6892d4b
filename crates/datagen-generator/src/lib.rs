//! Directive-driven random value generation for Avro schemas.
//!
//! This crate walks a parsed schema tree (from `datagen-core`) and produces
//! a [`datagen_core::Value`] on every [`Generator::generate`] call, honoring
//! the generator directives attached to schema nodes under the reserved
//! `arg.properties` user property: `options`, `iteration`, `length`,
//! `regex`, `prefix`, `suffix`, `range`, `odds` and `keys`.
//!
//! Generation is deterministic: two generators built with the same schema,
//! seed and generation offset produce bit-identical sequences, and the
//! generation offset fast-forwards every iterative node in constant time.
//!
//! # Example
//!
//! ```rust
//! use datagen_generator::Generator;
//!
//! let mut generator = Generator::builder()
//!     .schema_str(r#"
//!     {
//!       "type": "record",
//!       "name": "Order",
//!       "fields": [
//!         {"name": "id", "type": {"type": "long", "arg.properties": {"iteration": {"start": 1}}}},
//!         {"name": "total", "type": {"type": "double", "arg.properties": {"range": {"min": 0.0, "max": 100.0}}}}
//!       ]
//!     }"#)
//!     .unwrap()
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let order = generator.generate().unwrap();
//! assert_eq!(order.field("id").and_then(|id| id.as_i64()), Some(1));
//! ```

mod bounds;
mod codec;
mod decimal;
mod directives;
mod error;
mod generator;
mod iterators;
mod options;
mod pattern;

pub use bounds::LengthBounds;
pub use directives::{
    ITERATION_PROP, ITERATION_PROP_INITIAL, ITERATION_PROP_RESTART, ITERATION_PROP_START,
    ITERATION_PROP_STEP, KEYS_PROP, LENGTH_PROP, LENGTH_PROP_MAX, LENGTH_PROP_MIN, ODDS_PROP,
    OPTIONS_PROP, OPTIONS_PROP_ENCODING, OPTIONS_PROP_FILE, PREFIX_PROP, RANGE_PROP,
    RANGE_PROP_MAX, RANGE_PROP_MIN, REGEX_PROP, SUFFIX_PROP,
};
pub use error::{GeneratorError, Result};
pub use generator::{Generator, GeneratorBuilder};
