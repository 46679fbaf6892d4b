//! Error type for generator operations.

/// Error raised while resolving directives or generating values.
///
/// All directive validation is eager on the first visit to a node and fatal
/// to the current `generate()` call; there is no local recovery.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// A directive value has the wrong structural type.
    #[error("{directive} property {reason}")]
    Shape {
        directive: &'static str,
        reason: String,
    },

    /// Numeric fields of a directive are out of order or degenerate.
    #[error("{directive} property {reason}")]
    Bounds {
        directive: &'static str,
        reason: String,
    },

    /// Two directives that cannot coexist were given on one node.
    #[error("cannot specify {excluded} prop when {included} prop is given")]
    Exclusion {
        included: &'static str,
        excluded: &'static str,
    },

    /// An options entry cannot be coerced into or validated against the
    /// node schema.
    #[error("invalid option for {schema} schema: {reason}")]
    Coercion { schema: &'static str, reason: String },

    /// An options file is missing or unreadable.
    #[error("unable to read options file '{path}': {reason}")]
    Resource { path: String, reason: String },

    /// A directive was applied to a schema variant that does not support it.
    #[error("{directive} prop can only be specified on {supported} schemas, not {schema} schemas")]
    Unsupported {
        directive: &'static str,
        supported: &'static str,
        schema: &'static str,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeneratorError>;
