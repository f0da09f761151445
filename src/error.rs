use thiserror::Error;

///
/// Failures surfaced while applying overrides.
///
/// Every error aborts the walk at the field that produced it. Fields
/// overridden before that point keep their new values; nothing is
/// rolled back.
///
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The walk descended past the configured depth bound, which in
    /// practice means the structure reaches back into itself.
    #[error("recursive overflow at {prefix}: structure nests deeper than {max_depth} levels")]
    RecursionOverflow { prefix: String, max_depth: usize },

    /// The top-level target did not present as a structure.
    #[error("expected a struct under prefix {prefix}")]
    NotAStruct { prefix: String },

    /// An override value exists for a field the walk may not write.
    #[error("failed to apply {key} to {field}: {field} is not settable")]
    Unsettable { key: String, field: &'static str },

    /// The override value does not parse as the field's declared type.
    #[error("failed to apply {key} to {field} using type {type_name} and value '{value}'")]
    InvalidValue {
        key: String,
        field: &'static str,
        type_name: &'static str,
        value: String,
    },
}
