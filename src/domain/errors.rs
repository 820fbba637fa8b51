use thiserror::Error;

/// Integrity violations between the field schema and the step partition.
///
/// These are programming defects in the form definition and are reported
/// when a wizard is constructed, never tolerated at runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Field '{0}' is defined more than once")]
    DuplicateField(String),

    #[error("Field '{field}' is not assigned to any step")]
    UnassignedField { field: String },

    #[error("Field '{field}' appears in steps {first} and {second}")]
    FieldInTwoSteps { field: String, first: usize, second: usize },

    #[error("Step {step} references unknown field '{field}'")]
    UnknownStepField { step: usize, field: String },

    #[error("Step ids must run 1..N without gaps, found {found} at position {position}")]
    NonContiguousStep { position: usize, found: usize },

    #[error("A wizard needs at least one step")]
    NoSteps,

    #[error("Default value of field '{0}' does not match its kind")]
    InvalidDefault(String),
}

/// Rejected attempts to write a value into the draft record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field '{field}' expects a {expected} value")]
    KindMismatch { field: String, expected: &'static str },
}

pub type SchemaResult<T> = Result<T, SchemaError>;
