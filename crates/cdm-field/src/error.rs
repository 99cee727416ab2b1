//! Error types for field operations.

use thiserror::Error;

use cdm_common::{CalendarError, CdmError};

/// Result type alias using FieldError.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors raised while mapping, locating, partitioning or exporting a field.
#[derive(Debug, Error)]
pub enum FieldError {
    // === Configuration Errors ===
    #[error(
        "Coordinate variables for axis {axis} must share a shape: '{first}' is {first_shape:?}, '{other}' is {other_shape:?}"
    )]
    CoordinateShapeMismatch {
        axis: usize,
        first: String,
        first_shape: Vec<usize>,
        other: String,
        other_shape: Vec<usize>,
    },

    #[error("Variable '{variable}' does not share the coordinates mapping of field '{field}'")]
    IncompatibleMapping { field: String, variable: String },

    #[error("Field '{0}' has no time coordinate")]
    MissingTimeCoordinate(String),

    #[error("A {rows}x{cols} grid is too small to derive cell corners")]
    DegenerateGrid { rows: usize, cols: usize },

    #[error("Mask shape {actual:?} does not match grid shape {expected:?}")]
    MaskShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid export configuration: {0}")]
    Config(String),

    // === Wrapped Errors ===
    #[error(transparent)]
    Model(#[from] CdmError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

impl FieldError {
    /// Whether the error indicates a malformed dataset rather than bad input.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            FieldError::CoordinateShapeMismatch { .. }
            | FieldError::IncompatibleMapping { .. }
            | FieldError::Config(_) => true,
            FieldError::Model(e) => e.is_configuration_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        let err = FieldError::IncompatibleMapping {
            field: "tas".to_string(),
            variable: "station_id".to_string(),
        };
        assert!(err.is_configuration_error());
        assert!(!FieldError::MissingTimeCoordinate("tas".to_string()).is_configuration_error());
    }

    #[test]
    fn test_wrapped_errors_are_transparent() {
        let err: FieldError = CdmError::variable_not_found("pr").into();
        assert_eq!(err.to_string(), "Variable not found: pr");

        let err: FieldError = CalendarError::UnknownCalendar("julian".to_string()).into();
        assert!(err.to_string().contains("julian"));
    }
}
