//! Error types for the common data model.

use thiserror::Error;

use crate::calendar::CalendarError;

/// Result type alias using CdmError.
pub type CdmResult<T> = Result<T, CdmError>;

/// Primary error type for dataset, group and variable operations.
#[derive(Debug, Error)]
pub enum CdmError {
    // === Structure Errors ===
    #[error("Dimension not found: {0}")]
    DimensionNotFound(String),

    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Dimension '{0}' is already defined in this group")]
    DuplicateDimension(String),

    #[error("Variable '{0}' is already defined in this group")]
    DuplicateVariable(String),

    #[error("Group '{0}' already exists")]
    DuplicateGroup(String),

    #[error("Dimension '{name}' is not unlimited and cannot grow to {requested}")]
    NotUnlimited { name: String, requested: usize },

    #[error("Dimension '{name}' cannot shrink from {current} to {requested}")]
    DimensionShrink {
        name: String,
        current: usize,
        requested: usize,
    },

    // === Data Errors ===
    #[error("Shape mismatch for '{name}': dimensions declare {expected:?}, data has {actual:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Expected numeric data for '{0}'")]
    NotNumeric(String),

    // === Opening Errors ===
    #[error("No registered opener could open: {0}")]
    NoOpener(String),

    #[error("Invalid dataset descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Temporal Errors ===
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

impl CdmError {
    /// Create a DimensionNotFound error.
    pub fn dimension_not_found(name: impl Into<String>) -> Self {
        Self::DimensionNotFound(name.into())
    }

    /// Create a VariableNotFound error.
    pub fn variable_not_found(name: impl Into<String>) -> Self {
        Self::VariableNotFound(name.into())
    }

    /// Create an InvalidSelection error.
    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }

    /// Create an InvalidDescriptor error.
    pub fn invalid_descriptor(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    /// Whether the error points at a malformed dataset rather than a lookup miss.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CdmError::ShapeMismatch { .. }
                | CdmError::DuplicateDimension(_)
                | CdmError::DuplicateVariable(_)
                | CdmError::DuplicateGroup(_)
                | CdmError::InvalidDescriptor(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CdmError::dimension_not_found("lat");
        assert_eq!(err.to_string(), "Dimension not found: lat");
    }

    #[test]
    fn test_calendar_error_is_transparent() {
        let err: CdmError = CalendarError::UnknownCalendar("julian".to_string()).into();
        assert!(err.to_string().contains("julian"));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_shape_mismatch_is_configuration_error() {
        let err = CdmError::ShapeMismatch {
            name: "tas".to_string(),
            expected: vec![2, 3],
            actual: vec![3, 2],
        };
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("tas"));
    }
}
