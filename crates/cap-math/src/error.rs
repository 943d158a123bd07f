//! Error types for state-sequence analysis.

use crate::Label;
use thiserror::Error;

/// Result type alias for state analysis operations.
pub type Result<T> = std::result::Result<T, StateError>;

/// Failures raised by the filter and the statistics engine.
///
/// All of these are deterministic input or configuration problems; none is
/// worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {field} {message}")]
    InvalidConfiguration {
        field: &'static str,
        message: String,
    },

    #[error("label {label} at index {index} is outside the declared range [{min}, {max}]")]
    LabelOutOfRange {
        label: Label,
        index: usize,
        min: Label,
        max: Label,
    },
}

impl StateError {
    /// Stable error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            StateError::InvalidInput(_) => 30,
            StateError::InvalidConfiguration { .. } => 31,
            StateError::LabelOutOfRange { .. } => 32,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StateError::InvalidInput(_) => "invalid_input",
            StateError::InvalidConfiguration { .. } => "invalid_configuration",
            StateError::LabelOutOfRange { .. } => "label_out_of_range",
        }
    }

    pub(crate) fn non_positive(field: &'static str, value: usize) -> Self {
        StateError::InvalidConfiguration {
            field,
            message: format!("must be at least 1, got {value}"),
        }
    }

    pub(crate) fn too_many_labels(numlabels: u128) -> Self {
        StateError::InvalidConfiguration {
            field: "numlabels",
            message: format!(
                "must be at most {}, got {numlabels}",
                crate::MAX_NUMLABELS
            ),
        }
    }

    pub(crate) fn unrepresentable_range(minlabel: Label, numlabels: usize) -> Self {
        StateError::InvalidConfiguration {
            field: "numlabels",
            message: format!("{numlabels} labels starting at {minlabel} overflow the label type"),
        }
    }
}
