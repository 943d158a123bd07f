//! Configuration validation errors and semantic validation.

use crate::analysis::AnalysisConfig;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::UnsupportedFormat(_) => 62,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate an analysis configuration semantically.
pub fn validate_config(config: &AnalysisConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if let Some(numlabels) = config.labels.numlabels {
        require_positive("labels.numlabels", numlabels)?;
        if numlabels > cap_math::MAX_NUMLABELS {
            return Err(ValidationError::InvalidValue {
                field: "labels.numlabels".to_string(),
                message: format!(
                    "Must be at most {}, got {}",
                    cap_math::MAX_NUMLABELS,
                    numlabels
                ),
            });
        }
    }
    require_positive("filter.minlength", config.filter.minlength)?;
    require_positive("filter.minhold", config.filter.minhold)?;

    Ok(())
}

fn require_positive(field: &str, value: usize) -> ValidationResult<()> {
    if value == 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be at least 1, got {}", value),
        });
    }
    Ok(())
}
