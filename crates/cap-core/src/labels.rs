//! Label file reading and writing.
//!
//! A label file holds one integer state label per timepoint, separated by any
//! mix of whitespace. `#` starts a comment that runs to the end of the line.
//! Integral floats such as `3.0` or `3.000000000000000000e+00` are accepted,
//! since numeric toolkits often write labels that way.

use cap_math::Label;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading a label file.
#[derive(Debug, Error)]
pub enum LabelFileError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}:{line}: '{token}' is not an integer label")]
    InvalidToken {
        origin: String,
        line: usize,
        token: String,
    },

    #[error("{origin}: no labels found")]
    Empty { origin: String },
}

impl LabelFileError {
    pub fn code(&self) -> u32 {
        match self {
            LabelFileError::Io { .. } => 40,
            LabelFileError::InvalidToken { .. } => 41,
            LabelFileError::Empty { .. } => 42,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, LabelFileError::Io { .. })
    }
}

/// Parse label text. `origin` names the source in error messages.
pub fn parse_labels(text: &str, origin: &str) -> Result<Vec<Label>, LabelFileError> {
    let mut labels = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let content = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        for token in content.split_whitespace() {
            let label = parse_token(token).ok_or_else(|| LabelFileError::InvalidToken {
                origin: origin.to_string(),
                line: lineno + 1,
                token: token.to_string(),
            })?;
            labels.push(label);
        }
    }

    if labels.is_empty() {
        return Err(LabelFileError::Empty {
            origin: origin.to_string(),
        });
    }
    Ok(labels)
}

fn parse_token(token: &str) -> Option<Label> {
    if let Ok(label) = token.parse::<Label>() {
        return Some(label);
    }
    let value = token.parse::<f64>().ok()?;
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if value.is_finite() && value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Some(value as Label)
    } else {
        None
    }
}

/// Read and parse a label file.
pub fn read_labels(path: &Path) -> Result<Vec<Label>, LabelFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| LabelFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let labels = parse_labels(&text, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), timepoints = labels.len(), "read label file");
    Ok(labels)
}

/// One label per line, newline-terminated.
pub fn format_labels(labels: &[Label]) -> String {
    let mut out = String::with_capacity(labels.len() * 3);
    for label in labels {
        out.push_str(&label.to_string());
        out.push('\n');
    }
    out
}
