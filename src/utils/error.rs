//! Error handling for texform
//!
//! Parsing is total, so errors only surface where a caller asks why a chart
//! had no structured form, and at the I/O edges (CLI, WASM).

use std::fmt;

/// Transcoder error type
#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeError {
    /// No `axis` environment was found in chart code
    NoAxis,
    /// An `axis` environment was found but it held no recognized series
    NoSeries,
    /// A name (tag, line style, chart type) was not recognized
    UnknownTag { kind: &'static str, name: String },
    /// Invalid input
    InvalidInput { message: String },
    /// JSON (de)serialization failure
    Json { message: String },
    /// IO error (for file operations)
    IoError { message: String },
}

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscodeError::NoAxis => write!(f, "No axis environment found"),
            TranscodeError::NoSeries => {
                write!(f, "Axis environment contains no recognized series")
            }
            TranscodeError::UnknownTag { kind, name } => {
                write!(f, "Unknown {} '{}'", kind, name)
            }
            TranscodeError::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)
            }
            TranscodeError::Json { message } => write!(f, "JSON error: {}", message),
            TranscodeError::IoError { message } => write!(f, "IO error: {}", message),
        }
    }
}

impl std::error::Error for TranscodeError {}

impl From<std::io::Error> for TranscodeError {
    fn from(err: std::io::Error) -> Self {
        TranscodeError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TranscodeError {
    fn from(err: serde_json::Error) -> Self {
        TranscodeError::Json {
            message: err.to_string(),
        }
    }
}

/// Result type for transcoder operations
pub type TranscodeResult<T> = Result<T, TranscodeError>;

// Convenience constructors for errors
impl TranscodeError {
    pub fn unknown(kind: &'static str, name: impl Into<String>) -> Self {
        TranscodeError::UnknownTag {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        TranscodeError::InvalidInput {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_display() {
        let err = TranscodeError::unknown("math tag", "sqrt");
        assert_eq!(err.to_string(), "Unknown math tag 'sqrt'");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.tex");
        let err: TranscodeError = io.into();
        assert!(err.to_string().contains("missing.tex"));
    }

    #[test]
    fn test_json_conversion() {
        let err: TranscodeError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
