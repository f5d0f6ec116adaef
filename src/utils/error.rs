use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidyError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Input is not valid UTF-8: {0}")]
    DecodeError(#[from] std::string::FromUtf8Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Unknown transform: {id}")]
    UnknownTransform { id: String },

    #[error("Result is not ready for export: {reason}")]
    NotReady { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Processing,
    Configuration,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TidyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TidyError::DecodeError(_) => ErrorCategory::Input,
            TidyError::CsvError(_) | TidyError::SerializationError(_) => ErrorCategory::Processing,
            TidyError::ConfigError { .. }
            | TidyError::InvalidConfigValueError { .. }
            | TidyError::MissingConfigError { .. }
            | TidyError::UnknownTransform { .. } => ErrorCategory::Configuration,
            TidyError::IoError(_) | TidyError::NotReady { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TidyError::NotReady { .. } => ErrorSeverity::Low,
            TidyError::ConfigError { .. }
            | TidyError::InvalidConfigValueError { .. }
            | TidyError::MissingConfigError { .. }
            | TidyError::UnknownTransform { .. } => ErrorSeverity::Medium,
            TidyError::DecodeError(_) | TidyError::CsvError(_) => ErrorSeverity::High,
            TidyError::IoError(_) | TidyError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            TidyError::DecodeError(_) => {
                "Re-export the file as UTF-8 text and import it again".to_string()
            }
            TidyError::CsvError(_) => {
                "Check the file for unbalanced quotes or binary content".to_string()
            }
            TidyError::IoError(_) => {
                "Check that the input file exists and the output directory is writable"
                    .to_string()
            }
            TidyError::SerializationError(_) => {
                "Check that the error report path is writable".to_string()
            }
            TidyError::ConfigError { .. } | TidyError::InvalidConfigValueError { .. } => {
                "Fix the reported option and run again".to_string()
            }
            TidyError::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            TidyError::UnknownTransform { .. } => format!(
                "Use one of the registered transforms: {}",
                crate::core::transform::TransformRegistry::standard()
                    .ids()
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            TidyError::NotReady { .. } => {
                "Import a file with at least one data row before exporting".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TidyError::DecodeError(_) => "The input file could not be read as text".to_string(),
            TidyError::IoError(e) => format!("File access failed: {}", e),
            TidyError::NotReady { reason } => format!("Nothing to export: {}", reason),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TidyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_is_fatal_input_error() {
        let err = TidyError::from(String::from_utf8(vec![0xff, 0xfe]).unwrap_err());
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("could not be read"));
    }

    #[test]
    fn test_unknown_transform_suggests_registered_ids() {
        let err = TidyError::UnknownTransform {
            id: "nope".to_string(),
        };
        let suggestion = err.recovery_suggestion();
        assert!(suggestion.contains("remove-first-line"));
        assert!(suggestion.contains("round-amounts"));
    }
}
