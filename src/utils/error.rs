use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV report error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Runtime directory {path} is not usable: {reason}")]
    LayoutError { path: String, reason: String },

    #[error("Source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("Upload of {key} failed: {message}")]
    UploadError { key: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Filesystem,
    Source,
    Network,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            SyncError::IoError(_) | SyncError::LayoutError { .. } => ErrorCategory::Filesystem,
            SyncError::SourceUnavailable { .. } => ErrorCategory::Source,
            SyncError::UploadError { .. } => ErrorCategory::Network,
            SyncError::SerializationError(_) | SyncError::CsvError(_) => ErrorCategory::Report,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Report => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Source => ErrorSeverity::High,
            ErrorCategory::Filesystem => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::MissingConfigError { .. } => {
                "Set the missing value through its environment variable, CLI flag or config file"
            }
            SyncError::InvalidConfigValueError { .. }
            | SyncError::ConfigValidationError { .. }
            | SyncError::ConfigError { .. } => "Check the configuration values and try again",
            SyncError::LayoutError { .. } => {
                "Make sure the logs, cache and test-data directories exist and are writable"
            }
            SyncError::SourceUnavailable { .. } => {
                "Mount the SMB share and point SMB_MOUNT_PATH at it, or run with --mock"
            }
            SyncError::UploadError { .. } => {
                "Check AWS credentials, bucket permissions and network connectivity, then re-run"
            }
            SyncError::IoError(_) => "Check file permissions and available disk space",
            SyncError::SerializationError(_) | SyncError::CsvError(_) => {
                "The sync itself finished; inspect the logs directory for partial reports"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SyncError::MissingConfigError { field } => {
                format!("Configuration is incomplete: {} is required", field)
            }
            SyncError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            SyncError::SourceUnavailable { message } => {
                format!("Cannot read the source files: {}", message)
            }
            SyncError::UploadError { key, .. } => format!("Could not upload {}", key),
            SyncError::LayoutError { path, reason } => {
                format!("Runtime directory {} is not usable ({})", path, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_category() {
        let err = SyncError::MissingConfigError {
            field: "s3_bucket".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = SyncError::UploadError {
            key: "a.txt".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = SyncError::LayoutError {
            path: "/app/logs".to_string(),
            reason: "read-only".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_user_friendly_message_names_field() {
        let err = SyncError::MissingConfigError {
            field: "S3_BUCKET".to_string(),
        };
        assert!(err.user_friendly_message().contains("S3_BUCKET"));
    }
}
