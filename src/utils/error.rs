use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Invalid coordinate: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Branch not found: {id}")]
    BranchNotFound { id: String },

    #[error("Branch already exists: {id}")]
    DuplicateBranch { id: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Query,
    Storage,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LocatorError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        LocatorError::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        LocatorError::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LocatorError::InvalidCoordinate { .. } | LocatorError::InvalidQuery { .. } => {
                ErrorCategory::Query
            }
            LocatorError::StorageUnavailable { .. } | LocatorError::IoError(_) => {
                ErrorCategory::Storage
            }
            LocatorError::BranchNotFound { .. }
            | LocatorError::DuplicateBranch { .. }
            | LocatorError::CsvError(_)
            | LocatorError::SerializationError(_) => ErrorCategory::Data,
            LocatorError::ConfigValidationError { .. }
            | LocatorError::InvalidConfigValueError { .. }
            | LocatorError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Query => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LocatorError::InvalidCoordinate { .. } => {
                "Latitude must be within [-90, 90] and longitude within [-180, 180]"
            }
            LocatorError::InvalidQuery { .. } => {
                "Check that radius and limit are positive and that type filters are not empty"
            }
            LocatorError::StorageUnavailable { .. } => {
                "Verify the branch data source is reachable and retry"
            }
            LocatorError::BranchNotFound { .. } => "Check the branch id against the loaded dataset",
            LocatorError::DuplicateBranch { .. } => "Branch ids must be unique across the dataset",
            LocatorError::IoError(_) => "Make sure the data file exists and is readable",
            LocatorError::CsvError(_) | LocatorError::SerializationError(_) => {
                "Check the branch data file format (JSON array or CSV with a header row)"
            }
            LocatorError::ConfigValidationError { .. }
            | LocatorError::InvalidConfigValueError { .. }
            | LocatorError::MissingConfigError { .. } => {
                "Fix the configuration file and run again"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Query => format!("The search request was rejected: {}", self),
            ErrorCategory::Storage => format!("Branch data could not be read: {}", self),
            ErrorCategory::Data => format!("Branch data problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, LocatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_errors_are_high_severity() {
        let err = LocatorError::invalid_query("radius must be positive");
        assert_eq!(err.category(), ErrorCategory::Query);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.to_string().contains("radius must be positive"));
    }

    #[test]
    fn test_storage_errors_are_critical() {
        let err = LocatorError::storage_unavailable("connection refused");
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("connection refused"));
    }
}
