use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration key: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Extract error for {path}: {message}")]
    ExtractError { path: String, message: String },

    #[error("Validation failed: missing expected columns [{}]", missing.join(", "))]
    ValidationError {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("Transform failed on column '{column}' at row {row}: {message}")]
    TransformError {
        column: String,
        row: usize,
        message: String,
    },

    #[error("Failed to write {path}: {message}")]
    ArtifactWriteError { path: String, message: String },

    #[error("Output file already exists: {path}")]
    LoadConflictError { path: String },

    #[error("Report error: {message}")]
    ReportError { message: String },

    #[error("Run log write failed: {message}")]
    LogWriteError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Data,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Recorded but never fails the run.
    Low,
    /// Safe to re-run once the operator has made a decision.
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        EtlError::ConfigError {
            message: message.into(),
        }
    }

    pub fn extract(path: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::ExtractError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::ArtifactWriteError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn transform(column: impl Into<String>, row: usize, message: impl Into<String>) -> Self {
        EtlError::TransformError {
            column: column.into(),
            row,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::ExtractError { .. } | EtlError::CsvError(_) => ErrorCategory::Input,
            EtlError::ValidationError { .. } | EtlError::TransformError { .. } => {
                ErrorCategory::Data
            }
            EtlError::ArtifactWriteError { .. }
            | EtlError::LoadConflictError { .. }
            | EtlError::ReportError { .. }
            | EtlError::LogWriteError { .. } => ErrorCategory::Output,
            EtlError::IoError(_) | EtlError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ReportError { .. } | EtlError::LogWriteError { .. } => ErrorSeverity::Low,
            EtlError::LoadConflictError { .. } => ErrorSeverity::Medium,
            EtlError::ExtractError { .. }
            | EtlError::CsvError(_)
            | EtlError::ValidationError { .. }
            | EtlError::TransformError { .. } => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ArtifactWriteError { .. }
            | EtlError::IoError(_)
            | EtlError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a run that ended on this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ConfigError { .. } => {
                "Check that the config file exists and is valid TOML".to_string()
            }
            EtlError::MissingConfigError { field } => {
                format!("Add `{}` to the config file", field)
            }
            EtlError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of `{}` in the config file", field)
            }
            EtlError::ExtractError { path, .. } => format!(
                "Make sure {} exists, is readable and has a header plus at least one data row",
                path
            ),
            EtlError::ValidationError { missing, .. } => format!(
                "Add the missing columns ({}) to the source file \
                 or drop them from inputs.expected_columns",
                missing.join(", ")
            ),
            EtlError::TransformError { column, row, .. } => format!(
                "Fix the value of '{}' in data row {} or change the rule for that column",
                column, row
            ),
            EtlError::LoadConflictError { path } => format!(
                "Move {} aside or set outputs.allow_overwrite = true",
                path
            ),
            EtlError::ArtifactWriteError { path, .. } => format!(
                "Check that the directory holding {} is writable and has free space",
                path
            ),
            EtlError::ReportError { .. } => "Check that reports_dir is writable".to_string(),
            EtlError::LogWriteError { .. } => "Check that logs_dir is writable".to_string(),
            EtlError::CsvError(_) => {
                "Check the delimiter and quoting of the source file".to_string()
            }
            EtlError::IoError(_) => "Check file permissions and free disk space".to_string(),
            EtlError::SerializationError(_) => "Re-run with --verbose for details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Could not read source data: {}", self),
            ErrorCategory::Data => format!("Source data rejected: {}", self),
            ErrorCategory::Output => format!("Could not write results: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_every_missing_column() {
        let err = EtlError::ValidationError {
            missing: vec!["age".to_string(), "site".to_string()],
            found: vec!["patient_id".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("age"));
        assert!(message.contains("site"));
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        assert_eq!(EtlError::config("bad").exit_code(), 3);
        assert_eq!(EtlError::transform("age", 2, "not a number").exit_code(), 1);
        let conflict = EtlError::LoadConflictError {
            path: "out.csv".to_string(),
        };
        assert_eq!(conflict.exit_code(), 2);
        let report = EtlError::ReportError {
            message: "disk full".to_string(),
        };
        assert_eq!(report.severity(), ErrorSeverity::Low);
    }
}
