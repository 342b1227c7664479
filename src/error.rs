use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Policy store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Unsupported value type {value_type} for {hive}: {message}")]
    UnsupportedValueType {
        value_type: String,
        hive: String,
        message: String,
    },

    #[error("Partial application (GPO created: {gpo_created}): {source}")]
    PartialApplication {
        gpo_created: bool,
        #[source]
        source: Box<AppError>,
    },

    #[error("GPO error: {0}")]
    GpoError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::UnsupportedValueType { .. } => "UNSUPPORTED_VALUE_TYPE",
            AppError::PartialApplication { .. } => "PARTIAL_APPLICATION",
            AppError::GpoError(_) => "GPO_ERROR",
            AppError::IoError(_) => "IO_ERROR",
            AppError::SerializationError(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether a GPO was created before this error stopped the pass
    pub fn gpo_created(&self) -> bool {
        matches!(self, AppError::PartialApplication { gpo_created: true, .. })
    }
}

/// Serializable error handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    /// A completed write still counts as a change even when the pass failed
    pub changed: bool,
    pub gpo_created: bool,
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        let gpo_created = err.gpo_created();
        CommandError {
            code: err.error_code().to_string(),
            message: err.to_string(),
            changed: gpo_created,
            gpo_created,
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let gpo_created = self.gpo_created();
        let cmd_error = CommandError {
            code: self.error_code().to_string(),
            message: self.to_string(),
            changed: gpo_created,
            gpo_created,
        };
        cmd_error.serialize(serializer)
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_application_reports_change() {
        let err = AppError::PartialApplication {
            gpo_created: true,
            source: Box::new(AppError::StoreUnavailable("RPC server is unavailable".to_string())),
        };
        let cmd: CommandError = err.into();
        assert_eq!(cmd.code, "PARTIAL_APPLICATION");
        assert!(cmd.changed);
        assert!(cmd.gpo_created);
        assert!(cmd.message.contains("RPC server is unavailable"));
    }

    #[test]
    fn test_plain_errors_report_no_change() {
        let cmd: CommandError = AppError::InvalidConfiguration("bad hive".to_string()).into();
        assert_eq!(cmd.code, "INVALID_CONFIGURATION");
        assert!(!cmd.changed);
        assert!(!cmd.gpo_created);
    }

    #[test]
    fn test_app_error_serializes_as_command_error() {
        let json = serde_json::to_value(AppError::GpoError("boom".to_string())).unwrap();
        assert_eq!(json["code"], "GPO_ERROR");
        assert_eq!(json["gpoCreated"], false);
    }
}
