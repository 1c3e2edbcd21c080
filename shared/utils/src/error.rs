use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RejectionStatus;

/// Why an uploaded file was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionKind {
    UnsupportedType,
    TooLarge,
    UnexpectedField,
}

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum RelayError {
    #[error("Transport provisioning error: {message}")]
    TransportProvision { message: String },

    #[error("Transport verification error: {message}")]
    TransportVerification { message: String },

    #[error("{message}")]
    UploadRejection { kind: RejectionKind, message: String },

    #[error("Dispatch error: {message}")]
    Dispatch { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl RelayError {
    pub fn transport_provision(message: impl Into<String>) -> Self {
        Self::TransportProvision {
            message: message.into(),
        }
    }

    pub fn transport_verification(message: impl Into<String>) -> Self {
        Self::TransportVerification {
            message: message.into(),
        }
    }

    pub fn upload_rejection(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self::UploadRejection {
            kind,
            message: message.into(),
        }
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::Dispatch {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TransportProvision { .. } => "TRANSPORT_PROVISION_ERROR",
            Self::TransportVerification { .. } => "TRANSPORT_VERIFICATION_ERROR",
            Self::UploadRejection { kind, .. } => match kind {
                RejectionKind::UnsupportedType => "UNSUPPORTED_FILE_TYPE",
                RejectionKind::TooLarge => "FILE_TOO_LARGE",
                RejectionKind::UnexpectedField => "UNEXPECTED_FILE_FIELD",
            },
            Self::Dispatch { .. } => "DISPATCH_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        self.http_status_code_with(RejectionStatus::Specific)
    }

    /// Status code for this error, with upload rejections mapped according
    /// to `policy`.
    pub fn http_status_code_with(&self, policy: RejectionStatus) -> u16 {
        match self {
            Self::UploadRejection { kind, .. } => match (policy, kind) {
                (RejectionStatus::Uniform, _) => 400,
                (RejectionStatus::Specific, RejectionKind::UnsupportedType) => 415,
                (RejectionStatus::Specific, RejectionKind::TooLarge) => 413,
                (RejectionStatus::Specific, RejectionKind::UnexpectedField) => 400,
            },
            Self::Validation { .. } => 400,
            Self::TransportProvision { .. } => 502,
            Self::TransportVerification { .. } => 502,
            Self::Dispatch { .. } => 502,
            Self::Configuration { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }

    /// Whether the error is meant to reach an HTTP caller. Transport and
    /// dispatch failures only ever go to the logs.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::UploadRejection { .. } | Self::Validation { .. })
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<RelayError> for ErrorResponse {
    fn from(error: RelayError) -> Self {
        let details = match &error {
            RelayError::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };
        Self {
            error: error.error_code().to_lowercase(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(error: reqwest::Error) -> Self {
        Self::transport_provision(error.to_string())
    }
}

impl From<::config::ConfigError> for RelayError {
    fn from(error: ::config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
