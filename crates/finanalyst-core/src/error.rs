//! Error types for finanalyst-core
//!
//! Every failed REST call is reduced to one of four kinds: the request never
//! got a response, the server rejected the payload, the entity does not
//! exist, or anything else. The error value is what the entity store keeps
//! verbatim as its `error_message`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request never reached the server or no response came back
    NetworkFailure,
    /// Server-side rejection of the submitted record
    ValidationFailure,
    /// Entity id does not exist
    NotFound,
    /// Any other non-2xx response or unreadable body
    Unknown,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::NetworkFailure => write!(f, "NETWORK_FAILURE"),
            ErrorCode::ValidationFailure => write!(f, "VALIDATION_FAILURE"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Field-level violation reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    #[serde(default)]
    pub object_name: String,
    pub field: String,
    pub message: String,
}

/// Problem body returned by the backend on 4xx responses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProblemBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    field_errors: Vec<FieldError>,
}

/// Main error type for REST operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Network failure: {message}")]
    NetworkFailure { message: String },

    #[error("Validation failure: {title} ({message})")]
    ValidationFailure {
        title: String,
        message: String,
        field_errors: Vec<FieldError>,
    },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Unexpected response ({}): {message}", display_status(.status))]
    Unknown { status: Option<u16>, message: String },
}

fn display_status(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no status".to_string())
}

impl ClientError {
    /// Build a validation failure raised before anything is sent
    pub fn local_validation(title: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::ValidationFailure {
            title: title.into(),
            message: message.into(),
            field_errors: vec![],
        }
    }

    /// Classify a non-2xx response
    pub fn from_response(status: u16, resource: &str, body: &[u8]) -> Self {
        let problem: ProblemBody = serde_json::from_slice(body).unwrap_or_default();
        let text = || {
            problem
                .detail
                .clone()
                .or_else(|| problem.title.clone())
                .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
        };

        match status {
            400 => ClientError::ValidationFailure {
                title: problem
                    .title
                    .clone()
                    .unwrap_or_else(|| "Bad Request".to_string()),
                message: problem
                    .message
                    .clone()
                    .unwrap_or_else(|| "error.http.400".to_string()),
                field_errors: problem.field_errors.clone(),
            },
            404 => ClientError::NotFound {
                resource: resource.to_string(),
            },
            _ => ClientError::Unknown {
                status: Some(status),
                message: text(),
            },
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::NetworkFailure { .. } => ErrorCode::NetworkFailure,
            ClientError::ValidationFailure { .. } => ErrorCode::ValidationFailure,
            ClientError::NotFound { .. } => ErrorCode::NotFound,
            ClientError::Unknown { .. } => ErrorCode::Unknown,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ClientError::NetworkFailure { .. } => ErrorSeverity::Error,
            ClientError::ValidationFailure { .. } => ErrorSeverity::Warning,
            ClientError::NotFound { .. } => ErrorSeverity::Info,
            ClientError::Unknown { .. } => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            ClientError::NetworkFailure { .. } => {
                details = details.with_suggestion(
                    "Check that the REST backend is running and reachable.".to_string(),
                );
                details = details
                    .with_suggestion("Verify backend.base_url in the configuration.".to_string());
            }
            ClientError::ValidationFailure { field_errors, .. } => {
                for fe in field_errors {
                    details = details.with_suggestion(format!("{}: {}", fe.field, fe.message));
                }
            }
            ClientError::NotFound { resource } => {
                details = details.with_suggestion(format!(
                    "The record at '{}' may have been deleted; refresh the list.",
                    resource
                ));
            }
            ClientError::Unknown { .. } => {}
        }

        details
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Unknown {
            status: None,
            message: format!("invalid JSON: {}", error),
        }
    }
}

/// Result type with ClientError
pub type ClientResult<T> = Result<T, ClientError>;

/// Detailed error information for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            suggestions: vec![],
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Log a failed operation at a level matching its severity
pub fn log_failure(operation: &str, resource: &str, error: &ClientError) {
    match error.severity() {
        ErrorSeverity::Error => log::warn!(
            target: "finanalyst::client",
            "{} {} failed [{}]: {}",
            operation,
            resource,
            error.code(),
            error
        ),
        ErrorSeverity::Warning | ErrorSeverity::Info => log::debug!(
            target: "finanalyst::client",
            "{} {} rejected [{}]: {}",
            operation,
            resource,
            error.code(),
            error
        ),
    }
}

// ==================== Tests ====================
