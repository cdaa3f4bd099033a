//! Error types for the seomagic domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; [`ErrorKind`] is the closed
//! taxonomy every failure is classified into.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed error taxonomy.
///
/// Tool-level kinds (`SchemaError`, `UnknownTool`, `RequestError`, `ApiError`,
/// `NoData`) are folded back into the conversation as tool results. The rest
/// abort the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid or missing tool argument. Never reaches the remote API.
    SchemaError,
    /// Tool name not present in the catalog.
    UnknownTool,
    /// Transport or parse failure while calling the remote task API.
    RequestError,
    /// The remote task API answered with a non-zero `err` field.
    ApiError,
    /// Task result empty, still pending, or erroneous.
    NoData,
    /// The conversational model call failed.
    ModelServiceError,
    /// Unexpected failure inside this process.
    InternalError,
    /// The agent loop exceeded its tool-use cycle budget.
    IterationLimit,
    /// The request-level deadline elapsed.
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaError => "schema_error",
            Self::UnknownTool => "unknown_tool",
            Self::RequestError => "request_error",
            Self::ApiError => "api_error",
            Self::NoData => "no_data",
            Self::ModelServiceError => "model_service_error",
            Self::InternalError => "internal_error",
            Self::IterationLimit => "iteration_limit",
            Self::Timeout => "timeout",
        }
    }

    /// Whether errors of this kind are handed back to the model instead of
    /// aborting the request.
    pub fn is_tool_level(&self) -> bool {
        matches!(
            self,
            Self::SchemaError | Self::UnknownTool | Self::RequestError | Self::ApiError | Self::NoData
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The top-level error type for request-level failures.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model service errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Conversation store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Agent loop guards ---
    #[error("Tool-use cycle limit of {max} exceeded")]
    IterationLimit { max: u32 },

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify this error into the taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Provider(_) => ErrorKind::ModelServiceError,
            Self::IterationLimit { .. } => ErrorKind::IterationLimit,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Store(_) | Self::Config { .. } | Self::Serialization(_) | Self::Internal(_) => {
                ErrorKind::InternalError
            }
        }
    }

    /// A short description safe to show to an end user.
    pub fn public_message(&self) -> String {
        match self {
            Self::Provider(e) => format!("AI service error: {}", e.short()),
            Self::IterationLimit { max } => {
                format!("Stopped after {max} tool-use cycles without a final answer")
            }
            Self::Timeout { secs } => format!("Request timed out after {secs}s"),
            Self::Config { message } => format!("Configuration error: {message}"),
            Self::Store(_) | Self::Serialization(_) | Self::Internal(_) => {
                "Internal error".to_string()
            }
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// One-line summary without response bodies.
    pub fn short(&self) -> String {
        match self {
            Self::ApiError { status_code, .. } => format!("upstream returned status {status_code}"),
            Self::RateLimited { .. } => "rate limited".into(),
            Self::AuthenticationFailed(_) => "authentication failed".into(),
            Self::NotConfigured(what) => format!("{what} not configured"),
            Self::Network(_) => "network failure".into(),
            Self::MalformedResponse(_) => "malformed response".into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// A tool-level failure. Rendered back to the model as tool-result content.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaError, message)
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorKind::UnknownTool, format!("Unknown tool: {name}"))
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestError, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoData, message)
    }

    /// The wire shape the remote API itself uses for errors.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "err": self.kind.as_str(),
            "errtxt": self.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
        assert_eq!(err.kind(), ErrorKind::ModelServiceError);
    }

    #[test]
    fn public_message_hides_upstream_body() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 500,
            message: "{\"trace\":\"secret stack\"}".into(),
        });
        let msg = err.public_message();
        assert!(msg.contains("500"));
        assert!(!msg.contains("secret stack"));

        let internal = Error::Internal("panicked at src/lib.rs:12".into());
        assert_eq!(internal.public_message(), "Internal error");
        assert_eq!(internal.kind(), ErrorKind::InternalError);
    }

    #[test]
    fn tool_error_renders_remote_shape() {
        let err = ToolError::schema("missing field 'queries'");
        let json = err.to_json();
        assert_eq!(json["err"], "schema_error");
        assert_eq!(json["errtxt"], "missing field 'queries'");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ModelServiceError).unwrap();
        assert_eq!(json, "\"model_service_error\"");
        assert!(ErrorKind::NoData.is_tool_level());
        assert!(!ErrorKind::IterationLimit.is_tool_level());
    }
}
