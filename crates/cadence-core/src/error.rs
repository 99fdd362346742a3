//! Error types for cadence operations.
//!
//! Every failure the dashboard can hit (a topic reference without an id, an
//! HTTP failure from the scheduling service, a response that does not parse)
//! ends up as a [`CadenceError`]. The UI boundary only ever shows
//! [`CadenceError::user_message`]; the structured codes exist for logs and
//! tests.

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for cadence operations.
pub type CadenceResult<T> = Result<T, CadenceError>;

/// Main error type for all cadence operations.
#[derive(Error, Debug)]
pub enum CadenceError {
    /// A local precondition failed before any network call was made.
    #[error("Precondition failed: {message}")]
    Precondition { message: String, code: ErrorCode },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Topic not present in the local store.
    #[error("Topic not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        topic_id: Option<String>,
    },

    /// The scheduling service answered with a non-2xx status.
    #[error("Service error (HTTP {status}): {message}")]
    Service {
        status: u16,
        message: String,
        code: ErrorCode,
    },

    /// Network error.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The service answered 2xx but the body could not be understood.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Precondition (PRE_xxx)
    PreMissingTopicId,

    // Validation (VAL_xxx)
    ValInvalidPerformance,
    ValHierarchyConflict,

    // Topic (TOP_xxx)
    TopicNotFound,

    // Service (SVC_xxx)
    SvcBadRequest,
    SvcNotFound,
    SvcRejected,

    // Network (NET_xxx)
    NetTimeout,
    NetConnectionFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseMissingField,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::PreMissingTopicId => "PRE_001",
            ErrorCode::ValInvalidPerformance => "VAL_001",
            ErrorCode::ValHierarchyConflict => "VAL_002",
            ErrorCode::TopicNotFound => "TOP_001",
            ErrorCode::SvcBadRequest => "SVC_001",
            ErrorCode::SvcNotFound => "SVC_002",
            ErrorCode::SvcRejected => "SVC_003",
            ErrorCode::NetTimeout => "NET_001",
            ErrorCode::NetConnectionFailed => "NET_002",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseMissingField => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl CadenceError {
    /// Create a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
            code: ErrorCode::PreMissingTopicId,
        }
    }

    /// Create a not found error for a topic id.
    pub fn not_found(topic_id: impl Into<String>) -> Self {
        let id = topic_id.into();
        Self::NotFound {
            message: format!("Topic with id '{}' not found", id),
            code: ErrorCode::TopicNotFound,
            topic_id: Some(id),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            source: None,
        }
    }

    /// Create a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Create a malformed-response error for a required field the service left out.
    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            code: ErrorCode::ParseMissingField,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Precondition { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Service { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::MalformedResponse { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether the failure came from talking to the scheduling service.
    ///
    /// Malformed responses count as transport failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Service { .. } | Self::Network { .. } | Self::MalformedResponse { .. }
        )
    }

    /// The text shown in the dashboard's dismissable error banner.
    ///
    /// Service errors surface the server's `error` field verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Precondition { message, .. }
            | Self::Validation { message, .. }
            | Self::NotFound { message, .. }
            | Self::Service { message, .. }
            | Self::Network { message, .. }
            | Self::MalformedResponse { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Precondition { .. } => Some("Reload the topic list and try again"),
            Self::NotFound { .. } => Some("Refresh subjects to pick up server-side changes"),
            Self::Network { .. } => Some("Please check that the scheduling service is reachable"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }

    /// Convert from an HTTP status code and the message extracted from the body.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            400 | 422 => ErrorCode::SvcBadRequest,
            404 => ErrorCode::SvcNotFound,
            408 | 504 => ErrorCode::NetTimeout,
            _ => ErrorCode::SvcRejected,
        };
        Self::Service {
            status,
            message: message.into(),
            code,
        }
    }
}
