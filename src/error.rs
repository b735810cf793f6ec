//! Client error types: transport failures, JSON-RPC errors from the agent,
//! and the typed disconnect signal the conversation driver recovers from.
//!
//! JSON-RPC error codes reported by agents are kept as constants; the
//! binaries label remote errors with [`A2AError::rpc_label`] on failure:
//! - Standard JSON-RPC 2.0 errors (-32700 through -32603)
//! - A2A-specific errors (-32001 through -32007)

use crate::types::JsonRpcError;

// ---------------------------------------------------------------------------
// Standard JSON-RPC 2.0 error codes
// ---------------------------------------------------------------------------

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i64 = -32700;

/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i64 = -32600;

/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

// ---------------------------------------------------------------------------
// A2A-specific error codes
// ---------------------------------------------------------------------------

/// The requested task was not found.
pub const TASK_NOT_FOUND: i64 = -32001;

/// The task cannot be canceled in its current state.
pub const TASK_NOT_CANCELABLE: i64 = -32002;

/// Push notifications are not supported by this agent.
pub const PUSH_NOTIFICATION_NOT_SUPPORTED: i64 = -32003;

/// The requested operation is not supported.
pub const UNSUPPORTED_OPERATION: i64 = -32004;

/// The content type is not supported.
pub const CONTENT_TYPE_NOT_SUPPORTED: i64 = -32005;

/// The agent returned an invalid response.
pub const INVALID_AGENT_RESPONSE: i64 = -32006;

/// Authenticated extended card is not configured.
pub const AUTHENTICATED_EXTENDED_CARD_NOT_CONFIGURED: i64 = -32007;

/// Returns a short label for a JSON-RPC error code, if the code is one the
/// protocol defines.
pub fn code_name(code: i64) -> Option<&'static str> {
    let name = match code {
        PARSE_ERROR => "parse error",
        INVALID_REQUEST => "invalid request",
        METHOD_NOT_FOUND => "method not found",
        INVALID_PARAMS => "invalid params",
        INTERNAL_ERROR => "internal error",
        TASK_NOT_FOUND => "task not found",
        TASK_NOT_CANCELABLE => "task not cancelable",
        PUSH_NOTIFICATION_NOT_SUPPORTED => "push notification not supported",
        UNSUPPORTED_OPERATION => "unsupported operation",
        CONTENT_TYPE_NOT_SUPPORTED => "content type not supported",
        INVALID_AGENT_RESPONSE => "invalid agent response",
        AUTHENTICATED_EXTENDED_CARD_NOT_CONFIGURED => "authenticated extended card not configured",
        _ => return None,
    };
    Some(name)
}

// ---------------------------------------------------------------------------
// A2AError enum
// ---------------------------------------------------------------------------

/// Unified error type for everything the client can fail on.
///
/// [`A2AError::Disconnected`] is the only variant the conversation driver
/// recovers from; every other variant aborts the current turn.
#[derive(Debug, Clone, thiserror::Error)]
pub enum A2AError {
    /// Transport-level error (connection failed, request failed, etc.).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// HTTP error with status code and response body.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Invalid JSON received from remote (parse or deserialization failure).
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// A JSON-RPC error response was received from the remote agent.
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Optional structured error data.
        data: Option<serde_json::Value>,
    },

    /// The agent's response stream ended before the exchange finished.
    #[error("Agent disconnected: {0}")]
    Disconnected(String),

    /// Local terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Convenience result type for client operations.
pub type A2AResult<T> = Result<T, A2AError>;

impl A2AError {
    /// Whether this error is the typed "remote went away mid-stream" signal.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, A2AError::Disconnected(_))
    }

    /// Protocol label for a [`A2AError::JsonRpc`] error, e.g. `"task not found"`.
    pub fn rpc_label(&self) -> Option<&'static str> {
        match self {
            A2AError::JsonRpc { code, .. } => code_name(*code),
            _ => None,
        }
    }
}

impl From<JsonRpcError> for A2AError {
    fn from(err: JsonRpcError) -> Self {
        A2AError::JsonRpc {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

impl From<serde_json::Error> for A2AError {
    fn from(err: serde_json::Error) -> Self {
        A2AError::InvalidJson(err.to_string())
    }
}

impl From<std::io::Error> for A2AError {
    fn from(err: std::io::Error) -> Self {
        A2AError::Io(err.to_string())
    }
}
