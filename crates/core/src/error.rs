// Protocol error taxonomy shared by server and client

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Wire-stable error codes for the tool protocol.
///
/// Numeric values follow the JSON-RPC convention and cross the process
/// boundary as plain integers; they must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ToolNotFound,
    ToolExecutionError,
    PermissionDenied,
    RateLimitExceeded,
    ValidationError,
}

impl ErrorCode {
    /// The integer value used on the wire.
    pub const fn value(self) -> i32 {
        match self {
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ToolNotFound => -32000,
            Self::ToolExecutionError => -32001,
            Self::PermissionDenied => -32002,
            Self::RateLimitExceeded => -32003,
            Self::ValidationError => -32004,
        }
    }

    /// Decode a wire value back into the closed taxonomy.
    pub const fn from_value(code: i32) -> Option<Self> {
        match code {
            -32600 => Some(Self::InvalidRequest),
            -32601 => Some(Self::MethodNotFound),
            -32602 => Some(Self::InvalidParams),
            -32603 => Some(Self::InternalError),
            -32000 => Some(Self::ToolNotFound),
            -32001 => Some(Self::ToolExecutionError),
            -32002 => Some(Self::PermissionDenied),
            -32003 => Some(Self::RateLimitExceeded),
            -32004 => Some(Self::ValidationError),
            _ => None,
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.value())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i32::deserialize(deserializer)?;
        Self::from_value(code)
            .ok_or_else(|| de::Error::custom(format!("unknown error code: {}", code)))
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidRequest => "InvalidRequest",
            Self::MethodNotFound => "MethodNotFound",
            Self::InvalidParams => "InvalidParams",
            Self::InternalError => "InternalError",
            Self::ToolNotFound => "ToolNotFound",
            Self::ToolExecutionError => "ToolExecutionError",
            Self::PermissionDenied => "PermissionDenied",
            Self::RateLimitExceeded => "RateLimitExceeded",
            Self::ValidationError => "ValidationError",
        };
        write!(f, "{}", name)
    }
}

/// Protocol error carried across the wire as `{message, code}`.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct McpError {
    pub message: String,
    pub code: ErrorCode,
}

impl McpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Method not found: {}", method),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn tool_not_found(name: &str) -> Self {
        Self::new(ErrorCode::ToolNotFound, format!("Tool not found: {}", name))
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ToolExecutionError, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimitExceeded, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }
}
