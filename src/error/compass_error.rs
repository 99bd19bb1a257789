use serde_json::{Map, Value};
use thiserror::Error;

/// Adapter-wide error type covering everything a send can fail with.
///
/// Transport-level causes are preserved as `anyhow::Error` sources so callers
/// can introspect the underlying failure, while API-level failures carry the
/// raw upstream response for diagnostics.
#[derive(Error, Debug)]
pub enum CompassError {
    /// Caller-fixable input error: missing routing target or credential fields
    #[error("{message}")]
    InvalidArgument { message: String },

    /// Upstream returned a non-"ok" envelope, or the upload handshake was
    /// incomplete (no upload URL, no file id)
    #[error("{message}")]
    Api {
        message: String,
        /// Numeric error code reported by the API, when present
        error_code: Option<i64>,
        /// Raw `response` object from the upstream body
        response: Map<String, Value>,
    },

    /// Network, timeout, HTTP status, or body-decode failure
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CompassError {
    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CompassError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an API error with the upstream diagnostics
    pub fn api(
        message: impl Into<String>,
        error_code: Option<i64>,
        response: Map<String, Value>,
    ) -> Self {
        CompassError::Api {
            message: message.into(),
            error_code,
            response,
        }
    }

    /// Create a transport error wrapping the underlying cause
    pub fn transport(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        CompassError::Transport {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Upstream numeric error code, absent on non-API errors
    pub fn error_code(&self) -> Option<i64> {
        match self {
            CompassError::Api { error_code, .. } => *error_code,
            _ => None,
        }
    }

    /// Raw upstream response object, absent on non-API errors
    pub fn response(&self) -> Option<&Map<String, Value>> {
        match self {
            CompassError::Api { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Type alias for Result with CompassError to simplify function signatures
pub type CompassResult<T> = Result<T, CompassError>;
