use crate::types::ResponseMode;

/// Fixed text shown when a one-shot request fails at the transport layer.
pub const FAILED_FETCH_MESSAGE: &str = "Failed to fetch response. Please try again.";

/// Shown when the user submits nothing but whitespace.
pub const EMPTY_INPUT_MESSAGE: &str = "Please enter a valid payload.";

/// Every way a request can end without a complete answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("nothing to send")]
    EmptyInput,

    #[error("a request is already in flight")]
    Busy,

    #[error("no response received: {0}")]
    NoResponse(String),

    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("response truncated after {received} bytes: {reason}")]
    Truncated { received: usize, reason: String },

    #[error("could not read response body: {0}")]
    Decode(String),

    #[error("request cancelled")]
    Cancelled,
}

/// Coarse kind carried by the lifecycle once a request has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NoResponse,
    Rejected,
    Truncated,
    Decode,
}

impl QueryError {
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            QueryError::NoResponse(_) => Some(FailureKind::NoResponse),
            QueryError::Rejected { .. } => Some(FailureKind::Rejected),
            QueryError::Truncated { .. } => Some(FailureKind::Truncated),
            QueryError::Decode(_) => Some(FailureKind::Decode),
            QueryError::EmptyInput | QueryError::Busy | QueryError::Cancelled => None,
        }
    }

    /// Text for the error line under the input.
    pub fn user_message(&self, mode: ResponseMode) -> String {
        match self {
            QueryError::EmptyInput => EMPTY_INPUT_MESSAGE.to_string(),
            QueryError::Busy => "Please wait for the current response to finish.".to_string(),
            QueryError::Cancelled => "Response stopped.".to_string(),
            _ if mode == ResponseMode::Json => FAILED_FETCH_MESSAGE.to_string(),
            QueryError::NoResponse(_) => "No response received from the server.".to_string(),
            QueryError::Rejected { status, .. } => {
                format!("The server rejected the request (status {status}).")
            }
            QueryError::Truncated { .. } => {
                "The response was cut off before it finished.".to_string()
            }
            QueryError::Decode(_) => FAILED_FETCH_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            QueryError::Decode(err.to_string())
        } else {
            QueryError::NoResponse(err.to_string())
        }
    }
}

/// Raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?} ({expected})")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}
