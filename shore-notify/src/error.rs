use thiserror::Error;

/// Failure contained to one sink delivery attempt. Never propagates past the
/// dispatcher (§4.6, §7) — callers log it and move on to the next endpoint.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("endpoint missing required field `{0}`")]
    MissingField(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("non-success response: status {status}, body {body}")]
    NonSuccessStatus { status: u16, body: String },
}

impl From<reqwest::Error> for SinkError {
    fn from(e: reqwest::Error) -> Self {
        SinkError::Transport(e.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for SinkError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        SinkError::Transport(e.to_string())
    }
}

impl From<lettre::error::Error> for SinkError {
    fn from(e: lettre::error::Error) -> Self {
        SinkError::Transport(e.to_string())
    }
}

