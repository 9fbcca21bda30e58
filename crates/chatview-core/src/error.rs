use thiserror::Error;

pub use reqwest::StatusCode;

/// Failure of a single chat exchange
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request to chat endpoint failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode chat response: {0}")]
    Decode(#[from] serde_json::Error),
}
