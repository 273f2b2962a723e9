use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatesError {
    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("http error: {status}")]
    Http { status: reqwest::StatusCode },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid or unexpected response format")]
    InvalidResponse,

    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
