//! Error types shared across the crate.
//!
//! Each collaborator gets its own error enum; the crate-level [`Error`]
//! wraps them so module boundaries can use one `Result` alias. Nothing in
//! the request path is fatal — handler code logs and degrades instead of
//! propagating, so these mostly surface at startup and in logs.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telegram(#[from] TelegramError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Startup configuration failures. All of these abort the process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("PORT value {0:?} is not a valid port number")]
    InvalidPort(String),
}

/// Failures talking to the Telegram Bot API.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("telegram rejected the request: {description}")]
    Rejected { description: String },
}

/// Failures of the script-generation service.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("generation service returned no completion text")]
    EmptyCompletion,
}
