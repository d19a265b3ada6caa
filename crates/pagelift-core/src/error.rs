use thiserror::Error;

/// Why a strategy's payload was judged to be noise rather than page content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Payload at or below the strategy's minimum length.
    #[error("content too short ({len} chars, need more than {min})")]
    TooShort { len: usize, min: usize },

    /// Client-rendered application shell with no readable text.
    #[error("empty application shell: {0}")]
    SpaShell(String),

    /// Anti-automation interstitial instead of the page.
    #[error("bot wall detected: {0}")]
    BotWall(String),

    /// Accepted payload that renders to no Markdown at all.
    #[error("page rendered to an empty document")]
    EmptyBody,
}

/// Application-wide error types for pagelift.
#[derive(Error, Debug)]
pub enum AppError {
    /// The URL handed to the pipeline is not something we can scrape.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP request completed with a non-success status, or a proxied
    /// inner hop reported failure.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The archive has no snapshot of the requested page.
    #[error("No archived snapshot for {0}")]
    NoSnapshot(String),

    /// A strategy returned a payload that failed validation.
    #[error("Content rejected: {0}")]
    ContentRejected(#[from] Rejection),

    /// HTML-to-Markdown conversion failed.
    #[error("Cleaner error: {0}")]
    CleanerError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Every configured strategy failed or was rejected.
    #[error(
        "all {attempted} retrieval strategies failed for {url} \
         (proxies, reader service, cache and archive lookups)"
    )]
    Exhausted { url: String, attempted: usize },

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true for failures of the network exchange itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_)
                | AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::NoSnapshot(_)
                | AppError::SerializationError(_)
        )
    }

    /// Returns true if a validator rejected the payload.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AppError::ContentRejected(_))
    }

    /// Returns true for the terminal "nothing worked" failure.
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, AppError::Exhausted { .. })
    }
}
