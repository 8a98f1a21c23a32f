use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkupError>;

#[derive(Debug, Error)]
pub enum LinkupError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Linkup API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited by Linkup")]
    RateLimited,

    #[error("Linkup rejected the API key: {0}")]
    Auth(String),
}

impl LinkupError {
    /// Transport failures and 5xx responses; worth one more attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
