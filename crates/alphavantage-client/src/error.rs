use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlphaVantageError {
    /// The upstream answered with an explicit `"Error Message"` payload.
    #[error("API error: {0}")]
    Upstream(String),

    /// Rate-limit or premium-endpoint notice in place of data.
    #[error("API information: {0}")]
    Notice(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, AlphaVantageError>;
