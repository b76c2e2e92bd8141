#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Playlist not found: {0}")]
    NotFound(String),
    #[error("Not a valid playlist reference: {0}")]
    InvalidReference(String),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Rate limited by destination: {0}")]
    RateLimit(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransferError>;
