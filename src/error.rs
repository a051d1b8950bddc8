use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("a non-empty display name is required to reconcile bookings")]
    MissingIdentity,

    #[error("could not determine the active date: {0}")]
    AmbiguousDate(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("unknown sport: {0}")]
    UnknownSport(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        SyncError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
