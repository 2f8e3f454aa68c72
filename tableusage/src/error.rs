use crate::{catalog, source};
use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("[Catalog]: {0}")]
    Catalog(#[from] catalog::error::Error),
    #[error("[Source]: {0}")]
    Source(#[from] source::Error),
    #[error("identifier filter is empty")]
    EmptyFilter,
    #[error("unknown identifier {0}")]
    UnknownIdentifier(String),
    #[error("invalid window: since {since} is not before {before}")]
    InvalidWindow {
        since: DateTime<Utc>,
        before: DateTime<Utc>,
    },
    #[error("[Timeout]: {0} took longer than {1}s")]
    Timeout(&'static str, u64),
    #[error("[Join]: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("[Config]: {0}")]
    Config(String),
    #[error("[IO]: {0}")]
    IO(#[from] std::io::Error),
    #[error("[Json]: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the run failed on caller input rather than on a collaborator.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::EmptyFilter
                | Error::UnknownIdentifier(_)
                | Error::Catalog(catalog::error::Error::InvalidIdentifier(_))
                | Error::InvalidWindow { .. }
        )
    }
}
