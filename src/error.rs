//! Error taxonomy for everything that talks to a museum API.
//!
//! Adapters produce these errors, the [`Catalog`](crate::catalog::Catalog)
//! passes them through (or folds two of them into
//! [`FetchError::Aggregate`]), and the feed controller decides whether they
//! are fatal to a load or only worth a transient notice.
//!
//! The type is `Clone` so the controller can keep the error that put it into
//! the failed state while the UI renders it.

use thiserror::Error;

use crate::source::SourceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source needs an API key and none was configured.  No request was
    /// sent.
    #[error("{source_id}: no API key configured")]
    MissingCredential { source_id: SourceId },

    /// The upstream answered with a non-success HTTP status.
    #[error("{source_id}: upstream returned HTTP {status}")]
    Upstream { source_id: SourceId, status: u16 },

    /// A detail lookup for an id the upstream does not know.
    #[error("artwork {id} not found")]
    NotFound { id: String },

    /// A tagged id without a recognised `<source>-` prefix.
    #[error("invalid artwork id {id:?}")]
    InvalidId { id: String },

    /// Every source failed during an "all sources" fetch.
    #[error("all sources failed: {}", join_errors(.errors))]
    Aggregate { errors: Vec<FetchError> },

    /// The combined feed only has a first page.
    #[error("page {page} is not available when all sources are combined")]
    UnsupportedPage { page: u32 },

    /// Connection, TLS or timeout failure before a status was received.
    #[error("{source_id}: request failed: {message}")]
    Transport { source_id: SourceId, message: String },

    /// The body did not match the expected JSON shape.
    #[error("{source_id}: unexpected response: {message}")]
    Decode { source_id: SourceId, message: String },
}

impl FetchError {
    /// Whether trying the same request again might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Upstream { .. } | FetchError::Transport { .. } => true,
            FetchError::Aggregate { errors } => errors.iter().any(FetchError::is_retryable),
            FetchError::MissingCredential { .. }
            | FetchError::NotFound { .. }
            | FetchError::InvalidId { .. }
            | FetchError::UnsupportedPage { .. }
            | FetchError::Decode { .. } => false,
        }
    }

    pub(crate) fn transport(source_id: SourceId, err: reqwest::Error) -> Self {
        FetchError::Transport {
            source_id,
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(source_id: SourceId, err: impl std::fmt::Display) -> Self {
        FetchError::Decode {
            source_id,
            message: err.to_string(),
        }
    }
}

fn join_errors(errors: &[FetchError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type FetchResult<T> = Result<T, FetchError>;
