use shared::error::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("search controller must be created inside a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("unknown response ordering '{0}' (expected 'completion_order' or 'submission_order')")]
    UnknownOrdering(String),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unknown repository kind '{0}' (expected 'github' or 'fake')")]
    UnknownKind(String),
    #[error("invalid search api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("GitHub search failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error(transparent)]
    Decode(#[from] ProtocolError),
}
