//! The search collaborator the controller depends on, plus the concrete
//! backends the binaries pick from.

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use shared::protocol::SearchResponse;

use crate::error::RepositoryError;

mod fake;
mod github;

pub use fake::{FakeRepository, FAKE_PAGE_SIZE, FAKE_TOTAL_COUNT};
pub use github::{GitHubRepository, DEFAULT_API_BASE_URL, DEFAULT_USER_AGENT};

/// Remote search operation. May suspend, may run on another worker thread, and
/// may fail instead of returning a response.
#[async_trait]
pub trait SearchRepository: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryKind {
    #[default]
    #[serde(rename = "github")]
    GitHub,
    Fake,
}

impl FromStr for RepositoryKind {
    type Err = RepositoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "fake" => Ok(Self::Fake),
            other => Err(RepositoryError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => f.write_str("github"),
            Self::Fake => f.write_str("fake"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub kind: RepositoryKind,
    pub api_base_url: String,
    pub user_agent: String,
    pub fake_latency: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            kind: RepositoryKind::default(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            fake_latency: Duration::ZERO,
        }
    }
}

pub fn build_repository(
    config: &RepositoryConfig,
) -> Result<Arc<dyn SearchRepository>, RepositoryError> {
    let repository: Arc<dyn SearchRepository> = match config.kind {
        RepositoryKind::GitHub => Arc::new(GitHubRepository::new(
            &config.api_base_url,
            &config.user_agent,
        )?),
        RepositoryKind::Fake => Arc::new(FakeRepository::new(config.fake_latency)),
    };
    Ok(repository)
}
