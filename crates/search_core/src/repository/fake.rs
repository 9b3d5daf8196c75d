use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::RepositoryId,
    protocol::{SearchResponse, SearchResult},
};
use tracing::debug;

use super::SearchRepository;

pub const FAKE_TOTAL_COUNT: u64 = 42;
pub const FAKE_PAGE_SIZE: usize = 10;

const FAKE_LANGUAGES: [&str; 3] = ["Kotlin", "Rust", "Java"];

/// Offline repository producing the same results for the same query.
#[derive(Debug, Clone, Default)]
pub struct FakeRepository {
    latency: Duration,
}

impl FakeRepository {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn results_for(query: &str) -> Vec<SearchResult> {
        (0..FAKE_PAGE_SIZE)
            .map(|index| {
                let name = format!("{query}-{index}");
                SearchResult {
                    id: Some(RepositoryId(index as i64 + 1)),
                    full_name: Some(format!("fake/{name}")),
                    name: Some(name),
                    private: Some(false),
                    description: Some(format!("Fake repository #{index} for \"{query}\"")),
                    updated_at: None,
                    size: Some((index as u64 + 1) * 128),
                    stargazers_count: Some((index * 7 + query.len()) as u64),
                    language: Some(FAKE_LANGUAGES[index % FAKE_LANGUAGES.len()].to_string()),
                    has_wiki: Some(index % 2 == 0),
                    archived: Some(false),
                    score: Some(1.0),
                }
            })
            .collect()
    }
}

#[async_trait]
impl SearchRepository for FakeRepository {
    async fn search(&self, query: &str) -> Result<SearchResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!(query, "serving fake search results");
        Ok(SearchResponse::new(
            Some(FAKE_TOTAL_COUNT),
            Some(Self::results_for(query)),
        ))
    }
}
