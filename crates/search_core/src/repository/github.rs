use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use shared::{error::GitHubErrorBody, protocol::SearchResponse};
use tracing::debug;
use url::Url;

use super::SearchRepository;
use crate::error::RepositoryError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("search_core/", env!("CARGO_PKG_VERSION"));

const GITHUB_JSON: &str = "application/vnd.github+json";

/// Repository search against the GitHub REST API (`/search/repositories`).
pub struct GitHubRepository {
    http: Client,
    search_url: Url,
}

impl GitHubRepository {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, RepositoryError> {
        let mut base = Url::parse(base_url.trim()).map_err(|source| {
            RepositoryError::InvalidBaseUrl {
                url: base_url.to_string(),
                source,
            }
        })?;
        // Keep any path prefix (e.g. enterprise `/api/v3`) when joining.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let search_url =
            base.join("search/repositories")
                .map_err(|source| RepositoryError::InvalidBaseUrl {
                    url: base_url.to_string(),
                    source,
                })?;
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(RepositoryError::ClientBuild)?;
        Ok(Self { http, search_url })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    pub async fn fetch(&self, query: &str) -> Result<SearchResponse, RepositoryError> {
        debug!(url = %self.search_url, query, "requesting github search");
        let res = self
            .http
            .get(self.search_url.clone())
            .query(&[("q", query)])
            .header(ACCEPT, GITHUB_JSON)
            .send()
            .await?;
        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            let message = match GitHubErrorBody::from_json(&body) {
                Ok(error_body) => error_body.message,
                Err(_) => String::from_utf8_lossy(&body).trim().to_string(),
            };
            return Err(RepositoryError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(SearchResponse::from_json(&body)?)
    }
}

#[async_trait]
impl SearchRepository for GitHubRepository {
    async fn search(&self, query: &str) -> Result<SearchResponse> {
        Ok(self.fetch(query).await?)
    }
}

#[cfg(test)]
#[path = "tests/github_tests.rs"]
mod tests;
