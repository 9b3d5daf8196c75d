use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{domain::RepositoryId, error::ProtocolError};

/// One repository hit. The remote source may omit any field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub id: Option<RepositoryId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub stargazers_count: Option<u64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub has_wiki: Option<bool>,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl SearchResult {
    /// Best available label: full name, then short name, then id.
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| self.id.map(|id| format!("#{id}")))
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// Body of a repository search. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub items: Option<Vec<SearchResult>>,
}

impl SearchResponse {
    pub fn new(total_count: Option<u64>, items: Option<Vec<SearchResult>>) -> Self {
        Self { total_count, items }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(bytes).map_err(ProtocolError::MalformedResponse)
    }
}
