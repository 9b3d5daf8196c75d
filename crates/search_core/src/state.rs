//! What the view layer should currently show.

use shared::protocol::{SearchResponse, SearchResult};

/// Published when a search completes without results or without a total count.
pub const INCOMPLETE_RESPONSE_MESSAGE: &str = "Search results or total count are null";
/// Published when a failed search carries no description of its own.
pub const FAILURE_FALLBACK_MESSAGE: &str = "Response are null";

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState {
    Loading,
    Success {
        results: Vec<SearchResult>,
        total_count: u64,
    },
    Error {
        message: String,
    },
}

impl ScreenState {
    /// `Success` only when both fields came back; anything else is an `Error`.
    pub fn from_response(response: SearchResponse) -> Self {
        match (response.items, response.total_count) {
            (Some(results), Some(total_count)) => Self::Success {
                results,
                total_count,
            },
            _ => Self::error(INCOMPLETE_RESPONSE_MESSAGE),
        }
    }

    pub fn from_failure(description: impl Into<String>) -> Self {
        let description = description.into();
        if description.is_empty() {
            Self::error(FAILURE_FALLBACK_MESSAGE)
        } else {
            Self::error(description)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }
}
