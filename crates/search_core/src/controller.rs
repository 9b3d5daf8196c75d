//! Search request lifecycle.
//!
//! [`SearchController`] owns the current [`ScreenState`], runs each search on a
//! supervised child task and folds every outcome (complete, incomplete, failed or
//! panicked) into exactly one terminal state.

use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use serde::Deserialize;
use shared::protocol::SearchResponse;
use tokio::{runtime::Handle, task::JoinError};
use tracing::{debug, info, warn};

use crate::{
    error::ControllerError,
    repository::SearchRepository,
    state::ScreenState,
    subscription::{StateSlot, StateSubscription},
};

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// How terminal states of overlapping searches are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Every search publishes when it finishes. A slow earlier query can
    /// overwrite the result of a later one.
    #[default]
    CompletionOrder,
    /// Only the most recently submitted search may publish its terminal state.
    SubmissionOrder,
}

impl FromStr for ResponseOrdering {
    type Err = ControllerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "completion_order" | "completion" => Ok(Self::CompletionOrder),
            "submission_order" | "submission" => Ok(Self::SubmissionOrder),
            other => Err(ControllerError::UnknownOrdering(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub channel_capacity: usize,
    pub ordering: ResponseOrdering,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            ordering: ResponseOrdering::default(),
        }
    }
}

pub struct SearchController {
    repository: Arc<dyn SearchRepository>,
    slot: Arc<StateSlot>,
    in_flight: Arc<AtomicUsize>,
    ordering: ResponseOrdering,
    runtime: Handle,
}

impl SearchController {
    /// Builds a controller with default options on the ambient tokio runtime.
    pub fn new(repository: Arc<dyn SearchRepository>) -> Result<Self, ControllerError> {
        Ok(Self::with_options(
            repository,
            ControllerOptions::default(),
            Handle::try_current()?,
        ))
    }

    pub fn with_options(
        repository: Arc<dyn SearchRepository>,
        options: ControllerOptions,
        runtime: Handle,
    ) -> Self {
        Self {
            repository,
            slot: Arc::new(StateSlot::new(options.channel_capacity)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            ordering: options.ordering,
            runtime,
        }
    }

    /// Publishes `Loading`, then searches in the background. The outcome arrives
    /// through [`subscribe`](Self::subscribe); nothing is returned or raised here.
    pub fn submit_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let generation = self.slot.begin_search();
        info!(query = %query, generation, "search submitted");

        let repository = Arc::clone(&self.repository);
        let slot = Arc::clone(&self.slot);
        let in_flight = Arc::clone(&self.in_flight);
        let only_if_latest = self.ordering == ResponseOrdering::SubmissionOrder;
        let runtime = self.runtime.clone();

        self.runtime.spawn(async move {
            let child = runtime.spawn({
                let query = query.clone();
                async move { repository.search(&query).await }
            });
            let state = classify_outcome(child.await);

            match &state {
                ScreenState::Success { results, total_count } => info!(
                    query = %query,
                    generation,
                    total_count,
                    results = results.len(),
                    "search succeeded"
                ),
                ScreenState::Error { message } => {
                    warn!(query = %query, generation, message = %message, "search failed")
                }
                ScreenState::Loading => {}
            }

            if !slot.settle(generation, state, only_if_latest) {
                debug!(
                    query = %query,
                    generation,
                    "dropping result of superseded search"
                );
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    pub fn subscribe(&self) -> StateSubscription {
        self.slot.subscribe()
    }

    /// Most recently published state; `None` until the first query.
    pub fn current(&self) -> Option<ScreenState> {
        self.slot.current()
    }

    pub fn subscriber_count(&self) -> usize {
        self.slot.subscriber_count()
    }

    /// Searches submitted whose terminal state has not been settled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }
}

fn classify_outcome(outcome: Result<anyhow::Result<SearchResponse>, JoinError>) -> ScreenState {
    match outcome {
        Ok(Ok(response)) => ScreenState::from_response(response),
        Ok(Err(err)) => ScreenState::from_failure(err.to_string()),
        Err(err) => ScreenState::from_failure(describe_join_error(err)),
    }
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::new()
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
