//! Single-slot state publication with replay-on-subscribe.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};
use tracing::{debug, warn};

use crate::state::ScreenState;

struct SlotInner {
    current: Option<ScreenState>,
    generation: u64,
}

/// The only writer-side view of the current state. Updates to `current` and the
/// broadcast happen under one lock so a new subscriber never sees a replayed state
/// after a newer live one.
pub(crate) struct StateSlot {
    inner: Mutex<SlotInner>,
    events: broadcast::Sender<ScreenState>,
}

impl StateSlot {
    pub(crate) fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Mutex::new(SlotInner {
                current: None,
                generation: 0,
            }),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(&self, inner: &mut SlotInner, state: ScreenState) {
        inner.current = Some(state.clone());
        // No receivers is fine: the slot still holds the value for later subscribers.
        let _ = self.events.send(state);
    }

    /// Publishes `Loading` and returns the generation token of the new search.
    pub(crate) fn begin_search(&self) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        self.replace(&mut inner, ScreenState::Loading);
        inner.generation
    }

    /// Publishes a terminal state. With `only_if_latest`, a state belonging to a
    /// superseded search is dropped and `false` is returned.
    pub(crate) fn settle(&self, generation: u64, state: ScreenState, only_if_latest: bool) -> bool {
        let mut inner = self.lock();
        if only_if_latest && inner.generation != generation {
            return false;
        }
        self.replace(&mut inner, state);
        true
    }

    pub(crate) fn current(&self) -> Option<ScreenState> {
        self.lock().current.clone()
    }

    pub(crate) fn subscribe(&self) -> StateSubscription {
        let inner = self.lock();
        StateSubscription {
            replay: inner.current.clone(),
            receiver: self.events.subscribe(),
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

/// A registered observer of [`ScreenState`] updates.
///
/// The first value yielded is the state that was current at subscription time, if
/// any; after that every published state follows in order. Dropping the
/// subscription (or calling [`StateSubscription::unsubscribe`]) stops delivery to
/// this observer only.
pub struct StateSubscription {
    replay: Option<ScreenState>,
    receiver: broadcast::Receiver<ScreenState>,
}

impl StateSubscription {
    /// Waits for the next state. Returns `None` once the controller and every
    /// in-flight search have gone away.
    pub async fn recv(&mut self) -> Option<ScreenState> {
        if let Some(state) = self.replay.take() {
            return Some(state);
        }
        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "state subscriber lagged; skipping to newer states");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<ScreenState> {
        if let Some(state) = self.replay.take() {
            return Some(state);
        }
        loop {
            match self.receiver.try_recv() {
                Ok(state) => return Some(state),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "state subscriber lagged; skipping to newer states");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Skips `Loading` and returns the next `Success` or `Error`.
    pub async fn next_terminal(&mut self) -> Option<ScreenState> {
        loop {
            let state = self.recv().await?;
            if state.is_terminal() {
                return Some(state);
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = ScreenState> + Send + 'static {
        let live = BroadcastStream::new(self.receiver).filter_map(|item| match item {
            Ok(state) => Some(state),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "state stream lagged; skipping to newer states");
                None
            }
        });
        tokio_stream::iter(self.replay).chain(live)
    }

    pub fn unsubscribe(self) {
        debug!("state subscriber removed");
    }
}
