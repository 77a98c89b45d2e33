//! In-flight request bookkeeping and cancellation.
//!
//! # Design
//! Every dispatch registers a [`CancellationToken`] for its lifetime through
//! an [`InFlight`] guard that removes it again on drop. Non-upload requests
//! also become the *current* request, replacing whatever was tracked before;
//! `cancel_current` consumes that slot. Uploads are never tracked as current,
//! so they can only be stopped with `cancel_all` or their own handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Process-unique identifier of a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to one dispatched request.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    id: RequestId,
    token: CancellationToken,
}

impl RequestHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Request cancellation. The request completes with
    /// [`crate::ApiError::Cancelled`] unless it already finished.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    in_flight: HashMap<RequestId, CancellationToken>,
    current: Option<RequestHandle>,
}

/// Shared registry of requests in flight.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request. With `track_current` it replaces the current
    /// request slot.
    pub fn register(&self, track_current: bool) -> InFlight {
        let handle = RequestHandle { id: RequestId::next(), token: CancellationToken::new() };
        let mut state = self.state.lock();
        state.in_flight.insert(handle.id, handle.token.clone());
        if track_current {
            state.current = Some(handle.clone());
        }
        InFlight { tracker: self.clone(), handle }
    }

    /// Cancel and forget the current request. Returns whether there was one.
    pub fn cancel_current(&self) -> bool {
        let current = self.state.lock().current.take();
        match current {
            Some(handle) => {
                debug!(id = %handle.id, "cancelling current request");
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every request in flight, uploads included. Returns how many
    /// were signalled.
    pub fn cancel_all(&self) -> usize {
        let tokens: Vec<CancellationToken> = {
            let mut state = self.state.lock();
            state.current = None;
            state.in_flight.values().cloned().collect()
        };
        debug!(count = tokens.len(), "cancelling all requests");
        for token in &tokens {
            token.cancel();
        }
        tokens.len()
    }

    pub fn current(&self) -> Option<RequestHandle> {
        self.state.lock().current.clone()
    }

    pub fn in_flight_count(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    fn finish(&self, id: RequestId) {
        let mut state = self.state.lock();
        state.in_flight.remove(&id);
        if state.current.as_ref().is_some_and(|h| h.id == id) {
            state.current = None;
        }
    }
}

/// Registration guard; deregisters the request when dropped.
#[derive(Debug)]
pub struct InFlight {
    tracker: RequestTracker,
    handle: RequestHandle,
}

impl InFlight {
    pub fn handle(&self) -> &RequestHandle {
        &self.handle
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.tracker.finish(self.handle.id);
    }
}
