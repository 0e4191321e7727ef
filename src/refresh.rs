//! Per-screen load state with stale-response suppression.
//!
//! A screen that refetches (because the period or a selected category
//! changed) takes a new [`Ticket`] for every request. When responses come
//! back out of order, only the one carrying the latest ticket is applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Identifies one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct RefreshTracker {
    latest: AtomicU64,
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; every earlier ticket becomes stale.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState<T> {
    Loading,
    Ready(T),
    Errored(String),
}

impl<T> ScreenState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// A tracker plus the state it guards.
#[derive(Debug)]
pub struct Screen<T> {
    tracker: RefreshTracker,
    state: RwLock<ScreenState<T>>,
}

impl<T> Default for Screen<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Screen<T> {
    pub fn new() -> Self {
        Self {
            tracker: RefreshTracker::new(),
            state: RwLock::new(ScreenState::Loading),
        }
    }

    /// Enter `Loading` and hand out the ticket the response must present.
    pub fn begin(&self) -> Ticket {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        // Issued under the write lock so ticket order matches the order of Loading writes.
        let ticket = self.tracker.issue();
        *state = ScreenState::Loading;
        ticket
    }

    /// Apply the outcome of the request identified by `ticket`.
    ///
    /// Returns `false`, leaving the state untouched, when a newer request
    /// was started in the meantime.
    pub fn resolve<E: std::fmt::Display>(&self, ticket: Ticket, outcome: Result<T, E>) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        // Checked under the write lock so a concurrent begin() cannot slip in between.
        if !self.tracker.is_current(ticket) {
            tracing::debug!(?ticket, "Discarding stale response");
            return false;
        }
        *state = match outcome {
            Ok(value) => ScreenState::Ready(value),
            Err(e) => {
                tracing::warn!(?ticket, error = %e, "Screen refresh failed");
                ScreenState::Errored(e.to_string())
            }
        };
        true
    }
}

impl<T: Clone> Screen<T> {
    pub fn state(&self) -> ScreenState<T> {
        self.state
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}
