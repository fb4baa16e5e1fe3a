// src/services/search.rs

//! Home-view search overlay.
//!
//! Two dimensions: a free-text term that changes the server-side query
//! (and is debounced), and a resource-type filter applied locally to
//! whatever was fetched.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::{Resource, TypeFilter};

/// Columns the free-text term is matched against.
pub const SEARCH_COLUMNS: [&str; 4] = ["title", "subject", "course", "description"];

/// Current search inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    term: String,
    type_filter: TypeFilter,
}

impl SearchState {
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Trimmed term, or `None` when the recent listing should be shown.
    pub fn active_term(&self) -> Option<&str> {
        let term = self.term.trim();
        (!term.is_empty()).then_some(term)
    }

    pub fn set_term(&mut self, term: impl Into<String>) {
        self.term = term.into();
    }

    pub fn type_filter(&self) -> &TypeFilter {
        &self.type_filter
    }

    pub fn set_type_filter(&mut self, filter: TypeFilter) {
        self.type_filter = filter;
    }

    /// Resources passing the type filter, in fetched order.
    pub fn apply<'a>(&self, resources: &'a [Resource]) -> Vec<&'a Resource> {
        resources
            .iter()
            .filter(|r| self.type_filter.matches(r))
            .collect()
    }
}

/// Timer-guarded dispatch of search terms.
///
/// Each `input` restarts the timer; only a timer that runs out emits its
/// term on the channel returned by `new`.
pub struct Debouncer {
    delay: Duration,
    tx: mpsc::UnboundedSender<String>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// `input` spawns its timer, so it needs a tokio runtime; `new` does not.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            tx,
            pending: None,
        };
        (debouncer, rx)
    }

    /// Record a keystroke, cancelling any timer still running.
    pub fn input(&mut self, term: impl Into<String>) {
        self.cancel();

        let term = term.into();
        let delay = self.delay;
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the browser was dropped.
            let _ = tx.send(term);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a timer is still running.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
