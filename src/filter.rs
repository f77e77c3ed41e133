//! Hashtag Filter State
//!
//! Session-wide hashtag selection plus the trending and all-known hashtag
//! lists it is chosen from. Every field is an observable `watch` cell, so
//! pollers can read the latest value at the start of each cycle and
//! supervisors can react to selection changes.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Shared hashtag filter
pub struct FilterState {
    selected: watch::Sender<Option<String>>,
    trending: watch::Sender<Vec<String>>,
    all: watch::Sender<Vec<String>>,
    /// Cleared once auto-selection has fired; re-armed by `clear`
    auto_select_armed: AtomicBool,
}

impl FilterState {
    pub fn new() -> Self {
        let (selected, _) = watch::channel(None);
        let (trending, _) = watch::channel(Vec::new());
        let (all, _) = watch::channel(Vec::new());

        Self {
            selected,
            trending,
            all,
            auto_select_armed: AtomicBool::new(true),
        }
    }

    /// Currently selected hashtag, if any
    pub fn selected(&self) -> Option<String> {
        self.selected.borrow().clone()
    }

    pub fn trending(&self) -> Vec<String> {
        self.trending.borrow().clone()
    }

    pub fn all(&self) -> Vec<String> {
        self.all.borrow().clone()
    }

    pub fn subscribe_selected(&self) -> watch::Receiver<Option<String>> {
        self.selected.subscribe()
    }

    pub fn subscribe_trending(&self) -> watch::Receiver<Vec<String>> {
        self.trending.subscribe()
    }

    pub fn subscribe_all(&self) -> watch::Receiver<Vec<String>> {
        self.all.subscribe()
    }

    /// Select a hashtag. A leading `#` is stripped.
    ///
    /// Returns `true` if the selection changed. Re-selecting the current tag
    /// is valid but does not notify subscribers.
    pub fn select(&self, tag: &str) -> bool {
        let tag = tag.trim().trim_start_matches('#');
        if tag.is_empty() {
            tracing::debug!("Ignoring empty hashtag selection");
            return false;
        }

        let changed = self.selected.send_if_modified(|current| {
            if current.as_deref() == Some(tag) {
                false
            } else {
                *current = Some(tag.to_string());
                true
            }
        });

        if changed {
            tracing::info!(hashtag = %tag, "Hashtag selected");
        }
        changed
    }

    /// Drop the selection and re-arm auto-selection
    pub fn clear(&self) {
        self.selected.send_if_modified(|current| current.take().is_some());
        self.auto_select_armed.store(true, Ordering::SeqCst);
    }

    /// Replace the trending list wholesale
    ///
    /// The first time it becomes non-empty with nothing selected, its first
    /// entry is selected.
    pub fn set_trending(&self, tags: Vec<String>) {
        let first = tags.first().cloned();
        self.trending.send_replace(tags);

        let Some(first) = first else {
            return;
        };

        let auto_selected = self.selected.send_if_modified(|current| {
            if current.is_none() && self.auto_select_armed.swap(false, Ordering::SeqCst) {
                *current = Some(first.clone());
                true
            } else {
                false
            }
        });

        if auto_selected {
            tracing::info!(hashtag = %first, "Auto-selected first trending hashtag");
        }
    }

    /// Replace the all-known list wholesale
    pub fn set_all(&self, tags: Vec<String>) {
        self.all.send_replace(tags);
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}
