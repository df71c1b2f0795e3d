//! Navigation abstraction over the host UI's router.
//!
//! The core never drives a screen directly; it asks a `Navigator` where it
//! is and where to go. The UI layer supplies the real implementation, and
//! `HistoryNavigator` provides a stack-backed one for the CLI and tests.

use std::sync::Mutex;

use tracing::debug;

use crate::routes::{normalize_path, ROOT_PATH};

/// Where the UI currently is, and how to move it.
pub trait Navigator: Send + Sync {
    /// The path currently displayed.
    fn current_path(&self) -> String;

    /// Transition to `path`.
    fn push(&self, path: &str);
}

/// Navigator backed by an in-memory history stack. Starts at root.
pub struct HistoryNavigator {
    stack: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self {
            stack: Mutex::new(vec![ROOT_PATH.to_string()]),
        }
    }

    /// Full visit history, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.stack.lock().expect("navigator lock poisoned").clone()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.stack
            .lock()
            .expect("navigator lock poisoned")
            .last()
            .cloned()
            .unwrap_or_else(|| ROOT_PATH.to_string())
    }

    fn push(&self, path: &str) {
        let path = normalize_path(path);
        debug!(%path, "navigating");
        self.stack.lock().expect("navigator lock poisoned").push(path);
    }
}
