//! Selected-database state.
//!
//! The value starts at the configured default and changes only when `switch_database`
//! succeeds. Readers take one snapshot per tool call and use it for the whole call.
//!
//! Clones share the same value. Under the global scope every caller holds a clone of one
//! `SessionState`, so a `switch_database` racing with a data-touching call may or may not be
//! observed by it, and of two racing switches the last to commit wins. That is the legacy
//! contract. The per-session scope gives each MCP session its own value instead.

use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    selected: Arc<RwLock<Option<String>>>,
}

impl SessionState {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            selected: Arc::new(RwLock::new(initial)),
        }
    }

    /// Snapshot of the selected database.
    pub async fn current(&self) -> Option<String> {
        self.selected.read().await.clone()
    }

    /// Commit a new selection. Only call after the database has been probed.
    pub async fn select(&self, database: impl Into<String>) {
        *self.selected.write().await = Some(database.into());
    }

    /// Whether two handles share the same underlying value.
    pub fn shares_state_with(&self, other: &SessionState) -> bool {
        Arc::ptr_eq(&self.selected, &other.selected)
    }
}
