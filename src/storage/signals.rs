use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Why a persisted pipeline or recipe set changed.
pub enum ChangeReason {
    /// Bundle import.
    Import,
    /// Insert or replace.
    Upsert,
    /// Removal of one entry.
    Delete,
    /// Whole-snapshot save.
    SaveAll,
    /// Recipe selection change.
    Select,
    /// Every recipe of one pipeline removed.
    DeleteAllForPipeline,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
/// Notification emitted after persisted pipelines or recipes are mutated.
pub enum PipelineStorageChange {
    /// User pipeline list changed.
    UserPipelines {
        /// Cause.
        reason: ChangeReason,
        /// Affected pipeline, when a single one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pipeline_id: Option<String>,
    },
    /// Recipe snapshot changed.
    Recipes {
        /// Cause.
        reason: ChangeReason,
        /// Affected pipeline, when a single one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pipeline_id: Option<String>,
        /// Affected recipe, when a single one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipe_id: Option<String>,
    },
}

/// Handle returned by [`StorageSignals::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&PipelineStorageChange) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

/// Pub/sub bus for [`PipelineStorageChange`]. Clones share subscribers.
#[derive(Clone, Default)]
pub struct StorageSignals {
    inner: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for StorageSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSignals")
            .field("listeners", &self.snapshot().len())
            .finish()
    }
}

impl StorageSignals {
    /// Bus without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PipelineStorageChange) + Send + Sync + 'static,
    {
        let mut reg = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        reg.next_id += 1;
        let id = SubscriptionId(reg.next_id);
        reg.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut reg = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        reg.listeners.retain(|(sid, _)| *sid != id);
    }

    /// Deliver `change` to a snapshot of the current listeners.
    ///
    /// A panicking listener is logged and skipped.
    pub fn emit(&self, change: &PipelineStorageChange) {
        for listener in self.snapshot() {
            if catch_unwind(AssertUnwindSafe(|| listener(change))).is_err() {
                tracing::warn!(?change, "storage change listener panicked");
            }
        }
    }

    fn snapshot(&self) -> Vec<Listener> {
        let reg = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        reg.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/signals.rs"]
mod tests;
