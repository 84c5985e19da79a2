use std::sync::Arc;

use crate::{
    storage::kv::{KeyValueStore, TUNING_KEY, read_or_default, write_best_effort},
    tuning::model::{ComponentConfig, StoredConfigs},
};

/// Persisted per-component tuning overrides.
///
/// Every mutation is a whole-snapshot read-modify-write; last writer wins.
#[derive(Clone)]
pub struct TuningStore {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for TuningStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TuningStore").finish_non_exhaustive()
    }
}

impl TuningStore {
    /// Store over a key-value backend.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Current snapshot; empty on any read failure.
    pub fn load_all(&self) -> StoredConfigs {
        read_or_default(self.kv.as_ref(), TUNING_KEY)
    }

    /// Replace the snapshot.
    pub fn save_all(&self, next: &StoredConfigs) {
        write_best_effort(self.kv.as_ref(), TUNING_KEY, next);
    }

    /// Merge `patch` into the stored config of `id`.
    ///
    /// A given policy replaces the stored one; params merge per key.
    pub fn set_component_config(&self, id: &str, patch: ComponentConfig) {
        let mut all = self.load_all();
        merge_config(all.entry(id.to_string()).or_default(), patch);
        self.save_all(&all);
    }

    /// Drop a single stored parameter; an entry left empty is removed.
    pub fn reset_param(&self, id: &str, key: &str) {
        let mut all = self.load_all();
        let Some(cfg) = all.get_mut(id) else {
            return;
        };
        if cfg.params.remove(key).is_none() {
            return;
        }
        if cfg.is_empty() {
            all.remove(id);
        }
        self.save_all(&all);
    }

    /// Remove every override for `id`.
    pub fn clear_component_config(&self, id: &str) {
        let mut all = self.load_all();
        if all.remove(id).is_some() {
            self.save_all(&all);
        }
    }
}

pub(crate) fn merge_config(target: &mut ComponentConfig, patch: ComponentConfig) {
    if patch.engine_policy.is_some() {
        target.engine_policy = patch.engine_policy;
    }
    target.params.extend(patch.params);
}

#[cfg(test)]
#[path = "../../tests/unit/tuning/store.rs"]
mod tests;
