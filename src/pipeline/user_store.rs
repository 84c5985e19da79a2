use std::sync::Arc;

use serde_json::Value;

use crate::{
    pipeline::model::PipelineDef,
    storage::kv::{KeyValueStore, USER_PIPELINES_KEY, read_or_default, write_best_effort},
};

/// Persisted user pipeline definitions, in insertion order.
#[derive(Clone)]
pub struct UserPipelineStore {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for UserPipelineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPipelineStore").finish_non_exhaustive()
    }
}

impl UserPipelineStore {
    /// Store over a key-value backend.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Stored pipelines. Entries without a string `id` or an `ops` array are skipped.
    pub fn load(&self) -> Vec<PipelineDef> {
        let raw: Vec<Value> = read_or_default(self.kv.as_ref(), USER_PIPELINES_KEY);
        raw.into_iter()
            .filter(|p| p.get("id").is_some_and(Value::is_string))
            .filter(|p| p.get("ops").is_some_and(Value::is_array))
            .filter_map(|p| match serde_json::from_value(p) {
                Ok(def) => Some(def),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed stored pipeline");
                    None
                }
            })
            .collect()
    }

    /// Replace the whole list.
    pub fn save(&self, next: &[PipelineDef]) {
        write_best_effort(self.kv.as_ref(), USER_PIPELINES_KEY, &next);
    }

    /// Replace the pipeline with the same id in place, or append.
    pub fn upsert(&self, pipeline: PipelineDef) {
        let mut all = self.load();
        match all.iter_mut().find(|p| p.id == pipeline.id) {
            Some(slot) => *slot = pipeline,
            None => all.push(pipeline),
        }
        self.save(&all);
    }

    /// Remove the pipeline with `id`, if stored.
    pub fn delete(&self, id: &str) {
        let mut all = self.load();
        all.retain(|p| p.id != id);
        self.save(&all);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/user_store.rs"]
mod tests;
