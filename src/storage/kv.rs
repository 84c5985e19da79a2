use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::foundation::error::{MillError, MillResult};

/// Key used for persisted tuning overrides.
pub const TUNING_KEY: &str = "rastermill.tuning.components.v1";
/// Key used for persisted recipes.
pub const RECIPES_KEY: &str = "rastermill.pipeline.recipes.v1";
/// Key used for persisted user pipelines.
pub const USER_PIPELINES_KEY: &str = "rastermill.pipeline.userPipelines.v1";

/// Host key-value persistence.
///
/// Both calls are fallible; callers go through [`read_or_default`] / [`write_best_effort`],
/// which treat failures as "no data" and "best effort".
pub trait KeyValueStore: Send + Sync {
    /// Fetch the requested keys. Missing keys are simply absent from the result.
    fn get(&self, keys: &[&str]) -> MillResult<BTreeMap<String, Value>>;

    /// Write all entries, replacing previous values.
    fn set(&self, entries: BTreeMap<String, Value>) -> MillResult<()>;
}

#[derive(Debug, Default)]
/// Process-local store.
pub struct MemoryStore {
    map: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, keys: &[&str]) -> MillResult<BTreeMap<String, Value>> {
        let map = self
            .map
            .lock()
            .map_err(|_| MillError::storage("memory store lock poisoned"))?;
        Ok(keys
            .iter()
            .filter_map(|k| map.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn set(&self, entries: BTreeMap<String, Value>) -> MillResult<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| MillError::storage("memory store lock poisoned"))?;
        map.extend(entries);
        Ok(())
    }
}

#[derive(Debug)]
/// Store backed by one JSON object on disk. Every write rewrites the whole file.
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    /// Store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> MillResult<serde_json::Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::Map::new());
            }
            Err(e) => {
                return Err(MillError::storage(format!(
                    "read '{}': {e}",
                    self.path.display()
                )));
            }
        };
        if text.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(MillError::storage(format!(
                "'{}' does not contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(MillError::storage(format!(
                "parse '{}': {e}",
                self.path.display()
            ))),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, keys: &[&str]) -> MillResult<BTreeMap<String, Value>> {
        let _g = self
            .guard
            .lock()
            .map_err(|_| MillError::storage("file store lock poisoned"))?;
        let all = self.read_all()?;
        Ok(keys
            .iter()
            .filter_map(|k| all.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn set(&self, entries: BTreeMap<String, Value>) -> MillResult<()> {
        let _g = self
            .guard
            .lock()
            .map_err(|_| MillError::storage("file store lock poisoned"))?;
        let mut all = self.read_all()?;
        all.extend(entries);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                MillError::storage(format!("create '{}': {e}", parent.display()))
            })?;
        }
        let text = serde_json::to_string_pretty(&Value::Object(all))?;
        fs::write(&self.path, text)
            .map_err(|e| MillError::storage(format!("write '{}': {e}", self.path.display())))
    }
}

/// Read and decode one key. Backend failures, absence and malformed data all yield `T::default()`.
pub fn read_or_default<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let mut found = match store.get(&[key]) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(key, error = %e, "store read failed; using defaults");
            return T::default();
        }
    };
    let Some(raw) = found.remove(key) else {
        return T::default();
    };
    match serde_json::from_value(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "stored value malformed; using defaults");
            T::default()
        }
    }
}

/// Encode and write one key, logging instead of failing.
pub fn write_best_effort<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let encoded = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "encode for store failed; write skipped");
            return;
        }
    };
    if let Err(e) = store.set(BTreeMap::from([(key.to_string(), encoded)])) {
        tracing::warn!(key, error = %e, "store write failed; continuing");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/kv.rs"]
mod tests;
