use std::sync::{Arc, Mutex};

/// Structured metadata attached to a debug entry.
pub type LogMeta = serde_json::Map<String, serde_json::Value>;

/// Fire-and-forget diagnostics channel used by the runner and stores.
///
/// Implementations must never block pipeline execution and never fail.
pub trait DiagnosticsSink: Send + Sync {
    /// Record a debug entry with optional metadata.
    fn debug(&self, message: &str, meta: Option<&LogMeta>);

    /// Record a user-facing action line.
    fn action(&self, message: &str);
}

/// Sink that forwards every entry to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn debug(&self, message: &str, meta: Option<&LogMeta>) {
        match meta {
            Some(meta) => {
                let meta = serde_json::Value::Object(meta.clone());
                tracing::debug!(%meta, "{message}");
            }
            None => tracing::debug!("{message}"),
        }
    }

    fn action(&self, message: &str) {
        tracing::info!(target: "rastermill::action", "{message}");
    }
}

#[derive(Clone, Debug, PartialEq)]
/// One entry captured by [`RecordingSink`].
pub enum LogEntry {
    /// A debug line with its metadata (empty when none was given).
    Debug {
        /// Message text.
        message: String,
        /// Metadata object.
        meta: LogMeta,
    },
    /// An action line.
    Action(String),
}

/// In-memory sink, also forwarding to `tracing`.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, entry: LogEntry) {
        match self.entries.lock() {
            Ok(mut g) => g.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

impl DiagnosticsSink for RecordingSink {
    fn debug(&self, message: &str, meta: Option<&LogMeta>) {
        TracingSink.debug(message, meta);
        self.push(LogEntry::Debug {
            message: message.to_string(),
            meta: meta.cloned().unwrap_or_default(),
        });
    }

    fn action(&self, message: &str) {
        TracingSink.action(message);
        self.push(LogEntry::Action(message.to_string()));
    }
}

/// Build a [`LogMeta`] from key/value pairs.
pub fn meta<I, K>(pairs: I) -> LogMeta
where
    I: IntoIterator<Item = (K, serde_json::Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/log.rs"]
mod tests;
