use std::sync::{Arc, Mutex};

use crate::artifact::model::Artifact;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Current value of a [`LastArtifactChannel`].
pub enum LastArtifact {
    /// Nothing has been published yet (or the channel was cleared).
    #[default]
    None,
    /// Most recent artifact and the pipeline that produced it.
    Published {
        /// Producing pipeline id.
        source: String,
        /// Published artifact.
        artifact: Artifact,
    },
}

impl LastArtifact {
    /// Borrow the artifact if one was published.
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::None => None,
            Self::Published { artifact, .. } => Some(artifact),
        }
    }
}

/// Typed hand-off of the latest pipeline output between independent consumers.
///
/// Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct LastArtifactChannel {
    slot: Arc<Mutex<LastArtifact>>,
}

impl LastArtifactChannel {
    /// Empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current value.
    pub fn publish(&self, source: impl Into<String>, artifact: Artifact) {
        let source = source.into();
        tracing::debug!(%source, kind = %artifact.kind(), "last artifact published");
        self.replace(LastArtifact::Published { source, artifact });
    }

    /// Reset to [`LastArtifact::None`].
    pub fn clear(&self) {
        self.replace(LastArtifact::None);
    }

    /// Snapshot of the current value.
    pub fn subscribe(&self) -> LastArtifact {
        match self.slot.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, value: LastArtifact) {
        match self.slot.lock() {
            Ok(mut g) => *g = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/artifact/channel.rs"]
mod tests;
