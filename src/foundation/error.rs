/// Convenience result type used across rastermill.
pub type MillResult<T> = Result<T, MillError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Expected pipeline failures (typing mismatches, failing steps) are reported as data in
/// [`crate::PipelineRunResult`]; this type is reserved for definition problems, malformed input
/// and backend failures.
#[derive(thiserror::Error, Debug)]
pub enum MillError {
    /// A pipeline, op or tuning component references something that does not exist, or the
    /// registry itself is malformed.
    #[error("definition error: {0}")]
    Definition(String),

    /// Invalid user-provided data (artifact buffers, imported files).
    #[error("validation error: {0}")]
    Validation(String),

    /// Failure raised while executing an op.
    #[error("execution error: {0}")]
    Execution(String),

    /// Key-value backend failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MillError {
    /// Build a [`MillError::Definition`] value.
    pub fn definition(msg: impl Into<String>) -> Self {
        Self::Definition(msg.into())
    }

    /// Build a [`MillError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MillError::Execution`] value.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Build a [`MillError::Storage`] value.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Build a [`MillError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Message without the taxonomy prefix, as shown in step results.
    pub fn message(&self) -> String {
        match self {
            Self::Definition(m)
            | Self::Validation(m)
            | Self::Execution(m)
            | Self::Storage(m)
            | Self::Serde(m) => m.clone(),
            Self::Other(e) => format!("{e:#}"),
        }
    }
}

impl From<serde_json::Error> for MillError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
