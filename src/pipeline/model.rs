use crate::{
    artifact::model::{Artifact, ArtifactType},
    ops::dispatch::{DispatchOpId, OpFn},
    tuning::model::OpOverride,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Declared input and output artifact types of an op.
pub struct OpIo {
    /// Type the op consumes.
    pub input: ArtifactType,
    /// Type the op produces.
    pub output: ArtifactType,
}

impl OpIo {
    /// Shorthand constructor.
    pub const fn new(input: ArtifactType, output: ArtifactType) -> Self {
        Self { input, output }
    }
}

impl std::fmt::Display for OpIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.input, self.output)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Display grouping of ops. Never used for legality checks.
pub enum OpGroup {
    /// Segmentation steps.
    Segmentation,
    /// Edge steps.
    Edge,
    /// Vector output.
    #[serde(rename = "SVG")]
    Svg,
    /// Mask cleanup.
    Cleanup,
    /// Pass-through helpers.
    Utility,
    /// Ops consuming image lists.
    #[serde(rename = "Multi-input")]
    MultiInput,
}

impl OpGroup {
    /// Label shown in listings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Segmentation => "Segmentation",
            Self::Edge => "Edge",
            Self::Svg => "SVG",
            Self::Cleanup => "Cleanup",
            Self::Utility => "Utility",
            Self::MultiInput => "Multi-input",
        }
    }
}

/// How an op executes.
#[derive(Clone)]
pub enum OpKind {
    /// Routed through the op dispatcher.
    Dispatch {
        /// Dispatcher op id.
        dispatch_id: DispatchOpId,
        /// Tuning component used for params and engine policy.
        tuning_id: String,
    },
    /// Runs an in-process transform.
    Inline {
        /// Transform called with the input and the merged params.
        run: OpFn,
        /// Tuning component providing base params; none means an empty map.
        tuning_id: Option<String>,
    },
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispatch {
                dispatch_id,
                tuning_id,
            } => f
                .debug_struct("Dispatch")
                .field("dispatch_id", dispatch_id)
                .field("tuning_id", tuning_id)
                .finish(),
            Self::Inline { tuning_id, .. } => f
                .debug_struct("Inline")
                .field("tuning_id", tuning_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Immutable description of one catalogue op.
#[derive(Clone, Debug)]
pub struct OpSpec {
    /// Stable id (`op.seg.threshold`).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Declared IO.
    pub io: OpIo,
    /// Execution strategy.
    pub kind: OpKind,
    /// Display group.
    pub group: OpGroup,
}

impl OpSpec {
    /// Tuning component governing this op, if any.
    pub fn tuning_id(&self) -> Option<&str> {
        match &self.kind {
            OpKind::Dispatch { tuning_id, .. } => Some(tuning_id),
            OpKind::Inline { tuning_id, .. } => tuning_id.as_deref(),
        }
    }

    /// `"dispatch"` or `"inline"`.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            OpKind::Dispatch { .. } => "dispatch",
            OpKind::Inline { .. } => "inline",
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// One step of a pipeline.
pub struct PipelineOpInstance {
    /// Unique within the owning pipeline.
    pub instance_id: String,
    /// Catalogue op id.
    pub op_id: String,
    /// `None` means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Per-instance engine policy and params.
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub override_: Option<OpOverride>,
}

impl PipelineOpInstance {
    /// Enabled instance with no override.
    pub fn new(instance_id: impl Into<String>, op_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            op_id: op_id.into(),
            enabled: Some(true),
            override_: None,
        }
    }

    /// Anything but an explicit `false` counts as enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A named linear workflow.
pub struct PipelineDef {
    /// Unique id; user pipelines shadow built-ins with the same id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The runner refuses pipelines with `implemented == false`.
    #[serde(default = "default_true")]
    pub implemented: bool,
    /// Steps in order.
    pub ops: Vec<PipelineOpInstance>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Sparse patch of one instance inside a recipe.
pub struct OpInstancePatch {
    /// Instance this patch applies to.
    pub instance_id: String,
    /// Replaces the instance's `enabled` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Merged over the instance override (params per key).
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub override_: Option<OpOverride>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Named sparse diff over a pipeline's instances.
pub struct PipelineRecipe {
    /// Unique within the pipeline.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Last write, milliseconds since the Unix epoch.
    pub updated_ts: i64,
    /// Patches keyed by instance id.
    pub ops: Vec<OpInstancePatch>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Outcome of a step or a run.
pub enum RunStatus {
    /// Succeeded.
    Ok,
    /// Failed.
    Error,
}

#[derive(Clone, Debug, PartialEq)]
/// Record of one executed (or refused) step.
pub struct OpRunResult {
    /// Instance id.
    pub instance_id: String,
    /// Catalogue op id.
    pub op_id: String,
    /// Op title.
    pub title: String,
    /// Declared IO.
    pub io: OpIo,
    /// Step outcome.
    pub status: RunStatus,
    /// Error text when `status == Error`.
    pub error: Option<String>,
    /// Output when `status == Ok`.
    pub output: Option<Artifact>,
}

#[derive(Clone, Debug, PartialEq)]
/// Result of a whole-pipeline run.
pub struct PipelineRunResult {
    /// Pipeline id.
    pub pipeline_id: String,
    /// Pipeline title.
    pub title: String,
    /// Aggregate outcome.
    pub status: RunStatus,
    /// Aggregate error text.
    pub error: Option<String>,
    /// Input the run started from.
    pub input: Artifact,
    /// Final artifact, only on success.
    pub output: Option<Artifact>,
    /// Per-step trail, in execution order.
    pub ops: Vec<OpRunResult>,
}

impl PipelineRunResult {
    /// `true` when the run succeeded.
    pub fn is_ok(&self) -> bool {
        self.status == RunStatus::Ok
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/model.rs"]
mod tests;
