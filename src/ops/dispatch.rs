use std::{collections::BTreeMap, str::FromStr, sync::Arc};

use crate::{
    artifact::model::Artifact,
    foundation::error::{MillError, MillResult},
    tuning::{
        model::{EngineId, OpOverride, ParamMap},
        resolve::{TuningResolver, resolve_engine},
    },
};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
/// Typed id of every op the dispatcher can route. Doubles as the op's tuning component id.
pub enum DispatchOpId {
    /// `segmentation.resize`
    #[serde(rename = "segmentation.resize")]
    SegmentationResize,
    /// `segmentation.denoise`
    #[serde(rename = "segmentation.denoise")]
    SegmentationDenoise,
    /// `segmentation.color`
    #[serde(rename = "segmentation.color")]
    SegmentationColor,
    /// `segmentation.threshold`
    #[serde(rename = "segmentation.threshold")]
    SegmentationThreshold,
    /// `segmentation.morphology`
    #[serde(rename = "segmentation.morphology")]
    SegmentationMorphology,
    /// `edge.resize`
    #[serde(rename = "edge.resize")]
    EdgeResize,
    /// `edge.threshold`
    #[serde(rename = "edge.threshold")]
    EdgeThreshold,
    /// `edge.morphology`
    #[serde(rename = "edge.morphology")]
    EdgeMorphology,
    /// `edge.extract`
    #[serde(rename = "edge.extract")]
    EdgeExtract,
    /// `svg.create`
    #[serde(rename = "svg.create")]
    SvgCreate,
    /// `cleanup.removeSmallComponents`
    #[serde(rename = "cleanup.removeSmallComponents")]
    CleanupRemoveSmallComponents,
}

impl DispatchOpId {
    /// Every dispatch id, in catalogue order.
    pub const ALL: [DispatchOpId; 11] = [
        Self::SegmentationResize,
        Self::SegmentationDenoise,
        Self::SegmentationColor,
        Self::SegmentationThreshold,
        Self::SegmentationMorphology,
        Self::EdgeResize,
        Self::EdgeThreshold,
        Self::EdgeMorphology,
        Self::EdgeExtract,
        Self::SvgCreate,
        Self::CleanupRemoveSmallComponents,
    ];

    /// Dotted id, identical to the tuning component id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SegmentationResize => "segmentation.resize",
            Self::SegmentationDenoise => "segmentation.denoise",
            Self::SegmentationColor => "segmentation.color",
            Self::SegmentationThreshold => "segmentation.threshold",
            Self::SegmentationMorphology => "segmentation.morphology",
            Self::EdgeResize => "edge.resize",
            Self::EdgeThreshold => "edge.threshold",
            Self::EdgeMorphology => "edge.morphology",
            Self::EdgeExtract => "edge.extract",
            Self::SvgCreate => "svg.create",
            Self::CleanupRemoveSmallComponents => "cleanup.removeSmallComponents",
        }
    }
}

impl std::fmt::Display for DispatchOpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchOpId {
    type Err = MillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| MillError::definition(format!("unknown dispatch op id '{s}'")))
    }
}

/// Callable implementing one op for one engine.
pub type OpFn = Arc<dyn Fn(&Artifact, &ParamMap) -> MillResult<Artifact> + Send + Sync>;

/// Native and alternate-engine callables for one dispatch op.
#[derive(Clone)]
pub struct OpImpl {
    /// Pure-Rust implementation; always present and always usable.
    pub native: OpFn,
    /// Alternate (`opencv`) implementation.
    pub alternate: OpFn,
}

impl std::fmt::Debug for OpImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OpImpl { .. }")
    }
}

impl OpImpl {
    /// Build from two closures.
    pub fn new<N, A>(native: N, alternate: A) -> Self
    where
        N: Fn(&Artifact, &ParamMap) -> MillResult<Artifact> + Send + Sync + 'static,
        A: Fn(&Artifact, &ParamMap) -> MillResult<Artifact> + Send + Sync + 'static,
    {
        Self {
            native: Arc::new(native),
            alternate: Arc::new(alternate),
        }
    }

    fn for_engine(&self, engine: EngineId) -> &OpFn {
        match engine {
            EngineId::Native => &self.native,
            EngineId::Opencv => &self.alternate,
        }
    }
}

/// Implementation table keyed by dispatch id.
#[derive(Clone, Debug, Default)]
pub struct OpImplementations {
    table: BTreeMap<DispatchOpId, OpImpl>,
}

impl OpImplementations {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the implementation of `id`.
    pub fn insert(&mut self, id: DispatchOpId, imp: OpImpl) -> &mut Self {
        self.table.insert(id, imp);
        self
    }

    /// Implementation of `id`, if registered.
    pub fn get(&self, id: DispatchOpId) -> Option<&OpImpl> {
        self.table.get(&id)
    }

    /// Registered ids.
    pub fn ids(&self) -> impl Iterator<Item = DispatchOpId> + '_ {
        self.table.keys().copied()
    }
}

/// Engine selection and invocation for dispatch-kind ops.
#[derive(Clone, Debug)]
pub struct OpDispatcher {
    resolver: TuningResolver,
    impls: Arc<OpImplementations>,
}

impl OpDispatcher {
    /// Dispatcher resolving tuning through `resolver` and running `impls`.
    pub fn new(resolver: TuningResolver, impls: Arc<OpImplementations>) -> Self {
        Self { resolver, impls }
    }

    /// Tuning resolver shared with inline ops.
    pub fn resolver(&self) -> &TuningResolver {
        &self.resolver
    }

    /// Registered implementations.
    pub fn implementations(&self) -> &OpImplementations {
        &self.impls
    }

    /// Run one dispatch op on `input`.
    ///
    /// Tuning is resolved with the op's own id as component id. Instance params win per key; an
    /// instance engine policy other than `inherit` replaces the resolved one. Selecting the
    /// alternate engine while the runtime is not ready is not an error: the native
    /// implementation runs instead and a warning is logged.
    #[tracing::instrument(skip(self, input, override_), fields(input = %input.kind()))]
    pub fn run_op_core(
        &self,
        op: DispatchOpId,
        input: &Artifact,
        override_: Option<&OpOverride>,
    ) -> MillResult<Artifact> {
        let resolved = self.resolver.resolve(op.as_str())?;
        let mut params = resolved.params;
        let mut engine = resolved.engine;
        let mut fallback_reason = resolved.fallback_reason;

        if let Some(o) = override_ {
            params.extend(o.params.iter().map(|(k, v)| (k.clone(), v.clone())));
            if let Some(policy) = o.explicit_policy() {
                let comp = self.resolver.registry().require(op.as_str())?;
                let choice = resolve_engine(
                    &comp.node.implemented_engines,
                    policy,
                    self.resolver.availability(),
                );
                engine = choice.engine;
                fallback_reason = choice.fallback_reason;
            }
        }
        if let Some(reason) = &fallback_reason {
            tracing::debug!(%reason, "engine fallback");
        }

        let imp = self
            .impls
            .get(op)
            .ok_or_else(|| MillError::definition(format!("no implementation for op '{op}'")))?;

        if engine == EngineId::Opencv && !self.resolver.availability().alternate_engine_ready {
            tracing::warn!(op = %op, "alternate engine selected but not ready, running native");
            engine = EngineId::Native;
        }
        tracing::debug!(engine = %engine, "dispatch");
        (imp.for_engine(engine))(input, &params)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/dispatch.rs"]
mod tests;
