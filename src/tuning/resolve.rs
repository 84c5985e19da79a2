use std::sync::Arc;

use crate::{
    foundation::error::MillResult,
    tuning::{
        model::{
            AvailabilityProbe, ComponentConfig, EngineId, EnginePolicy, ParamMap,
            ResolvedComponent, RuntimeAvailability, StoredConfigs,
        },
        registry::ComponentRegistry,
        store::TuningStore,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Engine selected for a policy, with the reason when a requested alternate was refused.
pub struct EngineChoice {
    /// Engine that will run.
    pub engine: EngineId,
    /// Human-readable fallback explanation.
    pub fallback_reason: Option<String>,
}

/// Walk from `id` towards the root until a concrete policy is found.
///
/// Stored overrides take precedence over node defaults at every level. If every level inherits,
/// the result is [`EnginePolicy::Native`].
pub fn resolve_policy(
    registry: &ComponentRegistry,
    stored: &StoredConfigs,
    id: &str,
) -> MillResult<EnginePolicy> {
    let mut cur = Some(id);
    while let Some(cid) = cur {
        let comp = registry.require(cid)?;
        let policy = stored
            .get(cid)
            .and_then(|c| c.engine_policy)
            .unwrap_or(comp.node.default_engine_policy);
        if policy != EnginePolicy::Inherit {
            return Ok(policy);
        }
        cur = comp.parent.as_deref();
    }
    Ok(EnginePolicy::Native)
}

/// Pick the engine for a concrete policy.
///
/// This is the only place engine fallback is decided; the resolver and the op dispatcher both
/// call it. `Inherit` reaching this point means "no override" and selects native.
pub fn resolve_engine(
    implemented: &[EngineId],
    policy: EnginePolicy,
    runtime: RuntimeAvailability,
) -> EngineChoice {
    let has_alternate = implemented.contains(&EngineId::Opencv);
    let alternate_usable = has_alternate && runtime.alternate_engine_ready;
    let native = |reason: Option<&str>| EngineChoice {
        engine: EngineId::Native,
        fallback_reason: reason.map(str::to_string),
    };

    match policy {
        EnginePolicy::Native | EnginePolicy::Inherit => native(None),
        EnginePolicy::Auto if alternate_usable => EngineChoice {
            engine: EngineId::Opencv,
            fallback_reason: None,
        },
        EnginePolicy::Auto => native(None),
        EnginePolicy::Opencv if alternate_usable => EngineChoice {
            engine: EngineId::Opencv,
            fallback_reason: None,
        },
        EnginePolicy::Opencv if !has_alternate => native(Some(
            "Policy=opencv, but component has no OpenCV implementation.",
        )),
        EnginePolicy::Opencv => native(Some(
            "Policy=opencv, but OpenCV is not available at runtime.",
        )),
    }
}

/// Effective policy, engine and params of one component.
pub fn resolve_component(
    registry: &ComponentRegistry,
    stored: &StoredConfigs,
    runtime: RuntimeAvailability,
    id: &str,
) -> MillResult<ResolvedComponent> {
    let comp = registry.require(id)?;
    let policy = resolve_policy(registry, stored, id)?;
    let choice = resolve_engine(&comp.node.implemented_engines, policy, runtime);

    let mut params: ParamMap = comp
        .node
        .params
        .iter()
        .map(|(k, schema)| (k.clone(), schema.default_value()))
        .collect();
    if let Some(cfg) = stored.get(id) {
        params.extend(cfg.params.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    Ok(ResolvedComponent {
        id: id.to_string(),
        policy,
        engine: choice.engine,
        fallback_reason: choice.fallback_reason,
        params,
    })
}

/// Provider of effective parameters for inline ops.
pub trait ParamSource: Send + Sync {
    /// Schema defaults overlaid with stored overrides for `tuning_id`.
    fn effective_params(&self, tuning_id: &str) -> MillResult<ParamMap>;
}

#[derive(Clone, Debug, PartialEq)]
/// One row of a tuning subtree listing.
pub struct TuningNodeView {
    /// Depth relative to the listed scope.
    pub depth: usize,
    /// Node title.
    pub title: String,
    /// Engines with code for the node.
    pub implemented_engines: Vec<EngineId>,
    /// Stored override, if any.
    pub stored: Option<ComponentConfig>,
    /// Effective resolution.
    pub resolved: ResolvedComponent,
}

/// Registry, persisted overrides and runtime availability bundled for resolution passes.
///
/// Stored overrides and availability are re-read on every call.
#[derive(Clone)]
pub struct TuningResolver {
    registry: Arc<ComponentRegistry>,
    store: TuningStore,
    probe: Arc<dyn AvailabilityProbe>,
}

impl std::fmt::Debug for TuningResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TuningResolver")
            .field("components", &self.registry.len())
            .field("runtime", &self.probe.availability())
            .finish()
    }
}

impl TuningResolver {
    /// Bundle the three inputs.
    pub fn new(
        registry: Arc<ComponentRegistry>,
        store: TuningStore,
        probe: Arc<dyn AvailabilityProbe>,
    ) -> Self {
        Self {
            registry,
            store,
            probe,
        }
    }

    /// Component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Override store.
    pub fn store(&self) -> &TuningStore {
        &self.store
    }

    /// Fresh availability snapshot.
    pub fn availability(&self) -> RuntimeAvailability {
        self.probe.availability()
    }

    /// Resolve one component against the current store and runtime.
    pub fn resolve(&self, id: &str) -> MillResult<ResolvedComponent> {
        let stored = self.store.load_all();
        resolve_component(&self.registry, &stored, self.availability(), id)
    }

    /// Pre-order listing of the subtree rooted at `scope_id`, resolved in one pass.
    pub fn describe(&self, scope_id: &str) -> MillResult<Vec<TuningNodeView>> {
        let stored = self.store.load_all();
        let runtime = self.availability();
        let base = self.registry.require(scope_id)?.depth;

        let mut out = Vec::new();
        let mut stack = vec![scope_id.to_string()];
        while let Some(id) = stack.pop() {
            let comp = self.registry.require(&id)?;
            out.push(TuningNodeView {
                depth: comp.depth - base,
                title: comp.node.title.clone(),
                implemented_engines: comp.node.implemented_engines.clone(),
                stored: stored.get(&id).cloned(),
                resolved: resolve_component(&self.registry, &stored, runtime, &id)?,
            });
            stack.extend(comp.node.children.iter().rev().map(|c| c.id.clone()));
        }
        Ok(out)
    }
}

impl ParamSource for TuningResolver {
    fn effective_params(&self, tuning_id: &str) -> MillResult<ParamMap> {
        Ok(self.resolve(tuning_id)?.params)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tuning/resolve.rs"]
mod tests;
