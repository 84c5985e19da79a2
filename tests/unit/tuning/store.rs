use super::*;
use crate::{
    storage::kv::MemoryStore,
    tuning::model::{EnginePolicy, ParamMap, ParamValue},
};

fn store() -> TuningStore {
    TuningStore::new(Arc::new(MemoryStore::new()))
}

fn params(pairs: &[(&str, f64)]) -> ParamMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), ParamValue::Number(*v)))
        .collect()
}

#[test]
fn empty_backend_loads_empty_snapshot() {
    assert!(store().load_all().is_empty());
}

#[test]
fn patches_merge_params_and_keep_policy_when_absent() {
    let s = store();
    s.set_component_config(
        "edge.threshold",
        ComponentConfig {
            engine_policy: Some(EnginePolicy::Native),
            params: params(&[("manualT", 90.0)]),
        },
    );
    s.set_component_config(
        "edge.threshold",
        ComponentConfig {
            engine_policy: None,
            params: params(&[("other", 1.0)]),
        },
    );

    let cfg = &s.load_all()["edge.threshold"];
    assert_eq!(cfg.engine_policy, Some(EnginePolicy::Native));
    assert_eq!(cfg.params, params(&[("manualT", 90.0), ("other", 1.0)]));
}

#[test]
fn reset_param_removes_entry_when_empty() {
    let s = store();
    s.set_component_config(
        "svg.create",
        ComponentConfig {
            engine_policy: None,
            params: params(&[("scale", 2.0)]),
        },
    );
    s.reset_param("svg.create", "scale");
    assert!(!s.load_all().contains_key("svg.create"));
}

#[test]
fn clear_drops_only_that_component() {
    let s = store();
    for id in ["a", "b"] {
        s.set_component_config(
            id,
            ComponentConfig {
                engine_policy: Some(EnginePolicy::Auto),
                params: ParamMap::new(),
            },
        );
    }
    s.clear_component_config("a");
    let all = s.load_all();
    assert!(!all.contains_key("a"));
    assert!(all.contains_key("b"));
}
