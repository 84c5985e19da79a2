use super::*;
use crate::{
    storage::kv::MemoryStore,
    tuning::model::{EnginePolicy, ParamValue},
};
use serde_json::json;

fn params(pairs: &[(&str, f64)]) -> crate::tuning::model::ParamMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), ParamValue::Number(*v)))
        .collect()
}

fn ops() -> Vec<PipelineOpInstance> {
    let mut a = PipelineOpInstance::new("p.1", "op.seg.resize");
    a.override_ = Some(OpOverride {
        engine_policy: Some(EnginePolicy::Native),
        params: params(&[("targetMaxW", 800.0), ("resizeAlgo", 0.0)]),
    });
    let b = PipelineOpInstance::new("p.2", "op.seg.threshold");
    vec![a, b]
}

fn recipe(id: &str, patches: Vec<OpInstancePatch>) -> PipelineRecipe {
    PipelineRecipe {
        id: id.to_string(),
        title: id.to_uppercase(),
        updated_ts: 0,
        ops: patches,
    }
}

#[test]
fn no_recipe_returns_equal_copies() {
    let base = ops();
    let out = apply_recipe_to_pipeline_ops(&base, None);
    assert_eq!(out, base);
}

#[test]
fn unpatched_instances_are_untouched() {
    let base = ops();
    let r = recipe(
        "r",
        vec![OpInstancePatch {
            instance_id: "p.2".into(),
            enabled: Some(false),
            override_: None,
        }],
    );
    let out = apply_recipe_to_pipeline_ops(&base, Some(&r));
    assert_eq!(out[0], base[0]);
    assert_eq!(out[1].enabled, Some(false));
    assert_eq!(out[1].override_, None);
}

#[test]
fn override_merges_in_two_levels() {
    let base = ops();
    let r = recipe(
        "r",
        vec![OpInstancePatch {
            instance_id: "p.1".into(),
            enabled: None,
            override_: Some(OpOverride {
                engine_policy: None,
                params: params(&[("targetMaxW", 400.0)]),
            }),
        }],
    );
    let out = apply_recipe_to_pipeline_ops(&base, Some(&r));
    let o = out[0].override_.as_ref().unwrap();
    assert_eq!(o.engine_policy, Some(EnginePolicy::Native));
    assert_eq!(o.params, params(&[("targetMaxW", 400.0), ("resizeAlgo", 0.0)]));
    assert_eq!(out[0].enabled, Some(true));
}

#[test]
fn deleting_selected_recipe_reselects_remaining() {
    let store = RecipeStore::new(Arc::new(MemoryStore::new()));
    let a = store.upsert_recipe("seg", recipe("a", Vec::new()));
    store.upsert_recipe("seg", recipe("b", Vec::new()));
    assert!(a.updated_ts > 0);
    assert_eq!(
        store.get_pipeline_recipe_state("seg").selected_recipe_id.as_deref(),
        Some("a")
    );

    store.delete_recipe("seg", "a");
    assert_eq!(
        store.get_pipeline_recipe_state("seg").selected_recipe_id.as_deref(),
        Some("b")
    );
    store.delete_recipe("seg", "b");
    assert_eq!(store.get_pipeline_recipe_state("seg").selected_recipe_id, None);
}

#[test]
fn dangling_selection_is_repaired_on_read() {
    let store = RecipeStore::new(Arc::new(MemoryStore::new()));
    store.upsert_recipe("seg", recipe("x", Vec::new()));
    store.set_selected_recipe("seg", "gone");
    let st = store.get_pipeline_recipe_state("seg");
    assert_eq!(st.selected_recipe_id.as_deref(), Some("x"));
    assert_eq!(st.selected().unwrap().title, "X");
}

#[test]
fn delete_all_for_pipeline_drops_state() {
    let store = RecipeStore::new(Arc::new(MemoryStore::new()));
    store.upsert_recipe("seg", recipe("x", Vec::new()));
    store.upsert_recipe("edge", recipe("y", Vec::new()));
    store.delete_all_for_pipeline("seg");
    let all = store.load_all();
    assert!(!all.contains_key("seg"));
    assert!(all.contains_key("edge"));
}

#[test]
fn bundles_are_sorted_and_tolerant() {
    let mut all = AllRecipes::new();
    all.insert("zeta".into(), PipelineRecipeState::default());
    let mut st = PipelineRecipeState::default();
    st.recipes_by_id.insert("r".into(), recipe("r", Vec::new()));
    st.selected_recipe_id = Some("r".into());
    all.insert("alpha".into(), st);

    let bundles = all_recipes_to_bundles(&all);
    assert_eq!(bundles[0].pipeline_id, "alpha");
    assert_eq!(bundles[1].pipeline_id, "zeta");
    let back = bundles_to_all_recipes(&serde_json::to_value(&bundles).unwrap());
    assert_eq!(back, all);

    let messy = json!([
        {"pipelineId": "", "recipes": []},
        7,
        {"pipelineId": "p", "selectedRecipeId": 3, "recipes": [
            {"id": "ok", "title": "Ok", "updatedTs": 1, "ops": []},
            {"id": "noTs", "title": "No", "ops": []},
            {"id": "", "title": "Empty", "updatedTs": 1, "ops": []},
            {"id": "noOps", "title": "No", "updatedTs": 1}
        ]},
        {"pipelineId": "q", "recipes": [{"id": "a", "title": "A", "updatedTs": 1, "ops": []}]},
        {"pipelineId": "q"}
    ]);
    let parsed = bundles_to_all_recipes(&messy);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed["p"].recipes_by_id.len(), 1);
    assert_eq!(parsed["p"].selected_recipe_id, None);
    assert!(parsed["q"].recipes_by_id.is_empty());
    assert!(bundles_to_all_recipes(&json!({"not": "array"})).is_empty());
}
