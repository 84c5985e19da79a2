use std::{collections::BTreeMap, sync::Arc};

use serde_json::Value;

use crate::{
    pipeline::model::{OpInstancePatch, PipelineOpInstance, PipelineRecipe},
    storage::kv::{KeyValueStore, RECIPES_KEY, read_or_default, write_best_effort},
    tuning::model::OpOverride,
};

/// Overlay `recipe` on a pipeline's instances without touching the originals.
///
/// Instances without a patch are copied unchanged. A patch's boolean `enabled` wins. Overrides
/// merge in two levels: the patch's engine policy replaces the instance's when present, and
/// params merge per key with the patch winning.
pub fn apply_recipe_to_pipeline_ops(
    ops: &[PipelineOpInstance],
    recipe: Option<&PipelineRecipe>,
) -> Vec<PipelineOpInstance> {
    let Some(recipe) = recipe else {
        return ops.to_vec();
    };
    let patches: BTreeMap<&str, &OpInstancePatch> = recipe
        .ops
        .iter()
        .map(|p| (p.instance_id.as_str(), p))
        .collect();

    ops.iter()
        .map(|inst| {
            let Some(patch) = patches.get(inst.instance_id.as_str()) else {
                return inst.clone();
            };
            let override_ = match (&inst.override_, &patch.override_) {
                (None, None) => None,
                (base, over) => {
                    let mut merged = base.clone().unwrap_or_default();
                    if let Some(over) = over {
                        merge_override(&mut merged, over);
                    }
                    Some(merged)
                }
            };
            PipelineOpInstance {
                instance_id: inst.instance_id.clone(),
                op_id: inst.op_id.clone(),
                enabled: patch.enabled.or(inst.enabled),
                override_,
            }
        })
        .collect()
}

fn merge_override(target: &mut OpOverride, patch: &OpOverride) {
    if patch.engine_policy.is_some() {
        target.engine_policy = patch.engine_policy;
    }
    target
        .params
        .extend(patch.params.iter().map(|(k, v)| (k.clone(), v.clone())));
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Recipes of one pipeline plus its selection.
pub struct PipelineRecipeState {
    /// Selected recipe, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_recipe_id: Option<String>,
    /// Recipes keyed by id.
    pub recipes_by_id: BTreeMap<String, PipelineRecipe>,
}

impl PipelineRecipeState {
    /// The selected recipe when it still exists.
    pub fn selected(&self) -> Option<&PipelineRecipe> {
        self.selected_recipe_id
            .as_deref()
            .and_then(|id| self.recipes_by_id.get(id))
    }

    pub(crate) fn repair_selection(&mut self) {
        let dangling = self
            .selected_recipe_id
            .as_deref()
            .is_some_and(|id| !self.recipes_by_id.contains_key(id));
        if dangling {
            self.selected_recipe_id = self.recipes_by_id.keys().next().cloned();
        }
    }
}

/// Recipe states keyed by pipeline id.
pub type AllRecipes = BTreeMap<String, PipelineRecipeState>;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Portable form of one pipeline's recipes.
pub struct PipelineRecipeBundle {
    /// Owning pipeline.
    pub pipeline_id: String,
    /// Selected recipe, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_recipe_id: Option<String>,
    /// Every recipe.
    pub recipes: Vec<PipelineRecipe>,
}

/// Map form to bundle list, sorted by pipeline id.
pub fn all_recipes_to_bundles(all: &AllRecipes) -> Vec<PipelineRecipeBundle> {
    all.iter()
        .map(|(pipeline_id, st)| PipelineRecipeBundle {
            pipeline_id: pipeline_id.clone(),
            selected_recipe_id: st.selected_recipe_id.clone(),
            recipes: st.recipes_by_id.values().cloned().collect(),
        })
        .collect()
}

/// Bundle list (untrusted JSON) to map form.
///
/// Entries without a non-empty `pipelineId` are skipped, as are recipes lacking a non-empty
/// `id`/`title`, a numeric `updatedTs` or an `ops` array. Later bundles for the same pipeline win.
pub fn bundles_to_all_recipes(bundles: &Value) -> AllRecipes {
    let mut out = AllRecipes::new();
    let Some(bundles) = bundles.as_array() else {
        return out;
    };
    for b in bundles {
        let Some(pipeline_id) = b
            .get("pipelineId")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        else {
            continue;
        };
        let recipes_by_id = b
            .get("recipes")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(parse_recipe)
            .map(|r| (r.id.clone(), r))
            .collect();
        let selected_recipe_id = b
            .get("selectedRecipeId")
            .and_then(Value::as_str)
            .map(str::to_string);
        out.insert(
            pipeline_id.to_string(),
            PipelineRecipeState {
                selected_recipe_id,
                recipes_by_id,
            },
        );
    }
    out
}

fn parse_recipe(raw: &Value) -> Option<PipelineRecipe> {
    let non_empty = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };
    if !non_empty("id")
        || !non_empty("title")
        || !raw.get("updatedTs").is_some_and(Value::is_number)
        || !raw.get("ops").is_some_and(Value::is_array)
    {
        return None;
    }
    serde_json::from_value(raw.clone()).ok()
}

/// Persisted recipes for every pipeline.
#[derive(Clone)]
pub struct RecipeStore {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for RecipeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeStore").finish_non_exhaustive()
    }
}

impl RecipeStore {
    /// Store over a key-value backend.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Every pipeline's recipes; empty on any read failure.
    pub fn load_all(&self) -> AllRecipes {
        read_or_default(self.kv.as_ref(), RECIPES_KEY)
    }

    /// Replace everything.
    pub fn save_all(&self, next: &AllRecipes) {
        write_best_effort(self.kv.as_ref(), RECIPES_KEY, next);
    }

    /// State of one pipeline. A selection naming a missing recipe falls back to the first
    /// remaining recipe, or none.
    pub fn get_pipeline_recipe_state(&self, pipeline_id: &str) -> PipelineRecipeState {
        let mut st = self.load_all().remove(pipeline_id).unwrap_or_default();
        st.repair_selection();
        st
    }

    /// Record the selected recipe of a pipeline.
    pub fn set_selected_recipe(&self, pipeline_id: &str, recipe_id: &str) {
        let mut all = self.load_all();
        all.entry(pipeline_id.to_string())
            .or_default()
            .selected_recipe_id = Some(recipe_id.to_string());
        self.save_all(&all);
    }

    /// Insert or replace a recipe, stamping `updatedTs`. Selects it when nothing is selected.
    pub fn upsert_recipe(&self, pipeline_id: &str, mut recipe: PipelineRecipe) -> PipelineRecipe {
        recipe.updated_ts = chrono::Utc::now().timestamp_millis();
        let mut all = self.load_all();
        let st = all.entry(pipeline_id.to_string()).or_default();
        if st.selected_recipe_id.is_none() {
            st.selected_recipe_id = Some(recipe.id.clone());
        }
        st.recipes_by_id.insert(recipe.id.clone(), recipe.clone());
        self.save_all(&all);
        recipe
    }

    /// Remove a recipe. Deleting the selected one selects the first remaining recipe.
    pub fn delete_recipe(&self, pipeline_id: &str, recipe_id: &str) {
        let mut all = self.load_all();
        let Some(st) = all.get_mut(pipeline_id) else {
            return;
        };
        st.recipes_by_id.remove(recipe_id);
        if st.selected_recipe_id.as_deref() == Some(recipe_id) {
            st.selected_recipe_id = st.recipes_by_id.keys().next().cloned();
        }
        self.save_all(&all);
    }

    /// Forget every recipe of a pipeline.
    pub fn delete_all_for_pipeline(&self, pipeline_id: &str) {
        let mut all = self.load_all();
        if all.remove(pipeline_id).is_some() {
            self.save_all(&all);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/recipe.rs"]
mod tests;
