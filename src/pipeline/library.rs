use std::{collections::BTreeSet, sync::Arc};

use chrono::SecondsFormat;
use serde_json::Value;

use crate::{
    foundation::error::{MillError, MillResult},
    pipeline::{
        catalogue::{Catalogue, builtin_ops},
        draft::PipelineDraft,
        model::{OpSpec, PipelineDef, PipelineRecipe},
        recipe::{
            AllRecipes, PipelineRecipeBundle, PipelineRecipeState, RecipeStore,
            all_recipes_to_bundles, bundles_to_all_recipes,
        },
        user_store::UserPipelineStore,
    },
    storage::{
        kv::KeyValueStore,
        signals::{ChangeReason, PipelineStorageChange, StorageSignals},
    },
};

/// `format` tag written by [`PipelineLibrary::export_json`].
pub const EXPORT_FORMAT: &str = "rastermill.pipeline.userPipelines.v2";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Portable file holding user pipelines and their recipes.
pub struct ExportFile {
    /// Always [`EXPORT_FORMAT`] on export.
    pub format: String,
    /// RFC 3339 UTC timestamp.
    pub exported_at: String,
    /// User pipelines.
    pub pipelines: Vec<PipelineDef>,
    /// Recipe bundles, sorted by pipeline id.
    #[serde(default)]
    pub recipes: Vec<PipelineRecipeBundle>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Counts reported by [`PipelineLibrary::import_json`].
pub struct ImportReport {
    /// Pipelines written.
    pub imported: usize,
    /// Malformed pipeline entries ignored.
    pub skipped: usize,
    /// Pipeline entries present in the file.
    pub total_in_file: usize,
}

/// User pipelines, recipes and change notifications behind one facade.
///
/// Every mutation emits a [`PipelineStorageChange`] once the write is done.
#[derive(Clone, Debug)]
pub struct PipelineLibrary {
    pipelines: UserPipelineStore,
    recipes: RecipeStore,
    signals: StorageSignals,
}

impl PipelineLibrary {
    /// Library over `kv`, announcing changes on `signals`.
    pub fn new(kv: Arc<dyn KeyValueStore>, signals: StorageSignals) -> Self {
        Self {
            pipelines: UserPipelineStore::new(kv.clone()),
            recipes: RecipeStore::new(kv),
            signals,
        }
    }

    /// Change bus.
    pub fn signals(&self) -> &StorageSignals {
        &self.signals
    }

    /// Recipe store.
    pub fn recipe_store(&self) -> &RecipeStore {
        &self.recipes
    }

    /// Stored user pipelines.
    pub fn list_user_pipelines(&self) -> Vec<PipelineDef> {
        self.pipelines.load()
    }

    /// The op library pipelines may reference.
    pub fn list_operations(&self) -> Vec<OpSpec> {
        builtin_ops()
    }

    /// Every stored recipe, with dangling selections repaired the way
    /// [`RecipeStore::get_pipeline_recipe_state`] repairs them.
    pub fn list_all_recipes(&self) -> AllRecipes {
        let mut all = self.recipes.load_all();
        all.values_mut().for_each(PipelineRecipeState::repair_selection);
        all
    }

    /// Validate and store a user pipeline.
    pub fn upsert_pipeline(&self, pipeline: PipelineDef) -> MillResult<()> {
        validate_pipeline(&pipeline)?;
        let id = pipeline.id.clone();
        self.pipelines.upsert(pipeline);
        self.emit_pipelines(ChangeReason::Upsert, Some(id));
        Ok(())
    }

    /// Build a draft against `catalogue` and store it as a user pipeline.
    pub fn save_draft(
        &self,
        draft: &PipelineDraft,
        catalogue: &Catalogue,
    ) -> MillResult<PipelineDef> {
        let pipeline = draft.to_pipeline(catalogue)?;
        self.upsert_pipeline(pipeline.clone())?;
        Ok(pipeline)
    }

    /// Remove a user pipeline. Its recipes are kept.
    pub fn delete_pipeline(&self, id: &str) {
        self.pipelines.delete(id);
        self.emit_pipelines(ChangeReason::Delete, Some(id.to_string()));
    }

    /// Select a recipe of a pipeline.
    pub fn set_selected_recipe(&self, pipeline_id: &str, recipe_id: &str) {
        self.recipes.set_selected_recipe(pipeline_id, recipe_id);
        self.emit_recipes(ChangeReason::Select, Some(pipeline_id), Some(recipe_id));
    }

    /// Insert or replace a recipe; returns it with its new timestamp.
    pub fn upsert_recipe(&self, pipeline_id: &str, recipe: PipelineRecipe) -> PipelineRecipe {
        let stored = self.recipes.upsert_recipe(pipeline_id, recipe);
        self.emit_recipes(ChangeReason::Upsert, Some(pipeline_id), Some(&stored.id));
        stored
    }

    /// Remove one recipe.
    pub fn delete_recipe(&self, pipeline_id: &str, recipe_id: &str) {
        self.recipes.delete_recipe(pipeline_id, recipe_id);
        self.emit_recipes(ChangeReason::Delete, Some(pipeline_id), Some(recipe_id));
    }

    /// Remove every recipe of a pipeline.
    pub fn delete_all_recipes_for_pipeline(&self, pipeline_id: &str) {
        self.recipes.delete_all_for_pipeline(pipeline_id);
        self.emit_recipes(ChangeReason::DeleteAllForPipeline, Some(pipeline_id), None);
    }

    /// Import pipelines (and optionally recipes) from JSON text.
    ///
    /// Accepts an export object (`{"pipelines": [...], "recipes"?: [...]}`) or a bare pipeline
    /// array. Malformed pipelines, and ones [`validate_pipeline`] rejects, are counted as
    /// skipped; imported ones replace stored pipelines with the same id. Recipe bundles
    /// replace the recipe state of the pipelines they name.
    /// Nothing is written when the file has no valid pipeline.
    #[tracing::instrument(skip_all, fields(bytes = text.len()))]
    pub fn import_json(&self, text: &str) -> MillResult<ImportReport> {
        let parsed: Value = serde_json::from_str(text)
            .map_err(|_| MillError::validation("Invalid JSON (parse failed)."))?;

        let (incoming, recipes_raw) = match &parsed {
            Value::Array(items) => (items, None),
            Value::Object(obj) => match obj.get("pipelines") {
                Some(Value::Array(items)) => (items, obj.get("recipes")),
                _ => return Err(invalid_shape()),
            },
            _ => return Err(invalid_shape()),
        };
        if recipes_raw.is_some_and(|r| !r.is_array()) {
            return Err(MillError::validation(
                "Invalid \"recipes\" shape. Expected an array (or omit the field).",
            ));
        }

        let valid: Vec<PipelineDef> = incoming
            .iter()
            .filter(|p| looks_like_pipeline(p))
            .filter_map(|p| serde_json::from_value::<PipelineDef>(p.clone()).ok())
            .filter(|p| validate_pipeline(p).is_ok())
            .collect();
        let report = ImportReport {
            imported: valid.len(),
            skipped: incoming.len() - valid.len(),
            total_in_file: incoming.len(),
        };
        if valid.is_empty() {
            return Err(MillError::validation("No valid pipelines found in the imported file."));
        }

        let mut all = self.pipelines.load();
        for p in valid {
            match all.iter_mut().find(|x| x.id == p.id) {
                Some(slot) => *slot = p,
                None => all.push(p),
            }
        }
        self.pipelines.save(&all);
        self.emit_pipelines(ChangeReason::Import, None);

        if let Some(raw) = recipes_raw {
            let mut stored = self.recipes.load_all();
            stored.extend(bundles_to_all_recipes(raw));
            self.recipes.save_all(&stored);
            self.emit_recipes(ChangeReason::Import, None, None);
        }

        tracing::debug!(?report, "import done");
        Ok(report)
    }

    /// Serialize every user pipeline and recipe as a pretty-printed [`ExportFile`].
    pub fn export_json(&self) -> MillResult<String> {
        let file = ExportFile {
            format: EXPORT_FORMAT.to_string(),
            exported_at: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            pipelines: self.pipelines.load(),
            recipes: all_recipes_to_bundles(&self.list_all_recipes()),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    fn emit_pipelines(&self, reason: ChangeReason, pipeline_id: Option<String>) {
        self.signals.emit(&PipelineStorageChange::UserPipelines {
            reason,
            pipeline_id,
        });
    }

    fn emit_recipes(
        &self,
        reason: ChangeReason,
        pipeline_id: Option<&str>,
        recipe_id: Option<&str>,
    ) {
        self.signals.emit(&PipelineStorageChange::Recipes {
            reason,
            pipeline_id: pipeline_id.map(str::to_string),
            recipe_id: recipe_id.map(str::to_string),
        });
    }
}

fn invalid_shape() -> MillError {
    MillError::validation(
        "Invalid file shape. Expected {\"pipelines\":[...]} or an array of pipelines.",
    )
}

/// Structural check applied to untrusted pipeline JSON before decoding.
fn looks_like_pipeline(p: &Value) -> bool {
    let non_empty = |v: &Value, key: &str| {
        v.get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };
    if !non_empty(p, "id") || !non_empty(p, "title") {
        return false;
    }
    if !p.get("implemented").is_some_and(Value::is_boolean) {
        return false;
    }
    let Some(ops) = p.get("ops").and_then(Value::as_array) else {
        return false;
    };
    ops.iter().all(|op| {
        non_empty(op, "instanceId")
            && non_empty(op, "opId")
            && op.get("enabled").is_none_or(Value::is_boolean)
    })
}

/// Reject definitions the runner could never address.
pub fn validate_pipeline(p: &PipelineDef) -> MillResult<()> {
    if p.id.trim().is_empty() {
        return Err(MillError::validation("pipeline id must not be empty"));
    }
    if p.title.trim().is_empty() {
        return Err(MillError::validation(format!("pipeline '{}' needs a title", p.id)));
    }
    let mut seen = BTreeSet::new();
    for inst in &p.ops {
        if inst.instance_id.is_empty() || inst.op_id.is_empty() {
            return Err(MillError::validation(format!(
                "pipeline '{}' has an op without instanceId/opId",
                p.id
            )));
        }
        if !seen.insert(inst.instance_id.as_str()) {
            return Err(MillError::validation(format!(
                "pipeline '{}' repeats instanceId '{}'",
                p.id, inst.instance_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/library.rs"]
mod tests;
