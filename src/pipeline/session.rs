use std::sync::Arc;

use crate::{
    artifact::{channel::LastArtifactChannel, model::Artifact},
    foundation::{
        error::{MillError, MillResult},
        log::DiagnosticsSink,
    },
    ops::{dispatch::OpDispatcher, impls::default_implementations},
    pipeline::{
        catalogue::Catalogue,
        draft::PipelineDraft,
        library::PipelineLibrary,
        model::{PipelineDef, PipelineRunResult},
        recipe::{AllRecipes, apply_recipe_to_pipeline_ops},
        runner::{NOT_IMPLEMENTED, PipelineRunner, StepOutcome, StepRunner},
        typing::resolve_enabled_linear,
    },
    storage::{kv::KeyValueStore, signals::StorageSignals},
    tuning::{
        model::AvailabilityProbe, registry::default_registry, resolve::TuningResolver,
        store::TuningStore,
    },
};

/// Recipe id meaning "run the pipeline as defined".
pub const DEFAULT_RECIPE_ID: &str = "default";

const STATUS_READY: &str = "Ready";
const STATUS_DONE: &str = "Done";
const STATUS_NO_INPUT: &str = "No input";
const STATUS_NO_PIPELINE: &str = "No pipeline";

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
/// Pipeline row of a [`SessionView`].
pub struct PipelineSummary {
    /// Pipeline id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Runnable.
    pub implemented: bool,
    /// Stored by the user rather than built in.
    pub user: bool,
    /// Enabled steps.
    pub enabled_ops: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
/// Recipe row of a [`SessionView`]; the first row is always the default recipe.
pub struct RecipeSummary {
    /// Recipe id.
    pub id: String,
    /// Display title.
    pub title: String,
}

#[derive(Clone, Debug)]
/// Read-only snapshot of a [`PipelineSession`].
pub struct SessionView<'a> {
    /// Every pipeline in catalogue order.
    pub pipelines: Vec<PipelineSummary>,
    /// Recipes of the active pipeline.
    pub recipes: Vec<RecipeSummary>,
    /// Active pipeline id.
    pub active_pipeline_id: Option<&'a str>,
    /// Active recipe id.
    pub active_recipe_id: &'a str,
    /// Status line.
    pub status: &'a str,
    /// Index of the next step a step-wise run would execute.
    pub next_index: usize,
    /// Enabled steps of the active pipeline after its recipe.
    pub total_ops: usize,
    /// Most recent run or step result.
    pub last_result: Option<&'a PipelineRunResult>,
}

/// Interactive pipeline state: selection, input, status and step-wise progress.
///
/// Final artifacts of successful runs (and of each successful step) are published to the
/// session's [`LastArtifactChannel`].
#[derive(Debug)]
pub struct PipelineSession {
    library: PipelineLibrary,
    runner: PipelineRunner,
    channel: LastArtifactChannel,
    catalogue: Catalogue,
    recipes: AllRecipes,
    active_pipeline_id: Option<String>,
    active_recipe_id: String,
    input: Option<Artifact>,
    status: String,
    last: Option<PipelineRunResult>,
    steps: StepRunner,
}

impl PipelineSession {
    /// Session over existing components; the catalogue is loaded immediately.
    pub fn new(
        library: PipelineLibrary,
        runner: PipelineRunner,
        channel: LastArtifactChannel,
    ) -> Self {
        let mut session = Self {
            library,
            runner,
            channel,
            catalogue: Catalogue::new(Vec::new()),
            recipes: AllRecipes::new(),
            active_pipeline_id: None,
            active_recipe_id: DEFAULT_RECIPE_ID.to_string(),
            input: None,
            status: STATUS_READY.to_string(),
            last: None,
            steps: StepRunner::new(),
        };
        session.reload_catalogue();
        session
    }

    /// Wire the default registry, native/alternate implementations and stores over `kv`.
    pub fn open(
        kv: Arc<dyn KeyValueStore>,
        probe: Arc<dyn AvailabilityProbe>,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> MillResult<Self> {
        let resolver = TuningResolver::new(
            Arc::new(default_registry()?),
            TuningStore::new(kv.clone()),
            probe,
        );
        let dispatcher = OpDispatcher::new(resolver, Arc::new(default_implementations()));
        let runner = PipelineRunner::new(dispatcher, sink);
        let library = PipelineLibrary::new(kv, StorageSignals::new());
        Ok(Self::new(library, runner, LastArtifactChannel::new()))
    }

    /// Persisted pipelines and recipes.
    pub fn library(&self) -> &PipelineLibrary {
        &self.library
    }

    /// Runner used for every execution.
    pub fn runner(&self) -> &PipelineRunner {
        &self.runner
    }

    /// Channel receiving final artifacts.
    pub fn channel(&self) -> &LastArtifactChannel {
        &self.channel
    }

    /// Current catalogue snapshot.
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Input artifact, if set.
    pub fn input(&self) -> Option<&Artifact> {
        self.input.as_ref()
    }

    /// Status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Most recent run or step result.
    pub fn last_result(&self) -> Option<&PipelineRunResult> {
        self.last.as_ref()
    }

    /// Rebuild the catalogue and recipes from storage.
    ///
    /// A selection that still exists is kept and only the step plan is dropped. Otherwise the
    /// session falls back to the first pipeline and the default recipe and resets.
    pub fn reload_catalogue(&mut self) {
        self.catalogue = Catalogue::new(self.library.list_user_pipelines());
        self.recipes = self.library.list_all_recipes();

        let pipeline_ok = self
            .active_pipeline_id
            .as_deref()
            .is_some_and(|id| self.catalogue.get_pipeline(id).is_some());
        if !pipeline_ok {
            let first = self
                .catalogue
                .list_pipelines()
                .first()
                .map(|p| p.id.clone());
            tracing::debug!(?first, "active pipeline unavailable, falling back");
            self.active_pipeline_id = first;
            self.active_recipe_id = self.stored_selection();
            self.reset();
            return;
        }
        if !self.recipe_exists(&self.active_recipe_id) {
            self.active_recipe_id = DEFAULT_RECIPE_ID.to_string();
            self.reset();
            return;
        }
        self.steps.invalidate_plan();
    }

    /// Store a draft as a user pipeline, reload, and make it the active pipeline.
    pub fn save_draft(&mut self, draft: &PipelineDraft) -> MillResult<()> {
        let saved = self.library.save_draft(draft, &self.catalogue)?;
        self.reload_catalogue();
        self.set_active_pipeline(&saved.id)
    }

    /// Select a pipeline; its stored recipe selection becomes active.
    pub fn set_active_pipeline(&mut self, id: &str) -> MillResult<()> {
        if self.catalogue.get_pipeline(id).is_none() {
            return Err(MillError::definition(format!("unknown pipeline '{id}'")));
        }
        self.active_pipeline_id = Some(id.to_string());
        self.active_recipe_id = self.stored_selection();
        self.reset();
        Ok(())
    }

    /// Select a recipe of the active pipeline, or [`DEFAULT_RECIPE_ID`].
    ///
    /// A stored recipe also becomes the persisted selection.
    pub fn set_active_recipe(&mut self, recipe_id: &str) -> MillResult<()> {
        if !self.recipe_exists(recipe_id) {
            return Err(MillError::definition(format!("unknown recipe '{recipe_id}'")));
        }
        if recipe_id != DEFAULT_RECIPE_ID
            && let Some(pid) = self.active_pipeline_id.as_deref()
        {
            self.library.set_selected_recipe(pid, recipe_id);
            self.recipes = self.library.list_all_recipes();
        }
        self.active_recipe_id = recipe_id.to_string();
        self.reset();
        Ok(())
    }

    /// Replace the input artifact and reset step-wise progress.
    pub fn set_input(&mut self, input: Artifact) {
        self.input = Some(input);
        self.reset();
    }

    /// Active pipeline with the active recipe applied.
    pub fn effective_pipeline(&self) -> Option<PipelineDef> {
        let pid = self.active_pipeline_id.as_deref()?;
        let base = self.catalogue.get_pipeline(pid)?;
        let recipe = self
            .recipes
            .get(pid)
            .and_then(|st| st.recipes_by_id.get(&self.active_recipe_id));
        Some(PipelineDef {
            ops: apply_recipe_to_pipeline_ops(&base.ops, recipe),
            ..base.clone()
        })
    }

    /// Run the whole active pipeline on the input.
    ///
    /// Returns `Ok(None)` when nothing ran; the status line says why.
    #[tracing::instrument(skip(self), fields(pipeline = ?self.active_pipeline_id))]
    pub fn run_all(&mut self) -> MillResult<Option<&PipelineRunResult>> {
        let Some(pipeline) = self.effective_pipeline() else {
            self.status = STATUS_NO_PIPELINE.to_string();
            return Ok(None);
        };
        if !pipeline.implemented {
            self.status = NOT_IMPLEMENTED.to_string();
            return Ok(None);
        }
        let Some(input) = self.input.clone() else {
            self.status = STATUS_NO_INPUT.to_string();
            return Ok(None);
        };

        let result = self.runner.run_all(&self.catalogue, &pipeline, input)?;
        self.steps.reset();
        match (&result.output, &result.error) {
            (Some(out), _) => {
                self.status = STATUS_DONE.to_string();
                self.channel.publish(pipeline.id.clone(), out.clone());
                let plan = resolve_enabled_linear(&pipeline, &self.catalogue)?;
                self.steps.complete(plan, &result);
            }
            (None, error) => {
                self.status = error.clone().unwrap_or_else(|| "Error".to_string());
            }
        }
        self.last = Some(result);
        Ok(self.last.as_ref())
    }

    /// Run the next step of the active pipeline.
    ///
    /// A failed step leaves the position unchanged, so the next call retries it.
    pub fn run_next(&mut self) -> MillResult<StepOutcome> {
        let Some(pipeline) = self.effective_pipeline() else {
            self.status = STATUS_NO_PIPELINE.to_string();
            return Ok(StepOutcome::Done);
        };
        if !pipeline.implemented {
            self.status = NOT_IMPLEMENTED.to_string();
            return Ok(StepOutcome::NotImplemented);
        }
        let Some(input) = self.input.as_ref() else {
            self.status = STATUS_NO_INPUT.to_string();
            return Ok(StepOutcome::Done);
        };

        let outcome = self
            .steps
            .run_next(&self.runner, &self.catalogue, &pipeline, input)?;
        self.last = self.steps.last_result().cloned();
        match &outcome {
            StepOutcome::Advanced { .. } => {
                if let Some(current) = self.steps.current() {
                    self.channel.publish(pipeline.id.clone(), current.clone());
                }
                self.status = if self.steps.is_done() {
                    STATUS_DONE
                } else {
                    STATUS_READY
                }
                .to_string();
            }
            StepOutcome::Failed { error, .. } => {
                let title = self
                    .last
                    .as_ref()
                    .and_then(|r| r.ops.last())
                    .map(|op| op.title.as_str())
                    .unwrap_or("step");
                self.status = format!("Error: {title} - {error}");
            }
            StepOutcome::Done => self.status = STATUS_DONE.to_string(),
            StepOutcome::NotImplemented => self.status = NOT_IMPLEMENTED.to_string(),
        }
        Ok(outcome)
    }

    /// Drop step-wise progress and the last result.
    pub fn reset(&mut self) {
        self.steps.reset();
        self.last = None;
        self.status = STATUS_READY.to_string();
    }

    /// Snapshot for display.
    pub fn view(&self) -> SessionView<'_> {
        let pipelines = self
            .catalogue
            .list_pipelines()
            .into_iter()
            .map(|p| PipelineSummary {
                id: p.id.clone(),
                title: p.title.clone(),
                implemented: p.implemented,
                user: self.catalogue.is_user(&p.id),
                enabled_ops: p.ops.iter().filter(|i| i.is_enabled()).count(),
            })
            .collect();

        let mut recipes = vec![RecipeSummary {
            id: DEFAULT_RECIPE_ID.to_string(),
            title: "Default".to_string(),
        }];
        if let Some(st) = self
            .active_pipeline_id
            .as_deref()
            .and_then(|pid| self.recipes.get(pid))
        {
            recipes.extend(st.recipes_by_id.values().map(|r| RecipeSummary {
                id: r.id.clone(),
                title: r.title.clone(),
            }));
        }

        let total_ops = self
            .effective_pipeline()
            .map_or(0, |p| p.ops.iter().filter(|i| i.is_enabled()).count());

        SessionView {
            pipelines,
            recipes,
            active_pipeline_id: self.active_pipeline_id.as_deref(),
            active_recipe_id: &self.active_recipe_id,
            status: &self.status,
            next_index: self.steps.next_index(),
            total_ops,
            last_result: self.last.as_ref(),
        }
    }

    fn recipe_exists(&self, recipe_id: &str) -> bool {
        recipe_id == DEFAULT_RECIPE_ID
            || self
                .active_pipeline_id
                .as_deref()
                .and_then(|pid| self.recipes.get(pid))
                .is_some_and(|st| st.recipes_by_id.contains_key(recipe_id))
    }

    fn stored_selection(&self) -> String {
        self.active_pipeline_id
            .as_deref()
            .and_then(|pid| self.recipes.get(pid))
            .and_then(|st| st.selected())
            .map_or_else(|| DEFAULT_RECIPE_ID.to_string(), |r| r.id.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/session.rs"]
mod tests;
