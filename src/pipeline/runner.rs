use std::sync::Arc;

use serde_json::json;

use crate::{
    artifact::model::{Artifact, io_mismatch},
    foundation::{
        error::{MillError, MillResult},
        log::{DiagnosticsSink, meta},
    },
    ops::dispatch::OpDispatcher,
    pipeline::{
        catalogue::Catalogue,
        model::{
            OpKind, OpRunResult, OpSpec, PipelineDef, PipelineOpInstance, PipelineRunResult,
            RunStatus,
        },
        typing::{ResolvedLinear, resolve_enabled_linear, validate_linear_chain_types},
    },
    tuning::{model::ParamMap, resolve::ParamSource},
};

/// Error text of runs refused because the pipeline is not implemented.
pub const NOT_IMPLEMENTED: &str = "Not implemented yet";

/// Executes linear pipelines, fail-fast.
///
/// Dispatch ops go through the [`OpDispatcher`]; inline ops receive params from the
/// [`ParamSource`] overlaid with the instance override.
#[derive(Clone)]
pub struct PipelineRunner {
    dispatcher: OpDispatcher,
    params: Arc<dyn ParamSource>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl PipelineRunner {
    /// Runner whose inline params come from the dispatcher's tuning resolver.
    pub fn new(dispatcher: OpDispatcher, sink: Arc<dyn DiagnosticsSink>) -> Self {
        let params: Arc<dyn ParamSource> = Arc::new(dispatcher.resolver().clone());
        Self {
            dispatcher,
            params,
            sink,
        }
    }

    /// Replace the inline-op param source.
    pub fn with_param_source(mut self, params: Arc<dyn ParamSource>) -> Self {
        self.params = params;
        self
    }

    /// Op dispatcher.
    pub fn dispatcher(&self) -> &OpDispatcher {
        &self.dispatcher
    }

    /// Run every enabled step of `pipeline` on `input`.
    ///
    /// The start type is the input's own type. Typing is checked before any step runs; a typing
    /// failure runs nothing and marks every enabled instance as failed. The first failing step
    /// ends the run with all earlier step results kept. Only definition errors (unknown op ids,
    /// unknown tuning components) are returned as `Err`.
    #[tracing::instrument(skip_all, fields(pipeline = %pipeline.id, input = %input.kind()))]
    pub fn run_all(
        &self,
        catalogue: &Catalogue,
        pipeline: &PipelineDef,
        input: Artifact,
    ) -> MillResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            pipeline_id: pipeline.id.clone(),
            title: pipeline.title.clone(),
            status: RunStatus::Error,
            error: None,
            input,
            output: None,
            ops: Vec::new(),
        };
        if !pipeline.implemented {
            result.error = Some(NOT_IMPLEMENTED.to_string());
            return Ok(result);
        }

        let ResolvedLinear { instances, specs } = resolve_enabled_linear(pipeline, catalogue)?;
        let typing = validate_linear_chain_types(&specs, &instances, result.input.kind());
        if let Some(error) = typing.error {
            self.sink.debug(
                "pipeline validation failed (linear)",
                Some(&meta([
                    ("pipelineId", json!(pipeline.id)),
                    ("error", json!(error)),
                ])),
            );
            result.ops = instances
                .iter()
                .zip(&specs)
                .map(|(inst, spec)| step_result(inst, spec, Err(error.clone())))
                .collect();
            result.error = Some(error);
            return Ok(result);
        }

        let mut current = result.input.clone();
        for (inst, spec) in instances.iter().zip(&specs) {
            match self.run_step(spec, inst, &current) {
                Ok(out) => {
                    result.ops.push(step_result(inst, spec, Ok(out.clone())));
                    current = out;
                }
                Err(e) if is_step_failure(&e) => {
                    let msg = e.message();
                    let mut m = meta([
                        ("pipelineId", json!(pipeline.id)),
                        ("opId", json!(spec.id)),
                        ("error", json!(msg)),
                    ]);
                    if let Some((w, h)) = current.dims() {
                        m.insert("width".into(), json!(w));
                        m.insert("height".into(), json!(h));
                    }
                    self.sink.debug("pipeline op failed (linear)", Some(&m));
                    result.error = Some(format!("Op \"{}\" failed: {msg}", spec.title));
                    result.ops.push(step_result(inst, spec, Err(msg)));
                    return Ok(result);
                }
                Err(e) => return Err(e),
            }
        }

        result.status = RunStatus::Ok;
        result.output = Some(current);
        Ok(result)
    }

    /// Execute one step with runtime IO checks on both sides.
    pub fn run_step(
        &self,
        spec: &OpSpec,
        inst: &PipelineOpInstance,
        current: &Artifact,
    ) -> MillResult<Artifact> {
        if current.kind() != spec.io.input {
            return Err(io_mismatch(spec.io.input, current.kind()));
        }

        let out = match &spec.kind {
            OpKind::Dispatch { dispatch_id, .. } => {
                self.dispatcher
                    .run_op_core(*dispatch_id, current, inst.override_.as_ref())?
            }
            OpKind::Inline { run, tuning_id } => {
                let params = self.inline_params(tuning_id.as_deref(), inst);
                run(current, &params)?
            }
        };

        if out.kind() != spec.io.output {
            return Err(io_mismatch(spec.io.output, out.kind()));
        }
        Ok(out)
    }

    fn inline_params(&self, tuning_id: Option<&str>, inst: &PipelineOpInstance) -> ParamMap {
        let mut params = match tuning_id {
            Some(id) => self.params.effective_params(id).unwrap_or_else(|e| {
                self.sink.debug(
                    "effective params unavailable, using empty map",
                    Some(&meta([("tuningId", json!(id)), ("error", json!(e.message()))])),
                );
                ParamMap::new()
            }),
            None => ParamMap::new(),
        };
        if let Some(o) = &inst.override_ {
            params.extend(o.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        params
    }
}

/// Definition errors abort the caller; everything else is a recorded step failure.
fn is_step_failure(e: &MillError) -> bool {
    !matches!(e, MillError::Definition(_))
}

fn step_result(
    inst: &PipelineOpInstance,
    spec: &OpSpec,
    outcome: Result<Artifact, String>,
) -> OpRunResult {
    let (status, output, error) = match outcome {
        Ok(a) => (RunStatus::Ok, Some(a), None),
        Err(e) => (RunStatus::Error, None, Some(e)),
    };
    OpRunResult {
        instance_id: inst.instance_id.clone(),
        op_id: spec.id.clone(),
        title: spec.title.clone(),
        io: spec.io,
        status,
        error,
        output,
    }
}

#[derive(Clone, Debug, PartialEq)]
/// What one [`StepRunner::run_next`] call did.
pub enum StepOutcome {
    /// Step `index` ran and succeeded.
    Advanced {
        /// Index of the executed step.
        index: usize,
    },
    /// Step `index` failed; the next call retries it.
    Failed {
        /// Index of the failed step.
        index: usize,
        /// Error message.
        error: String,
    },
    /// Every step has run; nothing happened.
    Done,
    /// The pipeline is not implemented; nothing happened.
    NotImplemented,
}

/// Step-wise execution state kept between calls.
#[derive(Clone, Debug, Default)]
pub struct StepRunner {
    plan: Option<ResolvedLinear>,
    next_index: usize,
    current: Option<Artifact>,
    last: Option<PipelineRunResult>,
}

impl StepRunner {
    /// Fresh state with no plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the next step of `pipeline`.
    ///
    /// The first call of a fresh plan seeds the current artifact with `input`. Each step uses
    /// the same contract as [`PipelineRunner::run_all`]; once the plan is exhausted further calls
    /// report [`StepOutcome::Done`].
    pub fn run_next(
        &mut self,
        runner: &PipelineRunner,
        catalogue: &Catalogue,
        pipeline: &PipelineDef,
        input: &Artifact,
    ) -> MillResult<StepOutcome> {
        if !pipeline.implemented {
            return Ok(StepOutcome::NotImplemented);
        }
        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => {
                let plan = resolve_enabled_linear(pipeline, catalogue)?;
                self.next_index = 0;
                self.current = Some(input.clone());
                self.last = Some(PipelineRunResult {
                    pipeline_id: pipeline.id.clone(),
                    title: pipeline.title.clone(),
                    status: RunStatus::Ok,
                    error: None,
                    input: input.clone(),
                    output: Some(input.clone()),
                    ops: Vec::new(),
                });
                plan
            }
        };
        let outcome = self.step(runner, &plan, pipeline, input);
        self.plan = Some(plan);
        outcome
    }

    fn step(
        &mut self,
        runner: &PipelineRunner,
        plan: &ResolvedLinear,
        pipeline: &PipelineDef,
        input: &Artifact,
    ) -> MillResult<StepOutcome> {
        let index = self.next_index;
        let (Some(inst), Some(spec)) = (plan.instances.get(index), plan.specs.get(index)) else {
            return Ok(StepOutcome::Done);
        };
        let current = self.current.get_or_insert_with(|| input.clone());

        let mut ops = self.last.take().map(|r| r.ops).unwrap_or_default();
        match runner.run_step(spec, inst, current) {
            Ok(out) => {
                ops.push(step_result(inst, spec, Ok(out.clone())));
                self.last = Some(PipelineRunResult {
                    pipeline_id: pipeline.id.clone(),
                    title: pipeline.title.clone(),
                    status: RunStatus::Ok,
                    error: None,
                    input: input.clone(),
                    output: Some(out.clone()),
                    ops,
                });
                *current = out;
                self.next_index += 1;
                Ok(StepOutcome::Advanced { index })
            }
            Err(e) if is_step_failure(&e) => {
                let msg = e.message();
                runner.sink.debug(
                    "pipeline next-step failed",
                    Some(&meta([
                        ("pipelineId", json!(pipeline.id)),
                        ("instanceId", json!(inst.instance_id)),
                        ("opId", json!(spec.id)),
                        ("error", json!(msg)),
                    ])),
                );
                ops.push(step_result(inst, spec, Err(msg.clone())));
                self.last = Some(PipelineRunResult {
                    pipeline_id: pipeline.id.clone(),
                    title: pipeline.title.clone(),
                    status: RunStatus::Error,
                    error: Some(msg.clone()),
                    input: input.clone(),
                    output: None,
                    ops,
                });
                Ok(StepOutcome::Failed { index, error: msg })
            }
            Err(e) => Err(e),
        }
    }

    /// Adopt the outcome of a whole run: the plan is marked exhausted.
    pub fn complete(&mut self, plan: ResolvedLinear, result: &PipelineRunResult) {
        self.next_index = plan.specs.len();
        self.plan = Some(plan);
        self.current = result.output.clone();
        self.last = Some(result.clone());
    }

    /// Drop the plan and every accumulated artifact.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Forget the plan only; the last result stays for display.
    pub fn invalidate_plan(&mut self) {
        self.plan = None;
        self.next_index = 0;
    }

    /// Index of the next step to run.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Steps in the current plan, if one exists.
    pub fn planned(&self) -> Option<usize> {
        self.plan.as_ref().map(|p| p.specs.len())
    }

    /// `true` once every planned step ran.
    pub fn is_done(&self) -> bool {
        self.planned().is_some_and(|n| self.next_index >= n)
    }

    /// Artifact produced by the last successful step.
    pub fn current(&self) -> Option<&Artifact> {
        self.current.as_ref()
    }

    /// Accumulated result of the step-wise run.
    pub fn last_result(&self) -> Option<&PipelineRunResult> {
        self.last.as_ref()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/runner.rs"]
mod tests;
