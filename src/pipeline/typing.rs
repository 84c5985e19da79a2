use crate::{
    artifact::model::ArtifactType,
    foundation::error::{MillError, MillResult},
    pipeline::{
        catalogue::Catalogue,
        model::{OpSpec, PipelineDef, PipelineOpInstance},
    },
};

#[derive(Clone, Debug)]
/// Enabled instances of a pipeline paired with their op specs.
pub struct ResolvedLinear {
    /// Enabled instances in pipeline order.
    pub instances: Vec<PipelineOpInstance>,
    /// `specs[i]` is the op of `instances[i]`.
    pub specs: Vec<OpSpec>,
}

/// Keep enabled instances and resolve each op id.
///
/// An unknown op id is a definition error; nothing partial is returned.
pub fn resolve_enabled_linear(
    pipeline: &PipelineDef,
    catalogue: &Catalogue,
) -> MillResult<ResolvedLinear> {
    let instances: Vec<PipelineOpInstance> = pipeline
        .ops
        .iter()
        .filter(|inst| inst.is_enabled())
        .cloned()
        .collect();
    let specs = instances
        .iter()
        .map(|inst| {
            catalogue.get_op(&inst.op_id).cloned().ok_or_else(|| {
                MillError::definition(format!("Unknown opId in pipeline: {}", inst.op_id))
            })
        })
        .collect::<MillResult<Vec<_>>>()?;
    Ok(ResolvedLinear { instances, specs })
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One checked link of a chain.
pub struct TypingStep {
    /// Position among enabled instances.
    pub index: usize,
    /// Instance id.
    pub instance_id: String,
    /// Op id.
    pub op_id: String,
    /// Op title.
    pub title: String,
    /// Input the op declares.
    pub expected_input: ArtifactType,
    /// Type flowing into the op.
    pub actual_input: ArtifactType,
    /// Output the op declares.
    pub output: ArtifactType,
    /// Mismatch message, when this link failed.
    pub error: Option<String>,
}

impl TypingStep {
    /// `true` when the link type-checks.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Outcome of a declarative chain check.
pub struct LinearTyping {
    /// Type fed to the first op.
    pub start_type: ArtifactType,
    /// Type produced by the last op, when the chain is valid.
    pub end_type: Option<ArtifactType>,
    /// First failure.
    pub error: Option<String>,
    /// Checked links, up to and including the first failure.
    pub steps: Vec<TypingStep>,
}

impl LinearTyping {
    /// `true` when every link type-checks.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Walk `specs` from `start_type`, stopping at the first mismatching link.
///
/// `instances[i]` only labels step `i`; a shorter `instances` leaves the id empty.
pub fn validate_linear_chain_types(
    specs: &[OpSpec],
    instances: &[PipelineOpInstance],
    start_type: ArtifactType,
) -> LinearTyping {
    let mut out = LinearTyping {
        start_type,
        end_type: None,
        error: None,
        steps: Vec::with_capacity(specs.len()),
    };
    if specs.is_empty() {
        out.error = Some("Pipeline has no ops".to_string());
        return out;
    }

    let mut cur = start_type;
    for (index, spec) in specs.iter().enumerate() {
        let expected = spec.io.input;
        let error = (expected != cur).then(|| {
            format!(
                "Chain IO mismatch at \"{}\": needs {expected} but current is {cur}",
                spec.title
            )
        });
        out.steps.push(TypingStep {
            index,
            instance_id: instances
                .get(index)
                .map(|inst| inst.instance_id.clone())
                .unwrap_or_default(),
            op_id: spec.id.clone(),
            title: spec.title.clone(),
            expected_input: expected,
            actual_input: cur,
            output: spec.io.output,
            error: error.clone(),
        });
        if error.is_some() {
            out.error = error;
            return out;
        }
        cur = spec.io.output;
    }
    out.end_type = Some(cur);
    out
}

/// Type flowing into slot `index`, stopping early at an invalid link.
pub fn type_at_index(specs: &[OpSpec], start_type: ArtifactType, index: usize) -> ArtifactType {
    let mut cur = start_type;
    for spec in specs.iter().take(index) {
        if spec.io.input != cur {
            return cur;
        }
        cur = spec.io.output;
    }
    cur
}

/// Whether `op` fits between a slot providing `before` and an op needing `after`.
///
/// The error carries a short reason for authoring UIs.
pub fn can_insert_between(
    before: ArtifactType,
    after: Option<ArtifactType>,
    op: &OpSpec,
) -> Result<(), String> {
    if op.io.input != before {
        return Err(format!("Needs {} but slot provides {before}", op.io.input));
    }
    match after {
        Some(after) if op.io.output != after => {
            Err(format!("Produces {} but next op needs {after}", op.io.output))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/typing.rs"]
mod tests;
