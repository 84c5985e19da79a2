use crate::{
    artifact::model::ArtifactType,
    foundation::error::{MillError, MillResult},
    pipeline::{
        catalogue::{Catalogue, create_instance_id},
        model::{OpSpec, PipelineDef, PipelineOpInstance},
        typing::{can_insert_between, type_at_index, validate_linear_chain_types},
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// A linear pipeline being authored, op by op.
///
/// Insertions are checked against the chain typing at the target slot. Reordering is not,
/// so [`PipelineDraft::to_pipeline`] checks the whole chain again.
pub struct PipelineDraft {
    /// Pipeline id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Free text; empty means none.
    pub description: String,
    /// Whether the saved pipeline is runnable.
    pub implemented: bool,
    start_type: ArtifactType,
    op_ids: Vec<String>,
}

impl Default for PipelineDraft {
    fn default() -> Self {
        Self::new("myPipeline", "My pipeline")
    }
}

impl PipelineDraft {
    /// Empty draft starting from an image.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            implemented: true,
            start_type: ArtifactType::Image,
            op_ids: Vec::new(),
        }
    }

    /// Type fed to the first op.
    pub fn start_type(&self) -> ArtifactType {
        self.start_type
    }

    /// Change the start type. Existing ops are kept even when they no longer fit.
    pub fn set_start_type(&mut self, start_type: ArtifactType) {
        self.start_type = start_type;
    }

    /// Op ids in order.
    pub fn op_ids(&self) -> &[String] {
        &self.op_ids
    }

    /// Specs of the known op ids, in order.
    pub fn specs(&self, catalogue: &Catalogue) -> Vec<OpSpec> {
        self.op_ids
            .iter()
            .filter_map(|id| catalogue.get_op(id).cloned())
            .collect()
    }

    /// Type flowing into slot `index`.
    pub fn slot_type(&self, catalogue: &Catalogue, index: usize) -> ArtifactType {
        type_at_index(&self.specs(catalogue), self.start_type, index)
    }

    /// Output of the valid prefix of the chain.
    pub fn end_type(&self, catalogue: &Catalogue) -> ArtifactType {
        self.slot_type(catalogue, self.op_ids.len())
    }

    /// Whether `op_id` may be inserted at slot `index` (0..=len). The error is a short reason.
    pub fn can_insert_at(
        &self,
        catalogue: &Catalogue,
        index: usize,
        op_id: &str,
    ) -> Result<(), String> {
        let op = catalogue.get_op(op_id).ok_or_else(|| "Unknown op".to_string())?;
        if index > self.op_ids.len() {
            return Err(format!("Slot {} is past the end", index + 1));
        }
        let specs = self.specs(catalogue);
        let before = type_at_index(&specs, self.start_type, index);
        let after = specs.get(index).map(|s| s.io.input);
        can_insert_between(before, after, op)
    }

    /// Insert `op_id` at slot `index` when it fits there.
    pub fn insert_op_at(
        &mut self,
        catalogue: &Catalogue,
        index: usize,
        op_id: &str,
    ) -> MillResult<()> {
        self.can_insert_at(catalogue, index, op_id)
            .map_err(|reason| MillError::validation(format!("Insert refused: {reason}")))?;
        self.op_ids.insert(index, op_id.to_string());
        tracing::debug!(index, op_id, "draft op inserted");
        Ok(())
    }

    /// Remove the op at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        (index < self.op_ids.len()).then(|| self.op_ids.remove(index))
    }

    /// Swap the op at `index` with its neighbour; `false` when there is none.
    pub fn move_op(&mut self, index: usize, up: bool) -> bool {
        let other = if up {
            index.checked_sub(1)
        } else {
            Some(index + 1)
        };
        match other {
            Some(j) if index < self.op_ids.len() && j < self.op_ids.len() => {
                self.op_ids.swap(index, j);
                true
            }
            _ => false,
        }
    }

    /// Drop every op.
    pub fn clear(&mut self) {
        self.op_ids.clear();
    }

    /// Build the pipeline to store.
    ///
    /// Requires an id, a title, known ops and a chain that types from the start type.
    pub fn to_pipeline(&self, catalogue: &Catalogue) -> MillResult<PipelineDef> {
        let id = self.id.trim();
        let title = self.title.trim();
        if id.is_empty() {
            return Err(MillError::validation("Pipeline id is required."));
        }
        if title.is_empty() {
            return Err(MillError::validation("Pipeline title is required."));
        }

        let specs = self
            .op_ids
            .iter()
            .map(|op_id| {
                catalogue.get_op(op_id).cloned().ok_or_else(|| {
                    MillError::definition(format!("Unknown operation in draft: {op_id}"))
                })
            })
            .collect::<MillResult<Vec<_>>>()?;
        let ops: Vec<PipelineOpInstance> = self
            .op_ids
            .iter()
            .enumerate()
            .map(|(i, op_id)| PipelineOpInstance::new(create_instance_id(id, i), op_id.as_str()))
            .collect();

        if !specs.is_empty() {
            let typing = validate_linear_chain_types(&specs, &ops, self.start_type);
            if let Some(step) = typing.steps.iter().find(|s| !s.is_ok()) {
                return Err(MillError::validation(format!(
                    "Invalid typing at step {}: \"{}\" needs {} but current is {}",
                    step.index + 1,
                    step.title,
                    step.expected_input,
                    step.actual_input
                )));
            }
        }

        Ok(PipelineDef {
            id: id.to_string(),
            title: title.to_string(),
            description: (!self.description.trim().is_empty())
                .then(|| self.description.clone()),
            implemented: self.implemented,
            ops,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/draft.rs"]
mod tests;
