use std::{collections::BTreeSet, sync::Arc};

use crate::{
    artifact::model::{Artifact, ArtifactType},
    foundation::error::{MillError, MillResult},
    kernels::{
        pdf::{PdfOptions, images_to_pdf},
        stack::{StackAxis, stack_images},
    },
    ops::dispatch::DispatchOpId,
    pipeline::model::{OpGroup, OpIo, OpKind, OpSpec, PipelineDef, PipelineOpInstance},
    tuning::model::ParamMap,
};

/// File name suggested for PDFs assembled by `op.imageList.toPdf`.
pub const PDF_FILENAME_HINT: &str = "rastermill.pdf";

/// `<prefix>.<index0 + 1>`
pub fn create_instance_id(prefix: &str, index0: usize) -> String {
    format!("{prefix}.{}", index0 + 1)
}

fn dispatch(id: &str, title: &str, io: OpIo, op: DispatchOpId, group: OpGroup) -> OpSpec {
    OpSpec {
        id: id.to_string(),
        title: title.to_string(),
        io,
        kind: OpKind::Dispatch {
            dispatch_id: op,
            tuning_id: op.as_str().to_string(),
        },
        group,
    }
}

fn inline<F>(
    id: &str,
    title: &str,
    io: OpIo,
    group: OpGroup,
    tuning_id: Option<&str>,
    run: F,
) -> OpSpec
where
    F: Fn(&Artifact, &ParamMap) -> MillResult<Artifact> + Send + Sync + 'static,
{
    OpSpec {
        id: id.to_string(),
        title: title.to_string(),
        io,
        kind: OpKind::Inline {
            run: Arc::new(run),
            tuning_id: tuning_id.map(str::to_string),
        },
        group,
    }
}

/// The shipped op library.
pub fn builtin_ops() -> Vec<OpSpec> {
    use ArtifactType::{Image, ImageList, Mask, Pdf, Svg};
    use DispatchOpId as D;

    let pass = |input: &Artifact, _: &ParamMap| Ok(input.clone());

    vec![
        dispatch(
            "op.seg.resize",
            "Resize",
            OpIo::new(Image, Image),
            D::SegmentationResize,
            OpGroup::Segmentation,
        ),
        dispatch(
            "op.seg.denoise",
            "Denoise",
            OpIo::new(Image, Image),
            D::SegmentationDenoise,
            OpGroup::Segmentation,
        ),
        dispatch(
            "op.seg.color",
            "Color / Gray",
            OpIo::new(Image, Image),
            D::SegmentationColor,
            OpGroup::Segmentation,
        ),
        dispatch(
            "op.seg.threshold",
            "Threshold",
            OpIo::new(Image, Mask),
            D::SegmentationThreshold,
            OpGroup::Segmentation,
        ),
        dispatch(
            "op.seg.morphology",
            "Morphology cleanup",
            OpIo::new(Mask, Mask),
            D::SegmentationMorphology,
            OpGroup::Segmentation,
        ),
        dispatch("op.edge.resize", "Resize", OpIo::new(Image, Image), D::EdgeResize, OpGroup::Edge),
        dispatch(
            "op.edge.threshold",
            "Threshold",
            OpIo::new(Image, Mask),
            D::EdgeThreshold,
            OpGroup::Edge,
        ),
        dispatch(
            "op.edge.morphology",
            "Morphology cleanup",
            OpIo::new(Mask, Mask),
            D::EdgeMorphology,
            OpGroup::Edge,
        ),
        dispatch(
            "op.edge.extract",
            "Edge extract",
            OpIo::new(Mask, Mask),
            D::EdgeExtract,
            OpGroup::Edge,
        ),
        dispatch("op.svg.create", "Create SVG", OpIo::new(Mask, Svg), D::SvgCreate, OpGroup::Svg),
        dispatch(
            "op.clean.removeSmallComponents",
            "Remove small components",
            OpIo::new(Mask, Mask),
            D::CleanupRemoveSmallComponents,
            OpGroup::Cleanup,
        ),
        inline(
            "op.util.pass.image",
            "Pass-through (image)",
            OpIo::new(Image, Image),
            OpGroup::Utility,
            None,
            pass,
        ),
        inline(
            "op.util.pass.mask",
            "Pass-through (mask)",
            OpIo::new(Mask, Mask),
            OpGroup::Utility,
            None,
            pass,
        ),
        inline(
            "op.util.pass.imageList",
            "Pass-through (imageList)",
            OpIo::new(ImageList, ImageList),
            OpGroup::Utility,
            None,
            pass,
        ),
        inline(
            "op.imageList.stackVertical",
            "Stack images (vertical)",
            OpIo::new(ImageList, Image),
            OpGroup::MultiInput,
            None,
            |input, _| {
                Ok(stack_images(input.as_image_list()?, StackAxis::Vertical)?.into())
            },
        ),
        inline(
            "op.imageList.stackHorizontal",
            "Stack images (horizontal)",
            OpIo::new(ImageList, Image),
            OpGroup::MultiInput,
            None,
            |input, _| {
                Ok(stack_images(input.as_image_list()?, StackAxis::Horizontal)?.into())
            },
        ),
        inline(
            "op.imageList.toPdf",
            "Images -> PDF",
            OpIo::new(ImageList, Pdf),
            OpGroup::MultiInput,
            Some("document.pdf"),
            |input, params| {
                let opts = PdfOptions::from_params(params);
                let list = input.as_image_list()?;
                Ok(images_to_pdf(list, &opts, Some(PDF_FILENAME_HINT))?.into())
            },
        ),
    ]
}

fn linear(id: &str, title: &str, description: &str, op_ids: &[&str]) -> PipelineDef {
    PipelineDef {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
        implemented: true,
        ops: op_ids
            .iter()
            .enumerate()
            .map(|(i, op)| PipelineOpInstance::new(create_instance_id(id, i), *op))
            .collect(),
    }
}

/// The shipped pipelines.
pub fn builtin_pipelines() -> Vec<PipelineDef> {
    vec![
        linear(
            "segmentation",
            "Segmentation",
            "Multi-step segmentation pipeline (image -> mask).",
            &[
                "op.seg.resize",
                "op.seg.denoise",
                "op.seg.color",
                "op.seg.threshold",
                "op.seg.morphology",
            ],
        ),
        linear(
            "edge",
            "Edge",
            "Edge extraction pipeline (image -> mask -> edges).",
            &[
                "op.edge.resize",
                "op.edge.threshold",
                "op.edge.morphology",
                "op.edge.extract",
            ],
        ),
        linear(
            "svg",
            "SVG",
            "Image to SVG outline.",
            &[
                "op.edge.resize",
                "op.edge.threshold",
                "op.edge.morphology",
                "op.edge.extract",
                "op.svg.create",
            ],
        ),
        linear(
            "cleanup",
            "Cleanup (min area)",
            "Image -> mask -> cleanup (morphology + remove small components).",
            &[
                "op.seg.resize",
                "op.seg.threshold",
                "op.seg.morphology",
                "op.clean.removeSmallComponents",
            ],
        ),
        PipelineDef {
            id: "surface".to_string(),
            title: "Surface".to_string(),
            description: Some("Region labeling and vectorize pipeline.".to_string()),
            implemented: false,
            ops: Vec::new(),
        },
    ]
}

/// Op library plus built-in and user pipelines in one id namespace.
///
/// A value: rebuild it whenever the user pipeline store changes.
#[derive(Clone, Debug)]
pub struct Catalogue {
    ops: Vec<OpSpec>,
    builtins: Vec<PipelineDef>,
    user: Vec<PipelineDef>,
}

impl Catalogue {
    /// Shipped ops and pipelines, with `user_pipelines` shadowing built-ins on id collision.
    #[tracing::instrument(skip(user_pipelines), fields(user = user_pipelines.len()))]
    pub fn new(user_pipelines: Vec<PipelineDef>) -> Self {
        Self {
            ops: builtin_ops(),
            builtins: builtin_pipelines(),
            user: user_pipelines,
        }
    }

    /// Catalogue over an explicit op library. Op ids must be unique.
    pub fn from_parts(
        ops: Vec<OpSpec>,
        builtins: Vec<PipelineDef>,
        user_pipelines: Vec<PipelineDef>,
    ) -> MillResult<Self> {
        let mut seen = BTreeSet::new();
        for op in &ops {
            if !seen.insert(op.id.as_str()) {
                return Err(MillError::definition(format!("duplicate op id: {}", op.id)));
            }
        }
        Ok(Self {
            ops,
            builtins,
            user: user_pipelines,
        })
    }

    /// Op library in catalogue order.
    pub fn list_ops(&self) -> &[OpSpec] {
        &self.ops
    }

    /// Op by id.
    pub fn get_op(&self, id: &str) -> Option<&OpSpec> {
        self.ops.iter().find(|op| op.id == id)
    }

    /// Built-in pipelines, shadowed or not.
    pub fn builtins(&self) -> &[PipelineDef] {
        &self.builtins
    }

    /// Built-in pipeline by id, ignoring user shadows.
    pub fn get_builtin(&self, id: &str) -> Option<&PipelineDef> {
        self.builtins.iter().find(|p| p.id == id)
    }

    /// User pipelines in store order.
    pub fn user_pipelines(&self) -> &[PipelineDef] {
        &self.user
    }

    /// `true` when `id` names a user pipeline.
    pub fn is_user(&self, id: &str) -> bool {
        self.user.iter().any(|p| p.id == id)
    }

    /// User pipeline first, then built-in.
    pub fn get_pipeline(&self, id: &str) -> Option<&PipelineDef> {
        self.user
            .iter()
            .find(|p| p.id == id)
            .or_else(|| self.get_builtin(id))
    }

    /// Built-ins not shadowed by a user pipeline, followed by every user pipeline.
    pub fn list_pipelines(&self) -> Vec<&PipelineDef> {
        let user_ids: BTreeSet<&str> = self.user.iter().map(|p| p.id.as_str()).collect();
        self.builtins
            .iter()
            .filter(|p| !user_ids.contains(p.id.as_str()))
            .chain(self.user.iter())
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/catalogue.rs"]
mod tests;
