//! Rastermill runs typed raster image-processing pipelines.
//!
//! A pipeline is a linear chain of catalogue ops, each declaring the artifact type it consumes
//! and produces. The crate covers:
//!
//! - the op catalogue and built-in pipelines ([`Catalogue`])
//! - declarative chain typing ([`validate_linear_chain_types`])
//! - whole-run and step-wise execution ([`PipelineRunner`], [`StepRunner`])
//! - hierarchical tuning with engine selection ([`TuningResolver`], [`OpDispatcher`])
//! - recipes, user pipelines and their import/export ([`PipelineLibrary`])
//! - an interactive session tying these together ([`PipelineSession`])
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod artifact;
pub mod foundation;
pub mod kernels;
pub mod ops;
pub mod pipeline;
pub mod storage;
pub mod tuning;

pub use crate::artifact::channel::{LastArtifact, LastArtifactChannel};
pub use crate::artifact::codec::{decode_image, encode_artifact};
pub use crate::artifact::model::{
    Artifact, ArtifactType, ImageArtifact, ImageListArtifact, MaskArtifact, PdfArtifact,
    SvgArtifact,
};
pub use crate::foundation::config::{EditorConfig, LogLevel};
pub use crate::foundation::error::{MillError, MillResult};
pub use crate::foundation::log::{DiagnosticsSink, RecordingSink, TracingSink};
pub use crate::ops::dispatch::{DispatchOpId, OpDispatcher, OpImpl, OpImplementations};
pub use crate::ops::impls::default_implementations;
pub use crate::pipeline::catalogue::Catalogue;
pub use crate::pipeline::draft::PipelineDraft;
pub use crate::pipeline::library::{ExportFile, ImportReport, PipelineLibrary};
pub use crate::pipeline::model::{
    OpInstancePatch, OpIo, OpRunResult, OpSpec, PipelineDef, PipelineOpInstance, PipelineRecipe,
    PipelineRunResult, RunStatus,
};
pub use crate::pipeline::recipe::{RecipeStore, apply_recipe_to_pipeline_ops};
pub use crate::pipeline::runner::{PipelineRunner, StepOutcome, StepRunner};
pub use crate::pipeline::session::{PipelineSession, SessionView};
pub use crate::pipeline::typing::{LinearTyping, validate_linear_chain_types};
pub use crate::storage::kv::{JsonFileStore, KeyValueStore, MemoryStore};
pub use crate::storage::signals::{PipelineStorageChange, StorageSignals};
pub use crate::tuning::model::{
    EngineId, EnginePolicy, EngineSwitch, OpOverride, ParamValue, RuntimeAvailability,
};
pub use crate::tuning::resolve::TuningResolver;
