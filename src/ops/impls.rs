use crate::{
    artifact::model::Artifact,
    foundation::error::MillResult,
    kernels::{
        color::{ColorMode, color_features},
        components::{min_area, remove_small_components},
        denoise::{DenoiseParams, denoise},
        edge::edge_from_mask,
        morphology::{MorphologyParams, morphology},
        resize::{ResizeParams, resize},
        svg::{SvgParams, mask_to_svg},
        threshold::{manual_threshold, threshold},
    },
    ops::dispatch::{DispatchOpId, OpFn, OpImpl, OpImplementations},
    tuning::model::ParamMap,
};

fn native_kernel(id: DispatchOpId) -> fn(&Artifact, &ParamMap) -> MillResult<Artifact> {
    match id {
        DispatchOpId::SegmentationResize | DispatchOpId::EdgeResize => |input, params| {
            Ok(resize(input.as_image()?, ResizeParams::from_params(params))?.into())
        },
        DispatchOpId::SegmentationDenoise => |input, params| {
            Ok(denoise(input.as_image()?, DenoiseParams::from_params(params))?.into())
        },
        DispatchOpId::SegmentationColor => |input, params| {
            Ok(color_features(input.as_image()?, ColorMode::from_params(params))?.into())
        },
        DispatchOpId::SegmentationThreshold | DispatchOpId::EdgeThreshold => |input, params| {
            Ok(threshold(input.as_image()?, manual_threshold(params))?.into())
        },
        DispatchOpId::SegmentationMorphology | DispatchOpId::EdgeMorphology => |input, params| {
            Ok(morphology(input.as_mask()?, MorphologyParams::from_params(params))?.into())
        },
        DispatchOpId::EdgeExtract => |input, _| Ok(edge_from_mask(input.as_mask()?)?.into()),
        DispatchOpId::SvgCreate => |input, params| {
            Ok(mask_to_svg(input.as_mask()?, &SvgParams::from_params(params))?.into())
        },
        DispatchOpId::CleanupRemoveSmallComponents => |input, params| {
            Ok(remove_small_components(input.as_mask()?, min_area(params))?.into())
        },
    }
}

/// Alternate entry for builds without an OpenCV runtime: warns, then runs `native`.
fn alternate_fallback(id: DispatchOpId, native: OpFn) -> OpFn {
    std::sync::Arc::new(move |input, params| {
        tracing::warn!(op = %id, "no OpenCV runtime in this build, using native kernel");
        native(input, params)
    })
}

/// Table with the built-in native kernel for every dispatch id.
pub fn default_implementations() -> OpImplementations {
    let mut table = OpImplementations::new();
    for id in DispatchOpId::ALL {
        let native: OpFn = std::sync::Arc::new(native_kernel(id));
        let alternate = alternate_fallback(id, native.clone());
        table.insert(id, OpImpl { native, alternate });
    }
    table
}

#[cfg(test)]
#[path = "../../tests/unit/ops/impls.rs"]
mod tests;
