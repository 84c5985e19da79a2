use crate::{
    artifact::model::{ImageArtifact, MASK_ON, MaskArtifact},
    foundation::error::MillResult,
    kernels::color::luminance,
    tuning::model::{ParamMap, param_number},
};

/// Read `manualT`, clamped to `0..=255`.
pub fn manual_threshold(params: &ParamMap) -> u8 {
    param_number(params, "manualT", 128.0).floor().clamp(0.0, 255.0) as u8
}

/// Binarize by luminance: pixels at or above `t` are background (0), darker pixels are set.
pub fn threshold(image: &ImageArtifact, t: u8) -> MillResult<MaskArtifact> {
    let values = image
        .pixels()
        .chunks_exact(4)
        .map(|px| {
            if luminance(px[0], px[1], px[2]) >= t {
                0
            } else {
                MASK_ON
            }
        })
        .collect();
    MaskArtifact::new(image.width(), image.height(), values)
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/threshold.rs"]
mod tests;
