use image::{
    RgbaImage,
    imageops::{self, FilterType},
};

use crate::{
    artifact::model::ImageArtifact,
    foundation::error::{MillError, MillResult},
    tuning::model::{ParamMap, param_number},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Resampling filter.
pub enum ResizeFilter {
    /// Nearest neighbour (`resizeAlgo = 0`).
    Nearest,
    /// Bilinear (any other `resizeAlgo`).
    Bilinear,
}

impl ResizeFilter {
    fn as_filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Downscale settings.
pub struct ResizeParams {
    /// Filter.
    pub filter: ResizeFilter,
    /// Width cap; images at or below it pass through.
    pub target_max_w: u32,
}

impl ResizeParams {
    /// Read `resizeAlgo` / `targetMaxW`.
    pub fn from_params(params: &ParamMap) -> Self {
        let filter = if param_number(params, "resizeAlgo", 1.0).floor() as i64 == 0 {
            ResizeFilter::Nearest
        } else {
            ResizeFilter::Bilinear
        };
        Self {
            filter,
            target_max_w: param_number(params, "targetMaxW", 1200.0).floor().max(1.0) as u32,
        }
    }
}

/// Downscale to at most `target_max_w` wide, keeping aspect ratio. Never upscales.
pub fn resize(image: &ImageArtifact, params: ResizeParams) -> MillResult<ImageArtifact> {
    let (w, h) = (image.width(), image.height());
    if w <= params.target_max_w {
        return Ok(image.clone());
    }
    let scale = f64::from(params.target_max_w) / f64::from(w);
    let out_w = ((f64::from(w) * scale).floor() as u32).max(1);
    let out_h = ((f64::from(h) * scale).floor() as u32).max(1);

    let src = RgbaImage::from_raw(w, h, image.pixels().to_vec())
        .ok_or_else(|| MillError::validation("Resize: pixel buffer does not match dimensions"))?;
    let resized = imageops::resize(&src, out_w, out_h, params.filter.as_filter_type());
    ImageArtifact::new(out_w, out_h, resized.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/resize.rs"]
mod tests;
