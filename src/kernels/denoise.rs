use crate::{
    artifact::model::ImageArtifact,
    foundation::error::MillResult,
    tuning::model::{ParamMap, param_number},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Denoise settings read from `denoiseAlgo` / `blurK`.
///
/// `bilateralSigma` is part of the schema but has no native counterpart.
pub struct DenoiseParams {
    /// 0 = none, 1 = box blur, 2 = median (3x3; larger kernels use box blur).
    pub algo: i64,
    /// Odd kernel size.
    pub kernel: u32,
}

impl DenoiseParams {
    /// Read from a param map.
    pub fn from_params(params: &ParamMap) -> Self {
        Self {
            algo: param_number(params, "denoiseAlgo", 1.0).floor() as i64,
            kernel: odd_kernel(param_number(params, "blurK", 3.0)),
        }
    }
}

pub(crate) fn odd_kernel(raw: f64) -> u32 {
    let k = raw.floor().max(1.0) as u32;
    if k % 2 == 0 { k + 1 } else { k }
}

/// Apply the configured filter; alpha is filtered like the color channels.
pub fn denoise(image: &ImageArtifact, params: DenoiseParams) -> MillResult<ImageArtifact> {
    let (w, h) = (image.width(), image.height());
    let pixels = match params.algo {
        a if a <= 0 => return Ok(image.clone()),
        2 if params.kernel <= 3 => median3x3(image.pixels(), w, h),
        _ if params.kernel <= 1 => return Ok(image.clone()),
        _ => box_blur(image.pixels(), w, h, params.kernel / 2),
    };
    ImageArtifact::new(w, h, pixels)
}

fn box_blur(src: &[u8], width: u32, height: u32, radius: u32) -> Vec<u8> {
    let mut tmp = vec![0u8; src.len()];
    let mut out = vec![0u8; src.len()];
    box_pass(src, &mut tmp, width, height, radius, true);
    box_pass(&tmp, &mut out, width, height, radius, false);
    out
}

fn box_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, radius: u32, horizontal: bool) {
    let (w, h, r) = (width as i64, height as i64, radius as i64);
    let taps = (2 * r + 1) as u32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u32; 4];
            for d in -r..=r {
                let (sx, sy) = if horizontal {
                    ((x + d).clamp(0, w - 1), y)
                } else {
                    (x, (y + d).clamp(0, h - 1))
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u32::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = (acc[c] / taps) as u8;
            }
        }
    }
}

fn median3x3(src: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (w, h) = (width as i64, height as i64);
    let mut out = vec![0u8; src.len()];
    let mut window = [[0u8; 9]; 4];
    for y in 0..h {
        for x in 0..w {
            let mut n = 0;
            for dy in -1..=1 {
                let yy = (y + dy).clamp(0, h - 1);
                for dx in -1..=1 {
                    let xx = (x + dx).clamp(0, w - 1);
                    let i = ((yy * w + xx) as usize) * 4;
                    for c in 0..4 {
                        window[c][n] = src[i + c];
                    }
                    n += 1;
                }
            }
            let di = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                window[c].sort_unstable();
                out[di + c] = window[c][4];
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/denoise.rs"]
mod tests;
