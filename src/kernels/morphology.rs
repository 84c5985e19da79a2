use crate::{
    artifact::model::{MASK_ON, MaskArtifact},
    foundation::error::MillResult,
    kernels::denoise::odd_kernel,
    tuning::model::{ParamMap, param_number},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Binary morphology operator.
pub enum MorphOp {
    /// Keep pixels whose whole window is set.
    Erode,
    /// Set pixels whose window contains any set pixel.
    Dilate,
    /// Erode then dilate.
    Open,
    /// Dilate then erode.
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Morphology settings from `morphAlgo` / `morphK` / `morphIters`.
pub struct MorphologyParams {
    /// `None` when `morphAlgo` is 0.
    pub op: Option<MorphOp>,
    /// Half window size (`(k - 1) / 2`).
    pub radius: u32,
    /// Repetitions, clamped to `1..=20`.
    pub iterations: u32,
}

impl MorphologyParams {
    /// Read from a param map. Algo 1 = erode, 2 = dilate, 3 = close, 4 = open.
    pub fn from_params(params: &ParamMap) -> Self {
        let op = match param_number(params, "morphAlgo", 2.0).floor() as i64 {
            1 => Some(MorphOp::Erode),
            2 => Some(MorphOp::Dilate),
            3 => Some(MorphOp::Close),
            a if a >= 4 => Some(MorphOp::Open),
            _ => None,
        };
        let k = odd_kernel(param_number(params, "morphK", 5.0));
        Self {
            op,
            radius: (k - 1) / 2,
            iterations: param_number(params, "morphIters", 1.0).floor().clamp(1.0, 20.0) as u32,
        }
    }
}

/// Run the configured operator; returns a copy when disabled.
pub fn morphology(mask: &MaskArtifact, params: MorphologyParams) -> MillResult<MaskArtifact> {
    match params.op {
        Some(op) if params.radius > 0 => apply(mask, params.radius, params.iterations, op),
        _ => Ok(mask.clone()),
    }
}

/// Apply `op` `iterations` times with a square window of `radius`.
///
/// Always allocates a fresh mask; the input is never aliased. Output is 0/255.
pub fn apply(
    mask: &MaskArtifact,
    radius: u32,
    iterations: u32,
    op: MorphOp,
) -> MillResult<MaskArtifact> {
    let (w, h) = (mask.width(), mask.height());
    let mut cur = mask.values().to_vec();
    for _ in 0..iterations {
        cur = match op {
            MorphOp::Erode => window(&cur, w, h, radius, true),
            MorphOp::Dilate => window(&cur, w, h, radius, false),
            MorphOp::Open => window(&window(&cur, w, h, radius, true), w, h, radius, false),
            MorphOp::Close => window(&window(&cur, w, h, radius, false), w, h, radius, true),
        };
    }
    if iterations == 0 {
        cur.iter_mut().for_each(|v| *v = if *v != 0 { MASK_ON } else { 0 });
    }
    MaskArtifact::new(w, h, cur)
}

/// `all = true` erodes, `false` dilates. The window is clipped at the borders.
fn window(src: &[u8], width: u32, height: u32, radius: u32, all: bool) -> Vec<u8> {
    let (w, h, r) = (width as i64, height as i64, radius as i64);
    let mut dst = vec![0u8; src.len()];
    for y in 0..h {
        let (y0, y1) = ((y - r).max(0), (y + r).min(h - 1));
        for x in 0..w {
            let (x0, x1) = ((x - r).max(0), (x + r).min(w - 1));
            let row = |yy: i64| &src[(yy * w + x0) as usize..=(yy * w + x1) as usize];
            let on = if all {
                (y0..=y1).all(|yy| row(yy).iter().all(|v| *v != 0))
            } else {
                (y0..=y1).any(|yy| row(yy).iter().any(|v| *v != 0))
            };
            if on {
                dst[(y * w + x) as usize] = MASK_ON;
            }
        }
    }
    dst
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/morphology.rs"]
mod tests;
