use std::collections::VecDeque;

use crate::{
    artifact::model::{ImageArtifact, MASK_ON, MaskArtifact},
    foundation::error::{MillError, MillResult},
    kernels::morphology::{MorphOp, apply},
    tuning::model::{ParamMap, param_flag, param_number},
};

/// Largest accepted `edge_dilate`.
pub const MAX_EDGE_DILATE: u32 = 6;
/// Accepted `max_region_px` range.
pub const REGION_PX_RANGE: (usize, usize) = (1_000, 10_000_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Click-to-fill settings.
pub struct FillSettings {
    /// Dark outlines on a light background (`false`: light outlines on dark).
    pub edges_dark: bool,
    /// Luminance distance from black (or white) still counted as an edge.
    pub edge_threshold: u8,
    /// Edge dilation passes; closes small gaps in outlines.
    pub edge_dilate: u32,
    /// A fill covering more pixels than this is refused.
    pub max_region_px: usize,
}

impl Default for FillSettings {
    fn default() -> Self {
        Self {
            edges_dark: true,
            edge_threshold: 80,
            edge_dilate: 2,
            max_region_px: 200_000,
        }
    }
}

impl FillSettings {
    /// Read `edgesDark` / `edgeThreshold` / `edgeDilate` / `maxRegionPx`.
    pub fn from_params(params: &ParamMap) -> Self {
        let d = Self::default();
        let int = |key: &str, default: usize, lo: i64, hi: i64| {
            let n = param_number(params, key, default as f64);
            if n.is_finite() {
                (n.trunc() as i64).clamp(lo, hi)
            } else {
                lo
            }
        };
        Self {
            edges_dark: param_flag(params, "edgesDark", d.edges_dark),
            edge_threshold: int("edgeThreshold", usize::from(d.edge_threshold), 0, 255) as u8,
            edge_dilate: int("edgeDilate", d.edge_dilate as usize, 0, i64::from(MAX_EDGE_DILATE))
                as u32,
            max_region_px: int(
                "maxRegionPx",
                d.max_region_px,
                REGION_PX_RANGE.0 as i64,
                REGION_PX_RANGE.1 as i64,
            ) as usize,
        }
    }

    /// Pull `edge_dilate` and `max_region_px` into their accepted ranges.
    pub fn clamped(self) -> Self {
        Self {
            edge_dilate: self.edge_dilate.min(MAX_EDGE_DILATE),
            max_region_px: self
                .max_region_px
                .clamp(REGION_PX_RANGE.0, REGION_PX_RANGE.1),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Region picked by a click.
pub struct FillPreview {
    /// Pixels that a fill would paint.
    pub region: MaskArtifact,
    /// Region pixels bordering the outside of the region or an edge.
    pub outline: MaskArtifact,
}

/// Edge pixels of `image`, before dilation. Fully transparent pixels are never edges.
pub fn edge_mask(image: &ImageArtifact, settings: &FillSettings) -> MillResult<MaskArtifact> {
    let t = i32::from(settings.edge_threshold);
    let values = image
        .pixels()
        .chunks_exact(4)
        .map(|px| {
            if px[3] == 0 {
                return 0;
            }
            let lum = luma(px[0], px[1], px[2]);
            let is_edge = if settings.edges_dark {
                lum <= t
            } else {
                lum >= 255 - t
            };
            if is_edge { MASK_ON } else { 0 }
        })
        .collect();
    MaskArtifact::new(image.width(), image.height(), values)
}

fn luma(r: u8, g: u8, b: u8) -> i32 {
    (0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b)).round() as i32
}

/// Region around `(x, y)` bounded by (dilated) edges, 4-connected.
///
/// Clicking an edge, or a region larger than `max_region_px`, is an execution error.
pub fn preview_from_click(
    image: &ImageArtifact,
    x: u32,
    y: u32,
    settings: &FillSettings,
) -> MillResult<FillPreview> {
    if x >= image.width() || y >= image.height() {
        return Err(MillError::validation(format!(
            "Click ({x}, {y}) is outside the {}x{} image.",
            image.width(),
            image.height()
        )));
    }
    let mut edges = edge_mask(image, settings)?;
    if settings.edge_dilate > 0 {
        edges = apply(&edges, 1, settings.edge_dilate, MorphOp::Dilate)?;
    }
    let region = flood_region(&edges, x, y, settings.max_region_px)?;
    let outline = region_outline(&region, &edges)?;
    Ok(FillPreview { region, outline })
}

fn flood_region(edges: &MaskArtifact, x: u32, y: u32, max_px: usize) -> MillResult<MaskArtifact> {
    let (w, h) = (edges.width() as usize, edges.height() as usize);
    let edge = edges.values();
    let start = y as usize * w + x as usize;
    if edge[start] != 0 {
        return Err(MillError::execution("Click is on an edge; pick inside a region."));
    }

    let mut region = vec![0u8; edge.len()];
    region[start] = MASK_ON;
    let mut count = 1usize;
    let mut queue = VecDeque::from([start]);
    while let Some(idx) = queue.pop_front() {
        let (cx, cy) = (idx % w, idx / w);
        let neighbours = [
            (cx > 0).then(|| idx - 1),
            (cx + 1 < w).then(|| idx + 1),
            (cy > 0).then(|| idx - w),
            (cy + 1 < h).then(|| idx + w),
        ];
        for n in neighbours.into_iter().flatten() {
            if region[n] != 0 || edge[n] != 0 {
                continue;
            }
            region[n] = MASK_ON;
            queue.push_back(n);
            count += 1;
            if count > max_px {
                return Err(MillError::execution(format!(
                    "Region too large (>{max_px}px). Increase Max region or fix gaps."
                )));
            }
        }
    }
    MaskArtifact::new(edges.width(), edges.height(), region)
}

// Pixels on the image border are never outline.
fn region_outline(region: &MaskArtifact, edges: &MaskArtifact) -> MillResult<MaskArtifact> {
    let (w, h) = (region.width() as usize, region.height() as usize);
    let (m, e) = (region.values(), edges.values());
    let mut out = vec![0u8; m.len()];
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let i = y * w + x;
            if m[i] == 0 {
                continue;
            }
            if [i - w, i + w, i - 1, i + 1]
                .iter()
                .any(|&n| m[n] == 0 || e[n] != 0)
            {
                out[i] = MASK_ON;
            }
        }
    }
    MaskArtifact::new(region.width(), region.height(), out)
}

/// Paint the set pixels of `region` with `rgb`, keeping alpha.
pub fn apply_fill(
    image: &ImageArtifact,
    region: &MaskArtifact,
    rgb: [u8; 3],
) -> MillResult<ImageArtifact> {
    if (region.width(), region.height()) != (image.width(), image.height()) {
        return Err(MillError::validation(format!(
            "Fill region is {}x{} but the image is {}x{}.",
            region.width(),
            region.height(),
            image.width(),
            image.height()
        )));
    }
    let mut pixels = image.pixels().to_vec();
    for (px, v) in pixels.chunks_exact_mut(4).zip(region.values()) {
        if *v != 0 {
            px[..3].copy_from_slice(&rgb);
        }
    }
    ImageArtifact::new(image.width(), image.height(), pixels)
}

/// Parse `#rrggbb`; the `#` is optional.
pub fn parse_hex_color(hex: &str) -> MillResult<[u8; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    match (digits.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => Ok([r, g, b]),
        _ => Err(MillError::validation(format!(
            "Invalid color '{hex}'. Expected #rrggbb."
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/fill.rs"]
mod tests;
