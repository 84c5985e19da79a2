use std::fmt::Write as _;

use crate::{
    artifact::model::{MaskArtifact, SvgArtifact},
    foundation::error::MillResult,
    tuning::model::{ParamMap, param_flag, param_number, param_text},
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// SVG stamping settings.
pub struct SvgParams {
    /// Integer upscale factor (>= 1).
    pub scale: u32,
    /// Omit the white background rectangle.
    pub transparent_bg: bool,
    /// Fill color for set pixels.
    pub color: String,
}

impl SvgParams {
    /// Read `scale` / `transparentBg` / `color`.
    pub fn from_params(params: &ParamMap) -> Self {
        let color = param_text(params, "color", "#000");
        Self {
            scale: param_number(params, "scale", 1.0).floor().max(1.0) as u32,
            transparent_bg: param_flag(params, "transparentBg", true),
            color: if color.trim().is_empty() {
                "#000".to_string()
            } else {
                color.to_string()
            },
        }
    }
}

/// Stamp one `scale`-sized square per set pixel into a single path.
pub fn mask_to_svg(mask: &MaskArtifact, params: &SvgParams) -> MillResult<SvgArtifact> {
    let s = params.scale;
    let (out_w, out_h) = (mask.width() * s, mask.height() * s);
    let w = mask.width() as usize;

    let mut d = String::new();
    for (i, v) in mask.values().iter().enumerate() {
        if *v == 0 {
            continue;
        }
        let (px, py) = ((i % w) as u32 * s, (i / w) as u32 * s);
        let _ = write!(d, "M{px} {py}h{s}v{s}h-{s}Z");
    }

    let mut markup = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{out_w}" height="{out_h}" viewBox="0 0 {out_w} {out_h}">"#
    );
    if !params.transparent_bg {
        let _ = write!(
            markup,
            r#"<rect x="0" y="0" width="{out_w}" height="{out_h}" fill="white"/>"#
        );
    }
    if !d.is_empty() {
        let _ = write!(
            markup,
            r#"<path d="{d}" fill="{}" stroke="none"/>"#,
            escape_attr(&params.color)
        );
    }
    markup.push_str("</svg>");
    SvgArtifact::new(out_w, out_h, markup)
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/svg.rs"]
mod tests;
