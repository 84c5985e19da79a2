use crate::{
    artifact::model::ImageArtifact,
    foundation::error::MillResult,
    tuning::model::{ParamMap, param_number},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Feature channel extracted before thresholding.
pub enum ColorMode {
    /// Leave the image unchanged (`colorMode = 0`).
    Passthrough,
    /// Integer luminance (`1`).
    Luminance,
    /// One HSV channel (`2`).
    Hsv(HsvChannel),
    /// Inverted luminance (`3` and above).
    InvertedLuminance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// HSV component.
pub enum HsvChannel {
    /// Hue.
    Hue,
    /// Saturation.
    Saturation,
    /// Value.
    Value,
}

impl ColorMode {
    /// Read `colorMode` / `hsvChannel`.
    pub fn from_params(params: &ParamMap) -> Self {
        let channel = match param_number(params, "hsvChannel", 2.0).floor() as i64 {
            i64::MIN..=0 => HsvChannel::Hue,
            1 => HsvChannel::Saturation,
            _ => HsvChannel::Value,
        };
        match param_number(params, "colorMode", 1.0).floor() as i64 {
            0 => Self::Passthrough,
            1 => Self::Luminance,
            2 => Self::Hsv(channel),
            _ => Self::InvertedLuminance,
        }
    }
}

/// Integer Rec.601-style luminance used by every gray conversion.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 77 + u32::from(g) * 150 + u32::from(b) * 29) >> 8) as u8
}

/// Convert to a gray feature image; alpha is preserved.
pub fn color_features(image: &ImageArtifact, mode: ColorMode) -> MillResult<ImageArtifact> {
    if mode == ColorMode::Passthrough {
        return Ok(image.clone());
    }
    let mut out = Vec::with_capacity(image.pixels().len());
    for px in image.pixels().chunks_exact(4) {
        let (r, g, b, a) = (px[0], px[1], px[2], px[3]);
        let y = match mode {
            ColorMode::Passthrough | ColorMode::Luminance => luminance(r, g, b),
            ColorMode::InvertedLuminance => 255 - luminance(r, g, b),
            ColorMode::Hsv(ch) => {
                let (h, s, v) = rgb_to_hsv01(r, g, b);
                let f = match ch {
                    HsvChannel::Hue => h,
                    HsvChannel::Saturation => s,
                    HsvChannel::Value => v,
                };
                (f * 255.0).clamp(0.0, 255.0) as u8
            }
        };
        out.extend_from_slice(&[y, y, y, a]);
    }
    ImageArtifact::new(image.width(), image.height(), out)
}

fn rgb_to_hsv01(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let (r, g, b) = (
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    );
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;

    let mut h = 0.0;
    if d != 0.0 {
        h = if max == r {
            ((g - b) / d) % 6.0
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        h /= 6.0;
        if h < 0.0 {
            h += 1.0;
        }
    }
    let s = if max == 0.0 { 0.0 } else { d / max };
    (h, s, max)
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/color.rs"]
mod tests;
