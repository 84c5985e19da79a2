use std::io::Cursor;

use anyhow::Context;

use crate::{
    artifact::model::{Artifact, ImageArtifact, MaskArtifact},
    foundation::error::{MillError, MillResult},
};

/// Decode encoded image bytes (PNG, JPEG, ...) into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> MillResult<ImageArtifact> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageArtifact::new(width, height, rgba.into_raw())
}

/// Encode an image as PNG.
pub fn encode_image_png(img: &ImageArtifact) -> MillResult<Vec<u8>> {
    let buf = image::RgbaImage::from_raw(img.width(), img.height(), img.pixels().to_vec())
        .ok_or_else(|| MillError::validation("image buffer does not match its dimensions"))?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(buf)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode image as PNG")?;
    Ok(out)
}

/// Encode a mask as an 8-bit grayscale PNG (set pixels white).
pub fn encode_mask_png(mask: &MaskArtifact) -> MillResult<Vec<u8>> {
    let values = mask.values().iter().map(|v| if *v != 0 { 255 } else { 0 }).collect();
    let buf = image::GrayImage::from_raw(mask.width(), mask.height(), values)
        .ok_or_else(|| MillError::validation("mask buffer does not match its dimensions"))?;
    let mut out = Vec::new();
    image::DynamicImage::ImageLuma8(buf)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode mask as PNG")?;
    Ok(out)
}

/// Bytes and conventional file extension for a final artifact.
///
/// Image lists have no single-file form and are rejected.
pub fn encode_artifact(artifact: &Artifact) -> MillResult<(Vec<u8>, &'static str)> {
    match artifact {
        Artifact::Image(img) => Ok((encode_image_png(img)?, "png")),
        Artifact::Mask(mask) => Ok((encode_mask_png(mask)?, "png")),
        Artifact::Svg(svg) => Ok((svg.markup().as_bytes().to_vec(), "svg")),
        Artifact::Pdf(pdf) => Ok((pdf.bytes.clone(), "pdf")),
        Artifact::ImageList(list) => Err(MillError::validation(format!(
            "imageList with {} item(s) cannot be written as a single file",
            list.items.len()
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/artifact/codec.rs"]
mod tests;
