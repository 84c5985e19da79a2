use anyhow::Context;
use lopdf::{
    Dictionary, Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

use crate::{
    artifact::model::{ImageListArtifact, PdfArtifact},
    foundation::error::{MillError, MillResult},
    tuning::model::{ParamMap, param_flag, param_number},
};

#[derive(Clone, Copy, Debug, PartialEq)]
/// Page layout for [`images_to_pdf`].
pub struct PdfOptions {
    /// Page width in points.
    pub page_width_pt: f64,
    /// Page height in points.
    pub page_height_pt: f64,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    /// Fit inside the margins keeping aspect (`true`) or stretch to the page.
    pub contain: bool,
    /// Margin used when `contain` is set.
    pub margin_pt: f64,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            jpeg_quality: 92,
            contain: true,
            margin_pt: 18.0,
        }
    }
}

impl PdfOptions {
    /// A4 defaults with `marginPt` / `contain` taken from `params`.
    pub fn from_params(params: &ParamMap) -> Self {
        let d = Self::default();
        Self {
            margin_pt: param_number(params, "marginPt", d.margin_pt).max(0.0),
            contain: param_flag(params, "contain", d.contain),
            ..d
        }
    }
}

/// Placement of one image on its page, in points (PDF origin bottom-left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Drawn width.
    pub draw_w: f64,
    /// Drawn height.
    pub draw_h: f64,
    /// Left offset.
    pub offset_x: f64,
    /// Bottom offset.
    pub offset_y: f64,
}

/// Centered placement of a `px_w` x `px_h` image.
pub fn placement(opts: &PdfOptions, px_w: u32, px_h: u32) -> Placement {
    let (page_w, page_h) = (opts.page_width_pt, opts.page_height_pt);
    if !opts.contain {
        return Placement {
            draw_w: page_w,
            draw_h: page_h,
            offset_x: 0.0,
            offset_y: 0.0,
        };
    }
    let max_w = (page_w - 2.0 * opts.margin_pt).max(1.0);
    let max_h = (page_h - 2.0 * opts.margin_pt).max(1.0);
    let img_aspect = f64::from(px_w) / f64::from(px_h);
    let (draw_w, draw_h) = if img_aspect >= max_w / max_h {
        (max_w, max_w / img_aspect)
    } else {
        (max_h * img_aspect, max_h)
    };
    Placement {
        draw_w,
        draw_h,
        offset_x: (page_w - draw_w) / 2.0,
        offset_y: (page_h - draw_h) / 2.0,
    }
}

/// One page per image, each embedded as a DCT (JPEG) XObject.
///
/// Transparent pixels are flattened over white before encoding.
pub fn images_to_pdf(
    list: &ImageListArtifact,
    opts: &PdfOptions,
    filename_hint: Option<&str>,
) -> MillResult<PdfArtifact> {
    if list.items.is_empty() {
        return Err(MillError::execution("PDF: empty imageList."));
    }

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        Object::Real(opts.page_width_pt as f32),
        Object::Real(opts.page_height_pt as f32),
    ];

    let mut kids = Vec::with_capacity(list.items.len());
    for item in &list.items {
        let jpeg = encode_jpeg(item.pixels(), item.width(), item.height(), opts.jpeg_quality)?;
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(item.width()),
                "Height" => i64::from(item.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let p = placement(opts, item.width(), item.height());
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(p.draw_w as f32),
                        0.into(),
                        0.into(),
                        Object::Real(p.draw_h as f32),
                        Object::Real(p.offset_x as f32),
                        Object::Real(p.offset_y as f32),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content = content.encode().context("encode PDF page content")?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).context("write PDF document")?;
    Ok(PdfArtifact::new(bytes, filename_hint.map(str::to_string)))
}

fn encode_jpeg(rgba: &[u8], width: u32, height: u32, quality: u8) -> MillResult<Vec<u8>> {
    let rgb: Vec<u8> = rgba
        .chunks_exact(4)
        .flat_map(|px| {
            let a = u16::from(px[3]);
            let over_white = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
            [over_white(px[0]), over_white(px[1]), over_white(px[2])]
        })
        .collect();
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode(&rgb, width, height, image::ExtendedColorType::Rgb8)
        .context("encode PDF page as JPEG")?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/pdf.rs"]
mod tests;
