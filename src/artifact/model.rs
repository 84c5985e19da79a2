use crate::foundation::error::{MillError, MillResult};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
/// Discriminant of an [`Artifact`], used for declared op IO and runtime checks.
pub enum ArtifactType {
    /// Dense RGBA raster.
    Image,
    /// Single-channel byte mask.
    Mask,
    /// Serialized SVG document.
    Svg,
    /// Encoded PDF document (terminal).
    Pdf,
    /// Ordered list of images.
    ImageList,
}

impl ArtifactType {
    /// Wire name (`image`, `mask`, `svg`, `pdf`, `imageList`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Mask => "mask",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::ImageList => "imageList",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// RGBA8 image, row-major, straight alpha.
pub struct ImageArtifact {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageArtifact {
    /// Wrap an RGBA buffer; dimensions must be positive and match the buffer length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> MillResult<Self> {
        check_dims(width, height, "image")?;
        let expected = pixel_count(width, height) * 4;
        if pixels.len() != expected {
            return Err(MillError::validation(format!(
                "image buffer has {} bytes, expected {expected} for {width}x{height} RGBA",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image filled with a single RGBA color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> MillResult<Self> {
        check_dims(width, height, "image")?;
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(pixel_count(width, height) * 4)
            .collect();
        Self::new(width, height, pixels)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume into the RGBA buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Single-channel mask. `0` is unset; any non-zero value is set (producers emit 255).
pub struct MaskArtifact {
    width: u32,
    height: u32,
    values: Vec<u8>,
}

/// Canonical "set" value written by every mask producer.
pub const MASK_ON: u8 = 255;

impl MaskArtifact {
    /// Wrap a mask buffer; dimensions must be positive and match the buffer length.
    pub fn new(width: u32, height: u32, values: Vec<u8>) -> MillResult<Self> {
        check_dims(width, height, "mask")?;
        let expected = pixel_count(width, height);
        if values.len() != expected {
            return Err(MillError::validation(format!(
                "mask buffer has {} bytes, expected {expected} for {width}x{height}",
                values.len()
            )));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mask bytes.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Number of set pixels.
    pub fn count_set(&self) -> usize {
        self.values.iter().filter(|v| **v != 0).count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Full SVG document with its nominal size.
pub struct SvgArtifact {
    width: u32,
    height: u32,
    markup: String,
}

impl SvgArtifact {
    /// Wrap SVG markup.
    pub fn new(width: u32, height: u32, markup: String) -> MillResult<Self> {
        check_dims(width, height, "svg")?;
        Ok(Self {
            width,
            height,
            markup,
        })
    }

    /// Width in SVG units.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in SVG units.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Serialized document.
    pub fn markup(&self) -> &str {
        &self.markup
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Encoded PDF document.
pub struct PdfArtifact {
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
    /// MIME type (always `application/pdf` for built-in producers).
    pub mime: String,
    /// Suggested file name for downloads.
    pub filename_hint: Option<String>,
}

impl PdfArtifact {
    /// PDF artifact with the standard MIME type.
    pub fn new(bytes: Vec<u8>, filename_hint: Option<String>) -> Self {
        Self {
            bytes,
            mime: "application/pdf".to_string(),
            filename_hint,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Ordered collection of images for multi-input ops.
///
/// Construction accepts an empty list; consuming ops reject it at run time.
pub struct ImageListArtifact {
    /// Images in order.
    pub items: Vec<ImageArtifact>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A typed value flowing between pipeline steps.
pub enum Artifact {
    /// RGBA raster.
    Image(ImageArtifact),
    /// Byte mask.
    Mask(MaskArtifact),
    /// SVG document.
    Svg(SvgArtifact),
    /// PDF document.
    Pdf(PdfArtifact),
    /// List of images.
    ImageList(ImageListArtifact),
}

impl Artifact {
    /// Discriminant of this artifact.
    pub fn kind(&self) -> ArtifactType {
        match self {
            Self::Image(_) => ArtifactType::Image,
            Self::Mask(_) => ArtifactType::Mask,
            Self::Svg(_) => ArtifactType::Svg,
            Self::Pdf(_) => ArtifactType::Pdf,
            Self::ImageList(_) => ArtifactType::ImageList,
        }
    }

    /// Width/height for sized artifacts; `None` for pdf and image lists.
    pub fn dims(&self) -> Option<(u32, u32)> {
        match self {
            Self::Image(a) => Some((a.width, a.height)),
            Self::Mask(a) => Some((a.width, a.height)),
            Self::Svg(a) => Some((a.width, a.height)),
            Self::Pdf(_) | Self::ImageList(_) => None,
        }
    }

    /// Borrow as an image or fail with an IO-mismatch message.
    pub fn as_image(&self) -> MillResult<&ImageArtifact> {
        match self {
            Self::Image(a) => Ok(a),
            other => Err(io_mismatch(ArtifactType::Image, other.kind())),
        }
    }

    /// Borrow as a mask or fail with an IO-mismatch message.
    pub fn as_mask(&self) -> MillResult<&MaskArtifact> {
        match self {
            Self::Mask(a) => Ok(a),
            other => Err(io_mismatch(ArtifactType::Mask, other.kind())),
        }
    }

    /// Borrow as an image list or fail with an IO-mismatch message.
    pub fn as_image_list(&self) -> MillResult<&ImageListArtifact> {
        match self {
            Self::ImageList(a) => Ok(a),
            other => Err(io_mismatch(ArtifactType::ImageList, other.kind())),
        }
    }
}

impl From<ImageArtifact> for Artifact {
    fn from(a: ImageArtifact) -> Self {
        Self::Image(a)
    }
}

impl From<MaskArtifact> for Artifact {
    fn from(a: MaskArtifact) -> Self {
        Self::Mask(a)
    }
}

impl From<SvgArtifact> for Artifact {
    fn from(a: SvgArtifact) -> Self {
        Self::Svg(a)
    }
}

impl From<PdfArtifact> for Artifact {
    fn from(a: PdfArtifact) -> Self {
        Self::Pdf(a)
    }
}

impl From<ImageListArtifact> for Artifact {
    fn from(a: ImageListArtifact) -> Self {
        Self::ImageList(a)
    }
}

/// Error used for every expected/actual artifact type disagreement.
pub fn io_mismatch(expected: ArtifactType, got: ArtifactType) -> MillError {
    MillError::execution(format!("IO mismatch: expected {expected}, got {got}"))
}

pub(crate) fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn check_dims(width: u32, height: u32, what: &str) -> MillResult<()> {
    if width == 0 || height == 0 {
        return Err(MillError::validation(format!(
            "{what} width/height must be > 0 (got {width}x{height})"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/artifact/model.rs"]
mod tests;
