use crate::{
    artifact::model::{MASK_ON, MaskArtifact},
    foundation::error::MillResult,
};

/// 1px outline of the set regions.
///
/// A set pixel is an edge when it touches the image border or has an unset 4-neighbour.
pub fn edge_from_mask(mask: &MaskArtifact) -> MillResult<MaskArtifact> {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let src = mask.values();
    let mut out = vec![0u8; src.len()];
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if src[i] == 0 {
                continue;
            }
            let border = x == 0 || y == 0 || x == w - 1 || y == h - 1;
            if border
                || src[i - 1] == 0
                || src[i + 1] == 0
                || src[i - w] == 0
                || src[i + w] == 0
            {
                out[i] = MASK_ON;
            }
        }
    }
    MaskArtifact::new(mask.width(), mask.height(), out)
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/edge.rs"]
mod tests;
