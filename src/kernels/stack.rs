use crate::{
    artifact::model::{ImageArtifact, ImageListArtifact},
    foundation::error::{MillError, MillResult},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Stacking direction.
pub enum StackAxis {
    /// Top to bottom, left aligned.
    Vertical,
    /// Left to right, top aligned.
    Horizontal,
}

/// Paste every image of the list into one canvas. Uncovered pixels are transparent.
pub fn stack_images(list: &ImageListArtifact, axis: StackAxis) -> MillResult<ImageArtifact> {
    let label = match axis {
        StackAxis::Vertical => "Stack vertical",
        StackAxis::Horizontal => "Stack horizontal",
    };
    if list.items.is_empty() {
        return Err(MillError::execution(format!("{label}: empty imageList.")));
    }

    let (out_w, out_h) = match axis {
        StackAxis::Vertical => (
            list.items.iter().map(ImageArtifact::width).max().unwrap_or(1),
            summed_extent(list.items.iter().map(ImageArtifact::height), label)?,
        ),
        StackAxis::Horizontal => (
            summed_extent(list.items.iter().map(ImageArtifact::width), label)?,
            list.items.iter().map(ImageArtifact::height).max().unwrap_or(1),
        ),
    };

    let stride = out_w as usize * 4;
    let mut dst = vec![0u8; stride * out_h as usize];
    let (mut ox, mut oy) = (0usize, 0usize);
    for item in &list.items {
        let row_len = item.width() as usize * 4;
        for (y, row) in item.pixels().chunks_exact(row_len).enumerate() {
            let start = (oy + y) * stride + ox * 4;
            dst[start..start + row_len].copy_from_slice(row);
        }
        match axis {
            StackAxis::Vertical => oy += item.height() as usize,
            StackAxis::Horizontal => ox += item.width() as usize,
        }
    }
    ImageArtifact::new(out_w, out_h, dst)
}

fn summed_extent(extents: impl IntoIterator<Item = u32>, label: &str) -> MillResult<u32> {
    extents
        .into_iter()
        .try_fold(0u32, u32::checked_add)
        .ok_or_else(|| MillError::execution(format!("{label}: stacked size overflows.")))
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/stack.rs"]
mod tests;
