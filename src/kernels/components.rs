use std::collections::VecDeque;

use crate::{
    artifact::model::{MASK_ON, MaskArtifact},
    foundation::error::MillResult,
    tuning::model::{ParamMap, param_number},
};

/// Read `cleanMinArea` (non-negative, floored).
pub fn min_area(params: &ParamMap) -> usize {
    param_number(params, "cleanMinArea", 12.0).floor().max(0.0) as usize
}

/// Erase 4-connected set regions with fewer than `min_area` pixels.
///
/// Surviving pixels are normalized to 255.
pub fn remove_small_components(mask: &MaskArtifact, min_area: usize) -> MillResult<MaskArtifact> {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let src = mask.values();
    let mut out: Vec<u8> = src.iter().map(|v| if *v != 0 { MASK_ON } else { 0 }).collect();
    if min_area <= 1 {
        return MaskArtifact::new(mask.width(), mask.height(), out);
    }

    let mut visited = vec![false; src.len()];
    let mut queue = VecDeque::new();
    let mut members = Vec::new();
    for start in 0..src.len() {
        if src[start] == 0 || visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);
        members.clear();
        while let Some(idx) = queue.pop_front() {
            members.push(idx);
            let (x, y) = (idx % w, idx / w);
            let neighbours = [
                (x > 0).then(|| idx - 1),
                (x + 1 < w).then(|| idx + 1),
                (y > 0).then(|| idx - w),
                (y + 1 < h).then(|| idx + w),
            ];
            for n in neighbours.into_iter().flatten() {
                if src[n] != 0 && !visited[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }
        if members.len() < min_area {
            for &i in &members {
                out[i] = 0;
            }
        }
    }
    MaskArtifact::new(mask.width(), mask.height(), out)
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/components.rs"]
mod tests;
