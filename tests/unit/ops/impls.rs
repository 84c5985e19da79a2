use super::*;
use crate::artifact::model::{ArtifactType, ImageArtifact, MaskArtifact};

fn white(w: u32, h: u32) -> Artifact {
    ImageArtifact::filled(w, h, [255, 255, 255, 255]).unwrap().into()
}

#[test]
fn table_covers_every_dispatch_id() {
    let table = default_implementations();
    assert_eq!(table.ids().count(), DispatchOpId::ALL.len());
}

#[test]
fn threshold_kernel_uses_manual_t() {
    let table = default_implementations();
    let imp = table.get(DispatchOpId::SegmentationThreshold).unwrap();
    let params: ParamMap = [("manualT".to_string(), 128.0.into())].into();
    let out = (imp.native)(&white(4, 4), &params).unwrap();
    let mask = out.as_mask().unwrap();
    assert_eq!(mask.count_set(), 0);
    assert_eq!((mask.width(), mask.height()), (4, 4));
}

#[test]
fn alternate_entry_matches_native_output() {
    let table = default_implementations();
    let imp = table.get(DispatchOpId::EdgeExtract).unwrap();
    let mask: Artifact = MaskArtifact::new(3, 3, vec![255; 9]).unwrap().into();
    let params = ParamMap::new();
    assert_eq!(
        (imp.native)(&mask, &params).unwrap(),
        (imp.alternate)(&mask, &params).unwrap()
    );
}

#[test]
fn kernels_reject_wrong_input_kind() {
    let table = default_implementations();
    let imp = table.get(DispatchOpId::SvgCreate).unwrap();
    let err = (imp.native)(&white(2, 2), &ParamMap::new()).unwrap_err();
    assert_eq!(err.message(), "IO mismatch: expected mask, got image");
}

#[test]
fn svg_create_produces_svg() {
    let table = default_implementations();
    let imp = table.get(DispatchOpId::SvgCreate).unwrap();
    let mask: Artifact = MaskArtifact::new(2, 1, vec![255, 0]).unwrap().into();
    let out = (imp.native)(&mask, &ParamMap::new()).unwrap();
    assert_eq!(out.kind(), ArtifactType::Svg);
}
