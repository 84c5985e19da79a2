use super::*;
use crate::tuning::model::ParamValue;

fn dot(w: u32, h: u32, x: u32, y: u32) -> MaskArtifact {
    let mut v = vec![0u8; (w * h) as usize];
    v[(y * w + x) as usize] = 1;
    MaskArtifact::new(w, h, v).unwrap()
}

#[test]
fn dilate_grows_and_erode_shrinks() {
    let m = dot(5, 5, 2, 2);
    let grown = apply(&m, 1, 1, MorphOp::Dilate).unwrap();
    assert_eq!(grown.count_set(), 9);
    assert!(grown.values().iter().all(|v| *v == 0 || *v == MASK_ON));

    let back = apply(&grown, 1, 1, MorphOp::Erode).unwrap();
    assert_eq!(back.values(), apply(&m, 0, 1, MorphOp::Dilate).unwrap().values());
}

#[test]
fn open_removes_specks_close_fills_holes() {
    assert_eq!(apply(&dot(5, 5, 2, 2), 1, 1, MorphOp::Open).unwrap().count_set(), 0);

    let mut v = vec![255u8; 25];
    v[12] = 0;
    let holed = MaskArtifact::new(5, 5, v).unwrap();
    assert_eq!(apply(&holed, 1, 1, MorphOp::Close).unwrap().count_set(), 25);
}

#[test]
fn input_is_never_mutated() {
    let m = dot(4, 4, 1, 1);
    let before = m.clone();
    let _ = apply(&m, 1, 3, MorphOp::Close).unwrap();
    assert_eq!(m, before);
}

#[test]
fn params_mapping() {
    let m: ParamMap = [
        ("morphAlgo".to_string(), ParamValue::Number(4.0)),
        ("morphK".to_string(), ParamValue::Number(4.0)),
        ("morphIters".to_string(), ParamValue::Number(50.0)),
    ]
    .into();
    let p = MorphologyParams::from_params(&m);
    assert_eq!(p.op, Some(MorphOp::Open));
    assert_eq!(p.radius, 2);
    assert_eq!(p.iterations, 20);

    let off: ParamMap = [("morphAlgo".to_string(), ParamValue::Number(0.0))].into();
    let mask = dot(3, 3, 1, 1);
    assert_eq!(morphology(&mask, MorphologyParams::from_params(&off)).unwrap(), mask);
}
