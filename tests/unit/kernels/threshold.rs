use super::*;
use crate::tuning::model::ParamValue;

#[test]
fn white_is_background() {
    let img = ImageArtifact::filled(10, 10, [255; 4]).unwrap();
    let mask = threshold(&img, 128).unwrap();
    assert_eq!((mask.width(), mask.height()), (10, 10));
    assert_eq!(mask.count_set(), 0);
}

#[test]
fn dark_pixels_are_set_to_255() {
    let img = ImageArtifact::new(2, 1, vec![0, 0, 0, 255, 200, 200, 200, 255]).unwrap();
    let mask = threshold(&img, 128).unwrap();
    assert_eq!(mask.values(), &[MASK_ON, 0]);
}

#[test]
fn manual_t_is_clamped() {
    let m: ParamMap = [("manualT".to_string(), ParamValue::Number(900.0))].into();
    assert_eq!(manual_threshold(&m), 255);
    assert_eq!(manual_threshold(&ParamMap::new()), 128);
}
