use super::*;
use crate::tuning::model::ParamValue;

fn mode(color: f64, channel: f64) -> ColorMode {
    let m: ParamMap = [
        ("colorMode".to_string(), ParamValue::Number(color)),
        ("hsvChannel".to_string(), ParamValue::Number(channel)),
    ]
    .into();
    ColorMode::from_params(&m)
}

#[test]
fn luminance_extremes() {
    assert_eq!(luminance(255, 255, 255), 255);
    assert_eq!(luminance(0, 0, 0), 0);
}

#[test]
fn mode_mapping() {
    assert_eq!(mode(0.0, 2.0), ColorMode::Passthrough);
    assert_eq!(mode(1.0, 0.0), ColorMode::Luminance);
    assert_eq!(mode(2.0, 1.0), ColorMode::Hsv(HsvChannel::Saturation));
    assert_eq!(mode(3.0, 0.0), ColorMode::InvertedLuminance);
}

#[test]
fn features_are_gray_and_keep_alpha() {
    let img = ImageArtifact::filled(2, 2, [255, 0, 0, 128]).unwrap();

    let sat = color_features(&img, ColorMode::Hsv(HsvChannel::Saturation)).unwrap();
    assert!(sat.pixels().chunks(4).all(|p| p == [255, 255, 255, 128]));

    let inv = color_features(&img, ColorMode::InvertedLuminance).unwrap();
    let l = luminance(255, 0, 0);
    assert!(inv.pixels().chunks(4).all(|p| p == [255 - l, 255 - l, 255 - l, 128]));
}
