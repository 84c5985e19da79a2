use super::*;
use crate::tuning::model::ParamValue;

fn params(algo: f64, max_w: f64) -> ResizeParams {
    let m: ParamMap = [
        ("resizeAlgo".to_string(), ParamValue::Number(algo)),
        ("targetMaxW".to_string(), ParamValue::Number(max_w)),
    ]
    .into();
    ResizeParams::from_params(&m)
}

#[test]
fn small_images_pass_through() {
    let img = ImageArtifact::filled(10, 10, [255; 4]).unwrap();
    assert_eq!(resize(&img, params(1.0, 1200.0)).unwrap(), img);
}

#[test]
fn downscale_keeps_aspect() {
    let img = ImageArtifact::filled(400, 200, [10, 20, 30, 255]).unwrap();
    for algo in [0.0, 1.0] {
        let out = resize(&img, params(algo, 100.0)).unwrap();
        assert_eq!((out.width(), out.height()), (100, 50));
        assert!(out.pixels().chunks(4).all(|px| px == [10, 20, 30, 255]));
    }
}

#[test]
fn filter_selection_from_algo() {
    assert_eq!(params(0.0, 100.0).filter, ResizeFilter::Nearest);
    assert_eq!(params(3.0, 100.0).filter, ResizeFilter::Bilinear);
    assert_eq!(ResizeParams::from_params(&ParamMap::new()).target_max_w, 1200);
}

#[test]
fn nearest_keeps_hard_edges_and_bilinear_blends() {
    // left half black, right half white
    let mut px = Vec::new();
    for _ in 0..4 {
        for x in 0..8 {
            let v = if x < 4 { 0 } else { 255 };
            px.extend_from_slice(&[v, v, v, 255]);
        }
    }
    let img = ImageArtifact::new(8, 4, px).unwrap();

    let near = resize(&img, params(0.0, 4.0)).unwrap();
    assert_eq!((near.width(), near.height()), (4, 2));
    assert!(near.pixels().chunks(4).all(|p| p[0] == 0 || p[0] == 255));

    let smooth = resize(&img, params(1.0, 2.0)).unwrap();
    assert_eq!((smooth.width(), smooth.height()), (2, 1));
    assert!(smooth.pixels()[0] < smooth.pixels()[4]);
    assert!(smooth.pixels().chunks(4).all(|p| p[3] == 255));
}
