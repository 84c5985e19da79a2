use super::*;
use crate::tuning::model::ParamValue;

#[test]
fn stamps_scaled_squares() {
    let m = MaskArtifact::new(2, 2, vec![0, 255, 0, 0]).unwrap();
    let p = SvgParams {
        scale: 3,
        transparent_bg: true,
        color: "#3bca1e".into(),
    };
    let svg = mask_to_svg(&m, &p).unwrap();
    assert_eq!((svg.width(), svg.height()), (6, 6));
    assert!(svg.markup().contains(r#"d="M3 0h3v3h-3Z""#));
    assert!(svg.markup().contains(r##"fill="#3bca1e""##));
    assert!(!svg.markup().contains("<rect"));
}

#[test]
fn empty_mask_has_no_path_but_optional_background() {
    let m = MaskArtifact::new(1, 1, vec![0]).unwrap();
    let p = SvgParams {
        scale: 1,
        transparent_bg: false,
        color: "#000".into(),
    };
    let svg = mask_to_svg(&m, &p).unwrap();
    assert!(svg.markup().contains(r#"fill="white""#));
    assert!(!svg.markup().contains("<path"));
    assert!(svg.markup().ends_with("</svg>"));
}

#[test]
fn params_treat_numeric_bg_flag_and_blank_color() {
    let m: ParamMap = [
        ("transparentBg".to_string(), ParamValue::Number(0.0)),
        ("color".to_string(), ParamValue::Text(" ".into())),
        ("scale".to_string(), ParamValue::Number(0.0)),
    ]
    .into();
    let p = SvgParams::from_params(&m);
    assert!(!p.transparent_bg);
    assert_eq!(p.color, "#000");
    assert_eq!(p.scale, 1);
}
