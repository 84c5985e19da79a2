use super::*;
use crate::{artifact::model::ImageArtifact, tuning::model::ParamValue};

#[test]
fn contain_centers_inside_margins() {
    let opts = PdfOptions::default();
    let p = placement(&opts, 100, 100);
    assert!((p.draw_w - (595.28 - 36.0)).abs() < 1e-9);
    assert!((p.draw_w - p.draw_h).abs() < 1e-9);
    assert!((p.offset_x - 18.0).abs() < 1e-9);

    let stretched = placement(
        &PdfOptions {
            contain: false,
            ..opts
        },
        10,
        1,
    );
    assert_eq!((stretched.draw_w, stretched.offset_y), (595.28, 0.0));
}

#[test]
fn options_read_margin_and_contain() {
    let m: ParamMap = [
        ("marginPt".to_string(), ParamValue::Number(0.0)),
        ("contain".to_string(), ParamValue::Bool(false)),
    ]
    .into();
    let o = PdfOptions::from_params(&m);
    assert_eq!(o.margin_pt, 0.0);
    assert!(!o.contain);
    assert_eq!(o.jpeg_quality, 92);
}

#[test]
fn writes_one_page_per_image_as_jpeg_xobjects() {
    let list = ImageListArtifact {
        items: vec![
            ImageArtifact::filled(4, 2, [0, 128, 255, 255]).unwrap(),
            ImageArtifact::filled(2, 4, [0, 0, 0, 0]).unwrap(),
        ],
    };
    let pdf = images_to_pdf(&list, &PdfOptions::default(), Some("out.pdf")).unwrap();
    assert_eq!(pdf.mime, "application/pdf");
    assert_eq!(pdf.filename_hint.as_deref(), Some("out.pdf"));
    assert!(pdf.bytes.starts_with(b"%PDF-1.4"));

    let doc = Document::load_mem(&pdf.bytes).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 2);

    let widths: Vec<i64> = pages
        .values()
        .map(|page_id| {
            let page = doc.get_dictionary(*page_id).unwrap();
            let resources = page.get(b"Resources").and_then(Object::as_dict).unwrap();
            let xobjects = resources.get(b"XObject").and_then(Object::as_dict).unwrap();
            let image_id = xobjects.get(b"Im0").and_then(Object::as_reference).unwrap();
            let image = doc.get_object(image_id).and_then(Object::as_stream).unwrap();
            let filter = image.dict.get(b"Filter").and_then(Object::as_name).unwrap();
            assert_eq!(filter, b"DCTDecode");
            assert!(image.content.starts_with(&[0xFF, 0xD8]));
            image.dict.get(b"Width").and_then(Object::as_i64).unwrap()
        })
        .collect();
    assert_eq!(widths, [4, 2]);
}

#[test]
fn empty_list_fails() {
    let err =
        images_to_pdf(&ImageListArtifact::default(), &PdfOptions::default(), None).unwrap_err();
    assert_eq!(err.message(), "PDF: empty imageList.");
}
