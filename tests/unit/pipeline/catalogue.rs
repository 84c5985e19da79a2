use super::*;
use crate::{artifact::model::ImageArtifact, tuning::registry::default_registry};

fn user(id: &str, title: &str) -> PipelineDef {
    PipelineDef {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        implemented: true,
        ops: vec![PipelineOpInstance::new("u.1", "op.util.pass.image")],
    }
}

#[test]
fn user_pipeline_shadows_builtin() {
    let cat = Catalogue::new(vec![user("segmentation", "Mine"), user("extra", "Extra")]);
    assert_eq!(cat.get_pipeline("segmentation").unwrap().title, "Mine");
    assert_eq!(cat.get_builtin("segmentation").unwrap().title, "Segmentation");

    let listed = cat.list_pipelines();
    assert_eq!(
        listed.iter().filter(|p| p.id == "segmentation").count(),
        1
    );
    let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["edge", "svg", "cleanup", "surface", "segmentation", "extra"]);
}

#[test]
fn instance_ids_are_one_based() {
    assert_eq!(create_instance_id("edge", 0), "edge.1");
    let cat = Catalogue::new(Vec::new());
    let svg = cat.get_pipeline("svg").unwrap();
    assert_eq!(svg.ops.last().unwrap().instance_id, "svg.5");
    assert!(!cat.get_pipeline("surface").unwrap().implemented);
}

#[test]
fn builtin_pipelines_reference_known_ops() {
    let cat = Catalogue::new(Vec::new());
    for p in cat.builtins() {
        for inst in &p.ops {
            assert!(cat.get_op(&inst.op_id).is_some(), "{}", inst.op_id);
        }
    }
}

#[test]
fn every_tuning_id_exists_in_registry() {
    let reg = default_registry().unwrap();
    for op in builtin_ops() {
        if let Some(t) = op.tuning_id() {
            assert!(reg.get(t).is_some(), "{} -> {t}", op.id);
        }
    }
}

#[test]
fn from_parts_rejects_duplicate_op_ids() {
    let mut ops = builtin_ops();
    ops.push(ops[0].clone());
    let err = Catalogue::from_parts(ops, Vec::new(), Vec::new()).unwrap_err();
    assert!(err.to_string().contains("duplicate op id: op.seg.resize"));
}

#[test]
fn stack_op_runs_inline() {
    let cat = Catalogue::new(Vec::new());
    let op = cat.get_op("op.imageList.stackVertical").unwrap();
    let OpKind::Inline { run, tuning_id } = &op.kind else {
        panic!("expected inline op");
    };
    assert!(tuning_id.is_none());
    let list = crate::artifact::model::ImageListArtifact {
        items: vec![
            ImageArtifact::filled(2, 1, [1; 4]).unwrap(),
            ImageArtifact::filled(3, 2, [2; 4]).unwrap(),
        ],
    };
    let out = run(&list.into(), &ParamMap::new()).unwrap();
    assert_eq!(out.dims(), Some((3, 3)));
}

#[test]
fn pdf_op_carries_filename_hint() {
    let cat = Catalogue::new(Vec::new());
    let op = cat.get_op("op.imageList.toPdf").unwrap();
    assert_eq!(op.tuning_id(), Some("document.pdf"));
    assert_eq!(op.kind_label(), "inline");
    let OpKind::Inline { run, .. } = &op.kind else {
        panic!("expected inline op");
    };
    let list = crate::artifact::model::ImageListArtifact {
        items: vec![ImageArtifact::filled(4, 4, [0, 0, 0, 255]).unwrap()],
    };
    let Artifact::Pdf(pdf) = run(&list.into(), &ParamMap::new()).unwrap() else {
        panic!("expected pdf");
    };
    assert_eq!(pdf.filename_hint.as_deref(), Some(PDF_FILENAME_HINT));
    assert!(pdf.bytes.starts_with(b"%PDF"));
}
