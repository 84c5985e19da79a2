use super::*;
use crate::{
    pipeline::library::PipelineLibrary,
    storage::{kv::MemoryStore, signals::StorageSignals},
};
use std::sync::Arc;

fn catalogue() -> Catalogue {
    Catalogue::new(Vec::new())
}

fn draft_with(ops: &[&str]) -> PipelineDraft {
    let cat = catalogue();
    let mut d = PipelineDraft::new("mine", "Mine");
    for (i, op) in ops.iter().enumerate() {
        d.insert_op_at(&cat, i, op).unwrap();
    }
    d
}

#[test]
fn inserts_follow_slot_typing() {
    let cat = catalogue();
    let mut d = PipelineDraft::default();
    assert_eq!(d.end_type(&cat), ArtifactType::Image);

    assert_eq!(
        d.can_insert_at(&cat, 0, "op.seg.morphology").unwrap_err(),
        "Needs mask but slot provides image"
    );
    assert_eq!(d.can_insert_at(&cat, 0, "op.nope").unwrap_err(), "Unknown op");
    assert_eq!(d.can_insert_at(&cat, 3, "op.seg.resize").unwrap_err(), "Slot 4 is past the end");

    d.insert_op_at(&cat, 0, "op.seg.threshold").unwrap();
    d.insert_op_at(&cat, 1, "op.svg.create").unwrap();
    assert_eq!(d.slot_type(&cat, 1), ArtifactType::Mask);
    assert_eq!(d.end_type(&cat), ArtifactType::Svg);

    d.insert_op_at(&cat, 1, "op.seg.morphology").unwrap();
    assert_eq!(d.op_ids(), ["op.seg.threshold", "op.seg.morphology", "op.svg.create"]);

    // past threshold the slot carries a mask
    let err = d.insert_op_at(&cat, 1, "op.seg.resize").unwrap_err();
    assert!(matches!(err, MillError::Validation(_)));
    assert_eq!(err.message(), "Insert refused: Needs image but slot provides mask");
    assert_eq!(d.op_ids().len(), 3);

    d.insert_op_at(&cat, 0, "op.seg.resize").unwrap();
    assert_eq!(d.op_ids()[0], "op.seg.resize");
}

#[test]
fn moves_and_removals_edit_in_place() {
    let mut d = draft_with(&["op.seg.resize", "op.seg.denoise", "op.seg.threshold"]);

    assert!(d.move_op(0, false));
    assert_eq!(d.op_ids(), ["op.seg.denoise", "op.seg.resize", "op.seg.threshold"]);
    assert!(!d.move_op(0, true));
    assert!(!d.move_op(2, false));
    assert!(!d.move_op(7, true));

    assert_eq!(d.remove_at(1).as_deref(), Some("op.seg.resize"));
    assert_eq!(d.remove_at(5), None);
    assert_eq!(d.op_ids(), ["op.seg.denoise", "op.seg.threshold"]);

    d.clear();
    assert!(d.op_ids().is_empty());
}

#[test]
fn to_pipeline_numbers_instances_from_the_id() {
    let cat = catalogue();
    let mut d = draft_with(&["op.seg.resize", "op.seg.threshold"]);
    d.id = "  mine ".to_string();
    d.description = "  ".to_string();

    let p = d.to_pipeline(&cat).unwrap();
    assert_eq!(p.id, "mine");
    assert_eq!(p.title, "Mine");
    assert_eq!(p.description, None);
    assert!(p.implemented);
    let ids: Vec<_> = p.ops.iter().map(|o| o.instance_id.as_str()).collect();
    assert_eq!(ids, ["mine.1", "mine.2"]);
    assert_eq!(p.ops[1].op_id, "op.seg.threshold");
}

#[test]
fn to_pipeline_rejects_missing_fields_and_bad_order() {
    let cat = catalogue();
    let mut d = draft_with(&["op.seg.resize", "op.seg.threshold"]);

    d.id = " ".to_string();
    assert_eq!(d.to_pipeline(&cat).unwrap_err().message(), "Pipeline id is required.");
    d.id = "mine".to_string();
    d.title = String::new();
    assert_eq!(d.to_pipeline(&cat).unwrap_err().message(), "Pipeline title is required.");
    d.title = "Mine".to_string();

    // moves are not checked on the spot
    assert!(d.move_op(1, true));
    let err = d.to_pipeline(&cat).unwrap_err();
    assert!(matches!(err, MillError::Validation(_)));
    assert_eq!(
        err.message(),
        "Invalid typing at step 2: \"Resize\" needs image but current is mask"
    );

    d.set_start_type(ArtifactType::Mask);
    assert_eq!(d.start_type(), ArtifactType::Mask);
    assert!(d.to_pipeline(&cat).is_err());
}

#[test]
fn library_stores_saved_drafts() {
    let cat = catalogue();
    let lib = PipelineLibrary::new(Arc::new(MemoryStore::new()), StorageSignals::new());
    let d = draft_with(&["op.seg.threshold", "op.svg.create"]);

    let saved = lib.save_draft(&d, &cat).unwrap();
    assert_eq!(lib.list_user_pipelines(), vec![saved]);

    let empty_title = PipelineDraft::new("other", "");
    assert!(lib.save_draft(&empty_title, &cat).is_err());
    assert_eq!(lib.list_user_pipelines().len(), 1);
}
