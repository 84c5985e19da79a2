use super::*;

fn catalogue() -> Catalogue {
    Catalogue::new(Vec::new())
}

fn pipeline(op_ids: &[&str]) -> PipelineDef {
    PipelineDef {
        id: "t".to_string(),
        title: "T".to_string(),
        description: None,
        implemented: true,
        ops: op_ids
            .iter()
            .enumerate()
            .map(|(i, op)| PipelineOpInstance::new(format!("t.{}", i + 1), *op))
            .collect(),
    }
}

#[test]
fn disabled_instances_are_skipped() {
    let mut p = pipeline(&["op.seg.resize", "op.seg.denoise", "op.seg.threshold"]);
    p.ops[1].enabled = Some(false);
    let r = resolve_enabled_linear(&p, &catalogue()).unwrap();
    let ids: Vec<&str> = r.specs.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["op.seg.resize", "op.seg.threshold"]);
    assert_eq!(r.instances[1].instance_id, "t.3");
}

#[test]
fn unknown_op_is_definition_error() {
    let p = pipeline(&["op.seg.resize", "op.nope"]);
    let err = resolve_enabled_linear(&p, &catalogue()).unwrap_err();
    assert!(matches!(err, MillError::Definition(_)));
    assert_eq!(err.message(), "Unknown opId in pipeline: op.nope");
}

#[test]
fn valid_chain_reports_end_type() {
    let p = pipeline(&[
        "op.edge.resize",
        "op.edge.threshold",
        "op.edge.extract",
        "op.svg.create",
    ]);
    let r = resolve_enabled_linear(&p, &catalogue()).unwrap();
    let t = validate_linear_chain_types(&r.specs, &r.instances, ArtifactType::Image);
    assert!(t.is_ok());
    assert_eq!(t.end_type, Some(ArtifactType::Svg));
    assert_eq!(t.steps.len(), 4);
    assert!(t.steps.iter().all(TypingStep::is_ok));
}

#[test]
fn first_failure_stops_the_walk() {
    // mismatch at index 2: threshold needs image, current is mask
    let p = pipeline(&[
        "op.seg.resize",
        "op.seg.threshold",
        "op.seg.threshold",
        "op.seg.morphology",
    ]);
    let r = resolve_enabled_linear(&p, &catalogue()).unwrap();
    let t = validate_linear_chain_types(&r.specs, &r.instances, ArtifactType::Image);
    assert!(!t.is_ok());
    assert_eq!(t.steps.len(), 3);
    assert_eq!(
        t.error.as_deref(),
        Some("Chain IO mismatch at \"Threshold\": needs image but current is mask")
    );
    assert_eq!(t.steps[2].actual_input, ArtifactType::Mask);
    assert_eq!(t.end_type, None);
}

#[test]
fn empty_chain_is_an_error() {
    let t = validate_linear_chain_types(&[], &[], ArtifactType::Image);
    assert_eq!(t.error.as_deref(), Some("Pipeline has no ops"));
    assert!(t.steps.is_empty());
}

#[test]
fn type_at_index_follows_valid_prefix() {
    let p = pipeline(&["op.seg.resize", "op.seg.threshold", "op.seg.threshold"]);
    let r = resolve_enabled_linear(&p, &catalogue()).unwrap();
    assert_eq!(type_at_index(&r.specs, ArtifactType::Image, 0), ArtifactType::Image);
    assert_eq!(type_at_index(&r.specs, ArtifactType::Image, 2), ArtifactType::Mask);
    assert_eq!(type_at_index(&r.specs, ArtifactType::Image, 9), ArtifactType::Mask);
}

#[test]
fn insertion_checks_both_neighbours() {
    let cat = catalogue();
    let morph = cat.get_op("op.seg.morphology").unwrap();
    assert!(can_insert_between(ArtifactType::Mask, Some(ArtifactType::Mask), morph).is_ok());
    assert!(can_insert_between(ArtifactType::Mask, None, morph).is_ok());
    assert_eq!(
        can_insert_between(ArtifactType::Image, None, morph).unwrap_err(),
        "Needs mask but slot provides image"
    );
    assert_eq!(
        can_insert_between(ArtifactType::Mask, Some(ArtifactType::Image), morph).unwrap_err(),
        "Produces mask but next op needs image"
    );
}

#[test]
fn every_spec_is_checked_even_without_instances() {
    let cat = catalogue();
    let specs: Vec<OpSpec> = ["op.seg.threshold", "op.svg.create", "op.seg.threshold"]
        .iter()
        .map(|id| cat.get_op(id).unwrap().clone())
        .collect();
    let t = validate_linear_chain_types(&specs, &[], ArtifactType::Image);
    assert!(!t.is_ok());
    assert_eq!(t.end_type, None);
    assert_eq!(t.steps.len(), 3);
    assert_eq!(t.steps[2].actual_input, ArtifactType::Svg);
    assert!(t.steps.iter().all(|s| s.instance_id.is_empty()));

    let labelled = pipeline(&["op.seg.threshold"]).ops;
    let t = validate_linear_chain_types(&specs[..2], &labelled, ArtifactType::Image);
    assert_eq!(t.end_type, Some(ArtifactType::Svg));
    assert_eq!(t.steps[0].instance_id, "t.1");
    assert_eq!(t.steps[1].instance_id, "");
}
