use super::*;
use crate::tuning::model::{EnginePolicy, ParamValue};

#[test]
fn instance_json_uses_override_key_and_defaults_enabled() {
    let inst: PipelineOpInstance = serde_json::from_str(
        r#"{"instanceId":"p.1","opId":"op.seg.threshold","override":{"enginePolicy":"native","params":{"manualT":40}}}"#,
    )
    .unwrap();
    assert!(inst.is_enabled());
    assert_eq!(inst.enabled, None);
    let o = inst.override_.as_ref().unwrap();
    assert_eq!(o.engine_policy, Some(EnginePolicy::Native));
    assert_eq!(o.params["manualT"], ParamValue::Number(40.0));

    let back = serde_json::to_value(&inst).unwrap();
    assert!(back.get("override").is_some());
    assert!(back.get("enabled").is_none());
}

#[test]
fn explicit_false_disables() {
    let mut inst = PipelineOpInstance::new("p.1", "op.util.pass.image");
    assert!(inst.is_enabled());
    inst.enabled = Some(false);
    assert!(!inst.is_enabled());
}

#[test]
fn pipeline_implemented_defaults_to_true() {
    let p: PipelineDef =
        serde_json::from_str(r#"{"id":"mine","title":"Mine","ops":[]}"#).unwrap();
    assert!(p.implemented);
    assert_eq!(p.description, None);
}

#[test]
fn group_labels_match_wire_names() {
    for g in [OpGroup::Svg, OpGroup::MultiInput, OpGroup::Edge] {
        assert_eq!(
            serde_json::to_string(&g).unwrap(),
            format!("\"{}\"", g.as_str())
        );
    }
}

#[test]
fn io_displays_as_arrow() {
    let io = OpIo::new(ArtifactType::Image, ArtifactType::Mask);
    assert_eq!(io.to_string(), "image -> mask");
}
