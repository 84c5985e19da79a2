use super::*;
use crate::{
    artifact::model::{ImageArtifact, MaskArtifact},
    storage::kv::MemoryStore,
    tuning::{
        model::{
            ComponentConfig, EnginePolicy, EngineSwitch, ParamValue, RuntimeAvailability,
            param_number,
        },
        registry::default_registry,
        store::TuningStore,
    },
};
use std::sync::Mutex;

fn resolver(ready: bool) -> (TuningResolver, EngineSwitch) {
    let switch = EngineSwitch::new(ready);
    let resolver = TuningResolver::new(
        Arc::new(default_registry().unwrap()),
        TuningStore::new(Arc::new(MemoryStore::new())),
        Arc::new(switch.clone()),
    );
    (resolver, switch)
}

/// Implementation that records the engine and the `manualT` it saw, echoing the input.
fn spying(log: Arc<Mutex<Vec<(EngineId, f64)>>>) -> OpImpl {
    let native_log = log.clone();
    OpImpl::new(
        move |input, params| {
            native_log
                .lock()
                .unwrap()
                .push((EngineId::Native, param_number(params, "manualT", -1.0)));
            Ok(input.clone())
        },
        move |input, params| {
            log.lock()
                .unwrap()
                .push((EngineId::Opencv, param_number(params, "manualT", -1.0)));
            Ok(input.clone())
        },
    )
}

fn image() -> Artifact {
    ImageArtifact::filled(2, 2, [255; 4]).unwrap().into()
}

#[test]
fn dispatch_ids_round_trip_through_str_and_serde() {
    for id in DispatchOpId::ALL {
        assert_eq!(id.as_str().parse::<DispatchOpId>().unwrap(), id);
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{id}\""));
    }
    assert!("segmentation.nope".parse::<DispatchOpId>().is_err());
}

#[test]
fn every_dispatch_id_is_a_tuning_component() {
    let reg = default_registry().unwrap();
    for id in DispatchOpId::ALL {
        assert!(reg.get(id.as_str()).is_some(), "{id}");
    }
}

#[test]
fn auto_policy_runs_alternate_only_when_ready() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut impls = OpImplementations::new();
    impls.insert(DispatchOpId::SegmentationThreshold, spying(log.clone()));
    let (res, switch) = resolver(true);
    let d = OpDispatcher::new(res, Arc::new(impls));

    d.run_op_core(DispatchOpId::SegmentationThreshold, &image(), None)
        .unwrap();
    switch.set_ready(false);
    d.run_op_core(DispatchOpId::SegmentationThreshold, &image(), None)
        .unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0], (EngineId::Opencv, 128.0));
    assert_eq!(log[1], (EngineId::Native, 128.0));
}

#[test]
fn instance_override_wins_over_stored_tuning() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut impls = OpImplementations::new();
    impls.insert(DispatchOpId::SegmentationThreshold, spying(log.clone()));
    let (res, _switch) = resolver(true);
    res.store().set_component_config(
        "segmentation.threshold",
        ComponentConfig {
            engine_policy: Some(EnginePolicy::Opencv),
            params: [("manualT".to_string(), ParamValue::Number(90.0))].into(),
        },
    );
    let d = OpDispatcher::new(res, Arc::new(impls));

    d.run_op_core(DispatchOpId::SegmentationThreshold, &image(), None)
        .unwrap();
    let o = OpOverride {
        engine_policy: Some(EnginePolicy::Native),
        params: [("manualT".to_string(), ParamValue::Number(10.0))].into(),
    };
    d.run_op_core(DispatchOpId::SegmentationThreshold, &image(), Some(&o))
        .unwrap();
    let inherit = OpOverride {
        engine_policy: Some(EnginePolicy::Inherit),
        ..Default::default()
    };
    d.run_op_core(DispatchOpId::SegmentationThreshold, &image(), Some(&inherit))
        .unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0], (EngineId::Opencv, 90.0));
    assert_eq!(log[1], (EngineId::Native, 10.0));
    assert_eq!(log[2], (EngineId::Opencv, 90.0));
}

#[test]
fn opencv_override_falls_back_silently_when_not_ready() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut impls = OpImplementations::new();
    impls.insert(DispatchOpId::EdgeExtract, spying(log.clone()));
    let (res, _switch) = resolver(false);
    let d = OpDispatcher::new(res, Arc::new(impls));
    let o = OpOverride {
        engine_policy: Some(EnginePolicy::Opencv),
        ..Default::default()
    };
    let mask: Artifact = MaskArtifact::new(1, 1, vec![255]).unwrap().into();
    let out = d
        .run_op_core(DispatchOpId::EdgeExtract, &mask, Some(&o))
        .unwrap();
    assert_eq!(out, mask);
    assert_eq!(log.lock().unwrap()[0].0, EngineId::Native);
}

#[test]
fn missing_implementation_is_definition_error() {
    let (res, _switch) = resolver(false);
    let d = OpDispatcher::new(res, Arc::new(OpImplementations::new()));
    let err = d
        .run_op_core(DispatchOpId::SvgCreate, &image(), None)
        .unwrap_err();
    assert!(matches!(err, MillError::Definition(_)));
    assert!(err.to_string().contains("svg.create"));
}

#[test]
fn static_availability_is_accepted() {
    let resolver = TuningResolver::new(
        Arc::new(default_registry().unwrap()),
        TuningStore::new(Arc::new(MemoryStore::new())),
        Arc::new(RuntimeAvailability {
            alternate_engine_ready: false,
        }),
    );
    let d = OpDispatcher::new(resolver, Arc::new(OpImplementations::new()));
    assert_eq!(d.implementations().ids().count(), 0);
    assert!(!d.resolver().availability().alternate_engine_ready);
}
