use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn upsert(id: &str) -> PipelineStorageChange {
    PipelineStorageChange::UserPipelines {
        reason: ChangeReason::Upsert,
        pipeline_id: Some(id.to_string()),
    }
}

#[test]
fn wire_shape_is_kind_tagged() {
    let v = serde_json::to_value(PipelineStorageChange::Recipes {
        reason: ChangeReason::DeleteAllForPipeline,
        pipeline_id: Some("edge".into()),
        recipe_id: None,
    })
    .unwrap();
    assert_eq!(
        v,
        serde_json::json!({"kind": "recipes", "reason": "deleteAllForPipeline", "pipelineId": "edge"})
    );
}

#[test]
fn emit_reaches_subscribers_until_unsubscribed() {
    let bus = StorageSignals::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let id = bus.subscribe(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    bus.emit(&upsert("a"));
    bus.clone().emit(&upsert("b"));
    bus.unsubscribe(id);
    bus.emit(&upsert("c"));

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn panicking_listener_does_not_stop_others() {
    let bus = StorageSignals::new();
    let hits = Arc::new(AtomicUsize::new(0));
    bus.subscribe(|_| panic!("listener bug"));
    let h = Arc::clone(&hits);
    bus.subscribe(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    bus.emit(&upsert("a"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn listener_may_unsubscribe_itself_during_emit() {
    let bus = StorageSignals::new();
    let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
    let (b, s) = (bus.clone(), Arc::clone(&slot));
    let id = bus.subscribe(move |_| {
        if let Some(id) = *s.lock().unwrap() {
            b.unsubscribe(id);
        }
    });
    *slot.lock().unwrap() = Some(id);

    bus.emit(&upsert("a"));
    assert_eq!(format!("{bus:?}"), "StorageSignals { listeners: 0 }");
}
