use super::*;
use serde_json::json;

#[test]
fn recording_sink_keeps_order_and_meta() {
    let sink = RecordingSink::new();
    sink.debug("first", None);
    sink.action("clicked run");
    sink.debug("second", Some(&meta([("step", json!(2))])));

    let entries = sink.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[0],
        LogEntry::Debug {
            message: "first".to_string(),
            meta: LogMeta::new(),
        }
    );
    assert_eq!(entries[1], LogEntry::Action("clicked run".to_string()));
    match &entries[2] {
        LogEntry::Debug { meta, .. } => assert_eq!(meta.get("step"), Some(&json!(2))),
        other => panic!("unexpected entry {other:?}"),
    }
}

#[test]
fn clones_share_the_buffer() {
    let sink = RecordingSink::new();
    let other = sink.clone();
    other.action("x");
    assert_eq!(sink.entries().len(), 1);
}

#[test]
fn tracing_sink_never_fails_without_subscriber() {
    TracingSink.debug("no subscriber installed", Some(&meta([("k", json!("v"))])));
    TracingSink.action("still fine");
}
