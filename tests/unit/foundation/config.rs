use super::*;

#[test]
fn empty_object_uses_defaults() {
    let cfg = EditorConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, EditorConfig::default());
    assert_eq!(cfg.log_level.as_tracing(), tracing::Level::WARN);
}

#[test]
fn fields_are_camel_case() {
    let cfg = EditorConfig::from_reader(
        r#"{"storePath":"state.json","alternateEngineReady":true,"logLevel":"debug"}"#.as_bytes(),
    )
    .unwrap();
    assert_eq!(cfg.store_path, Some(PathBuf::from("state.json")));
    assert!(cfg.alternate_engine_ready);
    assert_eq!(cfg.log_level, LogLevel::Debug);
}

#[test]
fn malformed_json_is_validation_error() {
    let err = EditorConfig::from_reader("not json".as_bytes()).unwrap_err();
    assert!(err.to_string().contains("validation error:"));
}

#[test]
fn missing_file_mentions_path() {
    let err = EditorConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.json"));
}
