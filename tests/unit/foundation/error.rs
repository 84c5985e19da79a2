use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MillError::definition("x")
            .to_string()
            .contains("definition error:")
    );
    assert!(
        MillError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MillError::execution("x")
            .to_string()
            .contains("execution error:")
    );
    assert!(
        MillError::storage("x")
            .to_string()
            .contains("storage error:")
    );
    assert!(
        MillError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn message_drops_prefix() {
    assert_eq!(MillError::execution("empty imageList").message(), "empty imageList");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MillError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(err.message().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(MillError::from(e), MillError::Serde(_)));
}
