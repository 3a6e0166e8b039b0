use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TrackburnError::malformed_track("x")
            .to_string()
            .contains("malformed track:")
    );
    assert!(
        TrackburnError::no_track_data("x")
            .to_string()
            .contains("no track data:")
    );
    assert!(
        TrackburnError::probe_failed("x")
            .to_string()
            .contains("probe failed:")
    );
    assert!(
        TrackburnError::encode_failed("x")
            .to_string()
            .contains("encode failed:")
    );
    assert!(
        TrackburnError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn cancelled_is_not_parameterized() {
    assert_eq!(TrackburnError::Cancelled.to_string(), "job cancelled");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TrackburnError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
