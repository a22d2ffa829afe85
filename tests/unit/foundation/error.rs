use super::*;

#[test]
fn kinds_map_to_boundary_names() {
    assert_eq!(
        EngineError::validation("x").kind(),
        ErrorKind::ValidationError
    );
    assert_eq!(
        EngineError::asset_not_found("a1").kind(),
        ErrorKind::AssetNotFoundError
    );
    assert_eq!(EngineError::range("r").kind(), ErrorKind::RangeError);
    assert_eq!(
        EngineError::NoValidSegments.kind(),
        ErrorKind::NoValidSegmentsError
    );
    assert_eq!(EngineError::Cancelled.kind(), ErrorKind::CancelledError);
    assert_eq!(
        serde_json::to_string(&ErrorKind::AssetNotFoundError).unwrap(),
        "\"AssetNotFoundError\""
    );
}

#[test]
fn at_stage_fills_missing_stage_only() {
    let e = EngineError::decode("bad header").at_stage(Stage::Extract);
    assert_eq!(e.stage(), Some(Stage::Extract));
    assert_eq!(e.to_string(), "decode error in extract: bad header");

    let e = e.at_stage(Stage::Concat);
    assert_eq!(e.stage(), Some(Stage::Extract));

    let e = EngineError::encode("pipe closed");
    assert_eq!(e.to_string(), "encode error: pipe closed");
}

#[test]
fn at_stage_leaves_other_kinds_untouched() {
    let e = EngineError::asset_not_found("v9").at_stage(Stage::Audio);
    assert_eq!(e.kind(), ErrorKind::AssetNotFoundError);
    assert_eq!(e.stage(), None);
    assert_eq!(e.to_string(), "asset not found: 'v9'");
}
