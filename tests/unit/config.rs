use std::collections::HashMap;

use super::*;

#[test]
fn defaults_are_valid_and_partial_json_fills_the_rest() {
    let d = EngineConfig::default();
    d.validate().unwrap();
    assert_eq!(d.codec, CodecKind::Ffmpeg);
    assert_eq!(d.missing_video, MissingVideoPolicy::Skip);

    let cfg = EngineConfig::from_json(r#"{"codec":"raw","ffmpeg":{"crf":23}}"#).unwrap();
    assert_eq!(cfg.codec, CodecKind::Raw);
    assert_eq!(cfg.ffmpeg.crf, 23);
    assert_eq!(cfg.ffmpeg.binary, "ffmpeg");
    assert_eq!(cfg.pipeline, PipelineMode::Staged);
    assert_eq!(cfg.build_codec().name(), "raw");
}

#[test]
fn invalid_values_are_config_errors() {
    for json in [
        r#"{"codec":"gif"}"#,
        r#"{"placeholderColor":"nope"}"#,
        r#"{"ffmpeg":{"crf":70}}"#,
        r#"{"progressCapacity":0}"#,
    ] {
        let err = EngineConfig::from_json(json).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)), "{json}: {err}");
    }
}

#[test]
fn env_overrides_apply_with_prefix() {
    let vars: HashMap<&str, &str> = [
        ("WAVYTE_REEL_CODEC", "RAW"),
        ("WAVYTE_REEL_PIPELINE", "fused"),
        ("WAVYTE_REEL_MISSING_VIDEO", "placeholder"),
        ("WAVYTE_REEL_CRF", "30"),
        ("WAVYTE_REEL_FONT_PATH", "/fonts/x.ttf"),
    ]
    .into_iter()
    .collect();
    let cfg = EngineConfig::default()
        .with_overrides_from(|k| vars.get(k).map(|v| v.to_string()))
        .unwrap();
    assert_eq!(cfg.codec, CodecKind::Raw);
    assert_eq!(cfg.pipeline, PipelineMode::Fused);
    assert_eq!(cfg.missing_video, MissingVideoPolicy::Placeholder);
    assert_eq!(cfg.ffmpeg.crf, 30);
    assert_eq!(cfg.font_path, Some(PathBuf::from("/fonts/x.ttf")));

    let bad = EngineConfig::default()
        .with_overrides_from(|k| (k == "WAVYTE_REEL_CRF").then(|| "high".to_string()));
    assert!(matches!(bad, Err(EngineError::Config(_))));
}
