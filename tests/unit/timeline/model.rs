use super::*;

const TWO_ROWS: &str = r##"{
  "rows": [
    {
      "timeInClip": {"start": 0, "end": 5},
      "action": "intro",
      "videoAsset": {"assetId": "v1", "displayName": "beach.mp4", "timeRange": {"start": 0, "end": 5}},
      "imageOverlays": [
        {"assetId": "logo", "displayName": "logo.png", "position": "top-right", "timeRange": {"start": 2, "end": 4}}
      ]
    },
    {
      "timeInClip": {"start": 5, "end": 10},
      "action": "outro",
      "videoAsset": {"assetId": "v2", "timeRange": {"start": 1.5, "end": 6.5}},
      "audioAsset": {"assetId": "a1", "timeRange": {"start": 0, "end": 5}, "volume": 0.5},
      "textOverlays": [
        {"text": "Hi", "position": "bottom-center", "timeRange": {"start": 0, "end": 2}, "fontWeight": "bold"}
      ]
    }
  ],
  "outputName": "final.mp4",
  "targetWidth": 1280,
  "targetHeight": 720,
  "targetFps": 30
}"##;

#[test]
fn parses_camel_case_timeline_with_defaults() {
    let t = Timeline::from_json(TWO_ROWS).unwrap();
    assert_eq!(t.rows.len(), 2);
    assert_eq!(t.canvas().width, 1280);
    assert_eq!(t.fps().unwrap(), Fps { num: 30, den: 1 });

    let img = &t.rows[0].image_overlays[0];
    assert_eq!(img.position, ImagePosition::TopRight);
    assert!((img.scale - 0.2).abs() < 1e-12);

    let row2 = &t.rows[1];
    assert_eq!(row2.video_asset.as_ref().unwrap().display_name, "");
    let audio = row2.audio_asset.as_ref().unwrap();
    assert!((audio.volume - 0.5).abs() < 1e-6);
    assert!(!audio.mix_with_original);

    let text = &row2.text_overlays[0];
    assert_eq!(text.position, TextPosition::BottomCenter);
    assert_eq!(text.font_weight, FontWeight::BOLD);
    assert!((text.font_size - 48.0).abs() < 1e-6);
    assert_eq!(text.font_color, "#ffffff");
    assert_eq!(text.background_color, "#000000");
    assert!((t.nominal_duration_secs() - 10.0).abs() < 1e-12);
}

#[test]
fn rejects_unknown_position_literal() {
    let bad = TWO_ROWS.replace("top-right", "upper-right");
    let err = Timeline::from_json(&bad).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn image_overlay_does_not_accept_text_only_positions() {
    let bad = TWO_ROWS.replace("top-right", "top-center");
    assert!(Timeline::from_json(&bad).is_err());
}

#[test]
fn font_weight_accepts_numbers_and_names() {
    let w: FontWeight = serde_json::from_str("600").unwrap();
    assert_eq!(w, FontWeight(600));
    let w: FontWeight = serde_json::from_str("\"normal\"").unwrap();
    assert_eq!(w, FontWeight::NORMAL);
    let w: FontWeight = serde_json::from_str("\"800\"").unwrap();
    assert_eq!(w, FontWeight(800));
    assert!(serde_json::from_str::<FontWeight>("\"extra-wide\"").is_err());
    assert!(serde_json::from_str::<FontWeight>("0").is_err());
}

#[test]
fn time_range_contains_is_inclusive() {
    let r = TimeRange::new(2.0, 4.0).unwrap();
    assert!(!r.contains(1.999));
    assert!(r.contains(2.0));
    assert!(r.contains(4.0));
    assert!(!r.contains(4.001));
    assert!(TimeRange::new(3.0, 3.0).is_err());
    assert!(TimeRange::new(-1.0, 3.0).is_err());
    assert!(TimeRange::new(0.0, f64::INFINITY).is_err());
}

#[test]
fn json_roundtrip_keeps_rows() {
    let t = Timeline::from_json(TWO_ROWS).unwrap();
    let again = Timeline::from_json(&t.to_json_pretty().unwrap()).unwrap();
    assert_eq!(t, again);
}
