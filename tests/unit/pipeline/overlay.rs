use super::*;
use crate::foundation::error::ErrorKind;
use crate::media::raw::RawCodec;
use crate::render::text::TextLayoutEngine;
use crate::testkit::{Harness, clip, decode_all, fps, frame_color, png, ramp};
use crate::timeline::model::{FontWeight, ImagePosition, TextPosition, TimeRange};

fn compositor(h: &Harness) -> OverlayCompositor {
    OverlayCompositor::new(h.canvas, TextLayoutEngine::new(None).unwrap()).unwrap()
}

fn logo(range: TimeRange) -> ImageOverlay {
    ImageOverlay {
        asset_id: "logo".to_string(),
        display_name: String::new(),
        position: ImagePosition::Center,
        time_range: range,
        scale: 0.5,
    }
}

#[test]
fn image_overlay_is_absent_outside_its_window() {
    let h = Harness::new(32, 32, fps(10));
    h.store.insert("logo", "logo.png", png(4, 4, [0, 255, 0, 255]));
    let input = clip(32, 32, fps(10), 60, Some(ramp(1000, 1, 6.0)));
    let audio_before = decode_all(&input).2;

    let mut comp = compositor(&h);
    let out = apply_image_overlays(
        &h.ctx(),
        &mut comp,
        input,
        &[logo(TimeRange::new(2.0, 4.0).unwrap())],
        &mut |_| {},
    )
    .unwrap();
    let (_, frames, audio) = decode_all(&out);
    assert_eq!(frames.len(), 60);

    for (i, f) in frames.iter().enumerate() {
        let t = i as f64 / 10.0;
        let px = f.pixel(16, 16).unwrap();
        if (2.0..=4.0).contains(&t) {
            assert!(px[0] <= 2 && px[1] >= 253 && px[2] <= 2, "t={t}: {px:?}");
        } else {
            assert_eq!(px, frame_color(i as u64), "t={t}");
        }
    }
    assert_eq!(audio, audio_before);
}

#[test]
fn text_overlay_draws_a_background_box() {
    let h = Harness::new(64, 64, fps(10));
    let overlay = TextOverlay {
        text: "Hi".to_string(),
        position: TextPosition::TopLeft,
        time_range: TimeRange::new(0.0, 0.5).unwrap(),
        font_size: 12.0,
        font_color: "#ffffff".to_string(),
        background_color: "#000000".to_string(),
        font_weight: FontWeight::NORMAL,
    };
    let mut comp = compositor(&h);
    let out = apply_text_overlays(
        &h.ctx(),
        &mut comp,
        clip(64, 64, fps(10), 10, None),
        &[overlay],
        &mut |_| {},
    )
    .unwrap();
    let (_, frames, _) = decode_all(&out);
    // Box starts at the 20px pad; pixel (21, 21) sits inside the left padding strip.
    let shaded = frames[0].pixel(21, 21).unwrap();
    assert!(shaded[1] < 50, "{shaded:?}");
    assert_eq!(frames[9].pixel(21, 21).unwrap(), frame_color(9));
}

#[test]
fn no_overlays_or_no_video_returns_input_unchanged() {
    let h = Harness::new(8, 8, fps(10));
    let mut comp = compositor(&h);

    let input = clip(8, 8, fps(10), 5, None);
    let bytes = input.as_bytes().to_vec();
    let out = apply_image_overlays(&h.ctx(), &mut comp, input, &[], &mut |_| {}).unwrap();
    assert_eq!(out.as_bytes(), bytes.as_slice());

    h.store.insert("logo", "logo.png", png(2, 2, [0, 0, 255, 255]));
    let audio_only = RawCodec::audio_container(&ramp(100, 1, 1.0)).unwrap();
    let bytes = audio_only.as_bytes().to_vec();
    let out = apply_image_overlays(
        &h.ctx(),
        &mut comp,
        audio_only,
        &[logo(TimeRange::new(0.0, 1.0).unwrap())],
        &mut |_| {},
    )
    .unwrap();
    assert_eq!(out.as_bytes(), bytes.as_slice());
}

#[test]
fn missing_overlay_image_is_asset_not_found() {
    let h = Harness::new(8, 8, fps(10));
    let mut comp = compositor(&h);
    let err = apply_image_overlays(
        &h.ctx(),
        &mut comp,
        clip(8, 8, fps(10), 5, None),
        &[logo(TimeRange::new(0.0, 1.0).unwrap())],
        &mut |_| {},
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AssetNotFoundError);
}
