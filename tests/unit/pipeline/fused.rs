use super::*;
use crate::foundation::error::ErrorKind;
use crate::media::raw::RawCodec;
use crate::pipeline::audio::replace_audio;
use crate::pipeline::extract::{extract, placeholder};
use crate::pipeline::overlay::{apply_image_overlays, apply_text_overlays};
use crate::render::text::TextLayoutEngine;
use crate::testkit::{Harness, clip, decode_all, fps, png, ramp};
use crate::timeline::model::{
    AssetRef, FontWeight, ImageOverlay, ImagePosition, TextOverlay, TextPosition, TimeRange,
};

fn compositor(h: &Harness) -> OverlayCompositor {
    OverlayCompositor::new(h.canvas, TextLayoutEngine::new(None).unwrap()).unwrap()
}

fn busy_row() -> TimelineRow {
    let mut music = AssetRef::new("music", TimeRange::new(1.0, 3.0).unwrap());
    music.volume = 0.5;
    music.mix_with_original = true;
    TimelineRow {
        time_in_clip: TimeRange::new(0.0, 2.0).unwrap(),
        action: String::new(),
        video_asset: Some(AssetRef::new("v1", TimeRange::new(1.0, 3.0).unwrap())),
        audio_asset: Some(music),
        image_overlays: vec![ImageOverlay {
            asset_id: "logo".to_string(),
            display_name: String::new(),
            position: ImagePosition::TopRight,
            time_range: TimeRange::new(0.5, 1.5).unwrap(),
            scale: 0.25,
        }],
        text_overlays: vec![TextOverlay {
            text: "Hello".to_string(),
            position: TextPosition::BottomCenter,
            time_range: TimeRange::new(0.0, 1.0).unwrap(),
            font_size: 10.0,
            font_color: "#ffffff".to_string(),
            background_color: "#000000".to_string(),
            font_weight: FontWeight::BOLD,
        }],
    }
}

fn harness() -> Harness {
    let h = Harness::new(64, 48, fps(10));
    h.add("v1", clip(32, 32, fps(10), 50, Some(ramp(1000, 2, 5.0))));
    h.add("music", RawCodec::audio_container(&ramp(2000, 1, 4.0)).unwrap());
    h.store.insert("logo", "logo.png", png(4, 4, [255, 0, 0, 200]));
    h
}

#[test]
fn fused_row_matches_the_staged_chain() {
    let h = harness();
    let row = busy_row();
    let ctx = h.ctx();

    let mut comp = compositor(&h);
    let video = row.video_asset.as_ref().unwrap();
    let staged = extract(&ctx, &video.asset_id, video.time_range, &mut |_| {}).unwrap();
    let staged = apply_image_overlays(&ctx, &mut comp, staged, &row.image_overlays, &mut |_| {})
        .unwrap();
    let staged =
        apply_text_overlays(&ctx, &mut comp, staged, &row.text_overlays, &mut |_| {}).unwrap();
    let staged =
        replace_audio(&ctx, staged, row.audio_asset.as_ref().unwrap(), &mut |_| {}).unwrap();

    let mut comp = compositor(&h);
    let mut last = 0.0;
    let fused = render_row(&ctx, &mut comp, &row, RowBase::Video(video), &mut |p| last = p).unwrap();
    assert_eq!(last, 1.0);

    let (s_info, s_frames, s_audio) = decode_all(&staged);
    let (f_info, f_frames, f_audio) = decode_all(&fused);
    assert_eq!(s_info, f_info);
    assert_eq!(f_frames.len(), 20);
    assert_eq!(s_frames, f_frames);
    assert_eq!(s_audio, f_audio);
}

#[test]
fn fused_placeholder_matches_the_staged_chain() {
    let h = harness();
    let mut row = busy_row();
    row.video_asset = None;
    row.audio_asset.as_mut().unwrap().mix_with_original = false;
    let ctx = h.ctx();
    let base = RowBase::Placeholder {
        duration: 2.0,
        rgba: [10, 20, 30, 255],
    };

    let mut comp = compositor(&h);
    let staged = placeholder(&ctx, 2.0, [10, 20, 30, 255], &mut |_| {}).unwrap();
    let staged = apply_image_overlays(&ctx, &mut comp, staged, &row.image_overlays, &mut |_| {})
        .unwrap();
    let staged =
        apply_text_overlays(&ctx, &mut comp, staged, &row.text_overlays, &mut |_| {}).unwrap();
    let staged =
        replace_audio(&ctx, staged, row.audio_asset.as_ref().unwrap(), &mut |_| {}).unwrap();

    let mut comp = compositor(&h);
    let fused = render_row(&ctx, &mut comp, &row, base, &mut |_| {}).unwrap();
    assert_eq!(decode_all(&staged).1, decode_all(&fused).1);
    assert_eq!(decode_all(&staged).2, decode_all(&fused).2);
}

#[test]
fn fused_row_surfaces_missing_assets() {
    let h = harness();
    let mut row = busy_row();
    row.image_overlays[0].asset_id = "nope".to_string();
    let mut comp = compositor(&h);
    let base = RowBase::Video(row.video_asset.as_ref().unwrap());
    let err = render_row(&h.ctx(), &mut comp, &row, base, &mut |_| {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AssetNotFoundError);
}
