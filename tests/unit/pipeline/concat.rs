use super::*;
use crate::foundation::error::ErrorKind;
use crate::testkit::{Harness, clip, decode_all, fps, frame_color, ramp};

#[test]
fn empty_input_is_no_valid_segments() {
    let h = Harness::new(8, 8, fps(10));
    let err = concat(&h.ctx(), Vec::new(), &mut |_| {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoValidSegmentsError);
}

#[test]
fn single_segment_is_passed_through() {
    let h = Harness::new(8, 8, fps(10));
    let seg = clip(8, 8, fps(10), 5, None);
    let bytes = seg.as_bytes().to_vec();
    let mut last = 0.0;
    let out = concat(&h.ctx(), vec![seg], &mut |p| last = p).unwrap();
    assert_eq!(out.as_bytes(), bytes.as_slice());
    assert_eq!(last, 1.0);
}

#[test]
fn frames_are_joined_in_order() {
    let h = Harness::new(8, 8, fps(10));
    let a = clip(8, 8, fps(10), 3, None);
    let b = clip(8, 8, fps(10), 2, None);
    let mut seen = Vec::new();
    let out = concat(&h.ctx(), vec![a, b], &mut |p| seen.push(p)).unwrap();

    let (info, frames, audio) = decode_all(&out);
    assert_eq!(info.frame_count, 5);
    assert!(audio.is_none());
    let colors: Vec<_> = frames.iter().map(|f| f.pixel(0, 0).unwrap()).collect();
    assert_eq!(
        colors,
        vec![
            frame_color(0),
            frame_color(1),
            frame_color(2),
            frame_color(0),
            frame_color(1)
        ]
    );
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last().copied(), Some(1.0));
}

#[test]
fn silent_segments_get_silence_in_the_first_tracks_format() {
    let h = Harness::new(8, 8, fps(10));
    let a = clip(8, 8, fps(10), 10, None);
    let b = clip(8, 8, fps(10), 10, Some(ramp(1000, 2, 1.0)));
    let c = clip(8, 8, fps(10), 5, Some(ramp(2000, 1, 0.5)));

    let out = concat(&h.ctx(), vec![a, b, c], &mut |_| {}).unwrap();
    let (info, frames, audio) = decode_all(&out);
    assert_eq!(frames.len(), 25);
    assert!((info.duration_secs - 2.5).abs() < 1e-6);

    let audio = audio.unwrap();
    assert_eq!((audio.sample_rate, audio.channels), (1000, 2));
    assert_eq!(audio.frames(), 2500);
    assert!(audio.interleaved_f32[..2000].iter().all(|&s| s == 0.0));
    assert!(audio.interleaved_f32[2000..4000].iter().any(|&s| s > 0.0));
}

#[test]
fn segments_without_video_are_rejected() {
    let h = Harness::new(8, 8, fps(10));
    let a = clip(8, 8, fps(10), 5, Some(ramp(1000, 1, 0.5)));
    let audio_only = clip(8, 8, fps(10), 0, Some(ramp(1000, 1, 1.0)));

    let err = concat(&h.ctx(), vec![a, audio_only], &mut |_| {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeError);
    assert_eq!(err.stage(), Some(Stage::Concat));
}
