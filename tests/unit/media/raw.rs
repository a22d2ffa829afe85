use super::*;

fn solid(w: u32, h: u32, v: u8) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: vec![v, v, v, 255].repeat((w * h) as usize),
        premultiplied: true,
    }
}

fn encode(frames: u8, fps: Fps, audio: Option<AudioPcm>) -> MediaBuffer {
    let codec = RawCodec;
    let mut sink = codec.sink().unwrap();
    sink.begin(SinkConfig {
        width: 4,
        height: 2,
        fps,
        audio,
    })
    .unwrap();
    for i in 0..frames {
        sink.push_frame(FrameIndex(u64::from(i)), &solid(4, 2, i)).unwrap();
    }
    sink.end().unwrap()
}

#[test]
fn probe_reports_streams() {
    let fps = Fps::new(10, 1).unwrap();
    let audio = AudioPcm::silence(
        AudioFormat {
            sample_rate: 8000,
            channels: 1,
        },
        8000,
    );
    let buf = encode(10, fps, Some(audio));
    let info = RawCodec.probe(&buf).unwrap();
    assert!(info.has_video);
    assert_eq!((info.width, info.height), (4, 2));
    assert_eq!(info.frame_count, 10);
    assert!((info.duration_secs - 1.0).abs() < 1e-9);
    assert_eq!(
        info.audio,
        Some(AudioFormat {
            sample_rate: 8000,
            channels: 1
        })
    );
}

#[test]
fn window_decode_yields_exact_frame_count_and_source_frames() {
    let fps = Fps::new(10, 1).unwrap();
    let buf = encode(20, fps, None);
    let mut src = RawCodec
        .open_video(
            &buf,
            VideoRequest {
                window: Some(Window {
                    start: 0.5,
                    duration: 1.0,
                }),
                fps,
            },
        )
        .unwrap();
    assert_eq!(src.frame_count(), 10);
    let first = src.next_frame().unwrap().unwrap();
    assert_eq!(first.pixel(0, 0), Some([5, 5, 5, 255]));
    let mut n = 1;
    while src.next_frame().unwrap().is_some() {
        n += 1;
    }
    assert_eq!(n, 10);
}

#[test]
fn decode_resamples_to_requested_fps() {
    let buf = encode(10, Fps::new(10, 1).unwrap(), None);
    let mut src = RawCodec
        .open_video(
            &buf,
            VideoRequest {
                window: None,
                fps: Fps::new(20, 1).unwrap(),
            },
        )
        .unwrap();
    assert_eq!(src.frame_count(), 20);
    let f0 = src.next_frame().unwrap().unwrap();
    let f1 = src.next_frame().unwrap().unwrap();
    let f2 = src.next_frame().unwrap().unwrap();
    assert_eq!(f0.data, f1.data);
    assert_eq!(f2.pixel(0, 0), Some([1, 1, 1, 255]));
}

#[test]
fn audio_only_container_and_windowed_audio() {
    let pcm = AudioPcm {
        sample_rate: 100,
        channels: 1,
        interleaved_f32: (0..200).map(|i| i as f32 / 200.0).collect(),
    };
    let buf = RawCodec::audio_container(&pcm).unwrap();
    let info = RawCodec.probe(&buf).unwrap();
    assert!(!info.has_video);
    assert!((info.duration_secs - 2.0).abs() < 1e-9);
    assert!(
        RawCodec
            .open_video(
                &buf,
                VideoRequest {
                    window: None,
                    fps: Fps::new(10, 1).unwrap()
                }
            )
            .is_err()
    );

    let part = RawCodec
        .decode_audio(
            &buf,
            Some(Window {
                start: 0.5,
                duration: 1.0,
            }),
        )
        .unwrap()
        .unwrap();
    assert_eq!(part.frames(), 100);
    assert_eq!(part.interleaved_f32[0], pcm.interleaved_f32[50]);
}

#[test]
fn sink_rejects_bad_frames_and_garbage_fails_to_parse() {
    let mut sink = RawCodec.sink().unwrap();
    sink.begin(SinkConfig {
        width: 4,
        height: 2,
        fps: Fps::new(10, 1).unwrap(),
        audio: None,
    })
    .unwrap();
    sink.push_frame(FrameIndex(0), &solid(4, 2, 0)).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &solid(4, 2, 0)).is_err());
    assert!(sink.push_frame(FrameIndex(1), &solid(2, 2, 0)).is_err());

    let err = RawCodec
        .probe(&MediaBuffer::new(b"nope".to_vec()))
        .unwrap_err();
    assert_eq!(
        err.kind(),
        crate::foundation::error::ErrorKind::DecodeError
    );
}

fn with_header(header: &str, payload: &[u8]) -> MediaBuffer {
    let mut bytes = b"WRAW".to_vec();
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&(header.len() as u32).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(payload);
    MediaBuffer::new(bytes)
}

#[test]
fn oversized_header_counts_are_decode_errors() {
    use crate::foundation::error::ErrorKind;

    let huge_audio = with_header(
        r#"{"width":0,"height":0,"fps":null,"frameCount":0,
            "audio":{"sampleRate":48000,"channels":65535,"sampleFrames":18446744073709551615}}"#,
        &[0; 16],
    );
    assert_eq!(RawCodec.probe(&huge_audio).unwrap_err().kind(), ErrorKind::DecodeError);
    assert_eq!(
        RawCodec.decode_audio(&huge_audio, None).unwrap_err().kind(),
        ErrorKind::DecodeError
    );

    let huge_video = with_header(
        r#"{"width":4294967295,"height":4294967295,"fps":null,
            "frameCount":18446744073709551615,"audio":null}"#,
        &[],
    );
    assert_eq!(RawCodec.probe(&huge_video).unwrap_err().kind(), ErrorKind::DecodeError);
}
