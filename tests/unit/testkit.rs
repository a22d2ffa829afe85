//! Fixtures shared by unit tests: synthetic raw clips, audio and PNGs.

use std::io::Cursor;

use crate::assets::resolver::InMemoryAssetStore;
use crate::audio::pcm::AudioPcm;
use crate::compose::cancel::CancelToken;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::media::buffer::{MediaBuffer, MediaInfo};
use crate::media::codec::{MediaCodec, SinkConfig, VideoRequest};
use crate::media::raw::RawCodec;
use crate::pipeline::StageContext;
use crate::render::frame::FrameRGBA;

pub(crate) fn fps(n: u32) -> Fps {
    Fps::new(n, 1).unwrap()
}

/// Color of frame `i` in clips built by [`clip`].
pub(crate) fn frame_color(i: u64) -> [u8; 4] {
    [(i % 256) as u8, 100, 50, 255]
}

/// Raw clip whose frame `i` is filled with [`frame_color`].
pub(crate) fn clip(
    width: u32,
    height: u32,
    fps: Fps,
    frames: u64,
    audio: Option<AudioPcm>,
) -> MediaBuffer {
    let mut sink = RawCodec.sink().unwrap();
    sink.begin(SinkConfig {
        width,
        height,
        fps,
        audio,
    })
    .unwrap();
    for i in 0..frames {
        sink.push_frame(FrameIndex(i), &FrameRGBA::solid(width, height, frame_color(i)))
            .unwrap();
    }
    sink.end().unwrap()
}

/// Mono-or-more track whose sample frame `k` has value `k / frames * 0.5` on every channel.
pub(crate) fn ramp(sample_rate: u32, channels: u16, secs: f64) -> AudioPcm {
    let frames = (secs * f64::from(sample_rate)).round() as usize;
    let mut interleaved_f32 = Vec::with_capacity(frames * usize::from(channels));
    for k in 0..frames {
        for _ in 0..channels {
            interleaved_f32.push(k as f32 / frames as f32 * 0.5);
        }
    }
    AudioPcm {
        sample_rate,
        channels,
        interleaved_f32,
    }
}

pub(crate) fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Decode every frame and the whole audio track of a raw buffer.
pub(crate) fn decode_all(buf: &MediaBuffer) -> (MediaInfo, Vec<FrameRGBA>, Option<AudioPcm>) {
    let info = RawCodec.probe(buf).unwrap();
    let mut frames = Vec::new();
    if info.has_video {
        let mut src = RawCodec
            .open_video(
                buf,
                VideoRequest {
                    window: None,
                    fps: info.fps.unwrap(),
                },
            )
            .unwrap();
        while let Some(f) = src.next_frame().unwrap() {
            frames.push(f);
        }
    }
    let audio = RawCodec.decode_audio(buf, None).unwrap();
    (info, frames, audio)
}

/// Asset store plus the settings a [`StageContext`] borrows.
pub(crate) struct Harness {
    pub(crate) store: InMemoryAssetStore,
    pub(crate) cancel: CancelToken,
    pub(crate) codec: RawCodec,
    pub(crate) canvas: Canvas,
    pub(crate) fps: Fps,
}

impl Harness {
    pub(crate) fn new(width: u32, height: u32, fps: Fps) -> Self {
        Self {
            store: InMemoryAssetStore::new(),
            cancel: CancelToken::new(),
            codec: RawCodec,
            canvas: Canvas { width, height },
            fps,
        }
    }

    pub(crate) fn add(&self, id: &str, buf: MediaBuffer) {
        self.store.insert(id, id, buf.into_bytes());
    }

    pub(crate) fn ctx(&self) -> StageContext<'_> {
        StageContext {
            codec: &self.codec,
            resolver: &self.store,
            canvas: self.canvas,
            fps: self.fps,
            background: [0, 0, 0, 255],
            cancel: &self.cancel,
        }
    }
}
