//! Lossless in-memory container.
//!
//! Layout: `b"WRAW"`, `u32` LE version, `u32` LE header length, JSON header, then `frameCount`
//! tightly packed premultiplied RGBA8 frames, then interleaved `f32` LE audio samples.

use serde::{Deserialize, Serialize};

use crate::audio::pcm::AudioPcm;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{EngineError, EngineResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::media::buffer::{AudioFormat, MediaBuffer, MediaInfo};
use crate::media::codec::{FrameSink, FrameSource, MediaCodec, SinkConfig, VideoRequest, Window};
use crate::render::frame::FrameRGBA;

const MAGIC: &[u8; 4] = b"WRAW";
const VERSION: u32 = 1;
const PREFIX_LEN: usize = 12;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHeader {
    width: u32,
    height: u32,
    fps: Option<Fps>,
    frame_count: u64,
    audio: Option<RawAudio>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAudio {
    sample_rate: u32,
    channels: u16,
    sample_frames: u64,
}

impl RawHeader {
    fn frame_len(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }

    fn has_video(&self) -> bool {
        self.frame_count > 0 && self.frame_len() > 0 && self.fps.is_some()
    }
}

struct Parsed<'a> {
    header: RawHeader,
    frames: &'a [u8],
    audio: &'a [u8],
}

fn parse(bytes: &[u8]) -> EngineResult<Parsed<'_>> {
    if bytes.len() < PREFIX_LEN || &bytes[0..4] != MAGIC {
        return Err(EngineError::decode("not a raw media container"));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != VERSION {
        return Err(EngineError::decode(format!(
            "unsupported raw container version {version}"
        )));
    }
    let header_len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let header_end = PREFIX_LEN
        .checked_add(header_len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| EngineError::decode("raw container header is truncated"))?;
    let header: RawHeader = serde_json::from_slice(&bytes[PREFIX_LEN..header_end])
        .map_err(|e| EngineError::decode(format!("raw container header is invalid: {e}")))?;

    let video_len = (header.frame_count as usize)
        .checked_mul(header.frame_len())
        .ok_or_else(|| EngineError::decode("raw container video size overflows"))?;
    let audio_len = match header.audio {
        Some(a) => usize::try_from(a.sample_frames)
            .ok()
            .and_then(|n| n.checked_mul(usize::from(a.channels)))
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| EngineError::decode("raw container audio size overflows"))?,
        None => 0,
    };
    let payload_len = video_len
        .checked_add(audio_len)
        .ok_or_else(|| EngineError::decode("raw container payload size overflows"))?;
    if bytes.len() - header_end != payload_len {
        return Err(EngineError::decode(format!(
            "raw container payload has {} bytes, expected {payload_len}",
            bytes.len() - header_end,
        )));
    }

    let frames = &bytes[header_end..header_end + video_len];
    let audio = &bytes[header_end + video_len..];
    Ok(Parsed {
        header,
        frames,
        audio,
    })
}

fn write(header: &RawHeader, frames: &[u8], audio: &[u8]) -> EngineResult<MediaBuffer> {
    let header_json = serde_json::to_vec(header)
        .map_err(|e| EngineError::encode(format!("raw container header: {e}")))?;
    let header_len = u32::try_from(header_json.len())
        .map_err(|_| EngineError::encode("raw container header too large"))?;

    let mut out =
        Vec::with_capacity(PREFIX_LEN + header_json.len() + frames.len() + audio.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(&header_json);
    out.extend_from_slice(frames);
    out.extend_from_slice(audio);
    Ok(MediaBuffer::new(out))
}

/// Built-in lossless codec; needs no external tools.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawCodec;

impl RawCodec {
    /// Container holding only an audio track.
    pub fn audio_container(pcm: &AudioPcm) -> EngineResult<MediaBuffer> {
        let header = RawHeader {
            width: 0,
            height: 0,
            fps: None,
            frame_count: 0,
            audio: Some(RawAudio {
                sample_rate: pcm.sample_rate,
                channels: pcm.channels,
                sample_frames: pcm.frames() as u64,
            }),
        };
        write(&header, &[], &pcm.to_f32le_bytes())
    }
}

impl MediaCodec for RawCodec {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn mime_type(&self) -> &'static str {
        "application/x-wavyte-raw"
    }

    fn probe(&self, buf: &MediaBuffer) -> EngineResult<MediaInfo> {
        let parsed = parse(buf.as_bytes())?;
        let h = &parsed.header;
        let has_video = h.has_video();
        let audio = h.audio.map(|a| AudioFormat {
            sample_rate: a.sample_rate,
            channels: a.channels,
        });
        let duration_secs = match (has_video, h.fps, h.audio) {
            (true, Some(fps), _) => fps.frames_to_secs(h.frame_count),
            (_, _, Some(a)) if a.sample_rate > 0 => {
                a.sample_frames as f64 / f64::from(a.sample_rate)
            }
            _ => 0.0,
        };
        Ok(MediaInfo {
            width: if has_video { h.width } else { 0 },
            height: if has_video { h.height } else { 0 },
            has_video,
            fps: if has_video { h.fps } else { None },
            frame_count: if has_video { h.frame_count } else { 0 },
            duration_secs,
            audio,
        })
    }

    fn open_video<'a>(
        &'a self,
        buf: &'a MediaBuffer,
        req: VideoRequest,
    ) -> EngineResult<Box<dyn FrameSource + 'a>> {
        let parsed = parse(buf.as_bytes())?;
        let h = parsed.header;
        let src_fps = match h.fps {
            Some(fps) if h.has_video() => fps,
            _ => return Err(EngineError::decode("container has no video track")),
        };

        let (start, count) = match req.window {
            Some(w) => (w.start, w.frame_count(req.fps)),
            None if req.fps == src_fps => (0.0, h.frame_count),
            None => {
                let whole = Window {
                    start: 0.0,
                    duration: src_fps.frames_to_secs(h.frame_count),
                };
                (0.0, whole.frame_count(req.fps))
            }
        };

        Ok(Box::new(RawFrameSource {
            frames: parsed.frames,
            width: h.width,
            height: h.height,
            src_frames: h.frame_count,
            src_fps,
            out_fps: req.fps,
            start,
            count,
            emitted: 0,
        }))
    }

    fn decode_audio(
        &self,
        buf: &MediaBuffer,
        window: Option<Window>,
    ) -> EngineResult<Option<AudioPcm>> {
        let parsed = parse(buf.as_bytes())?;
        let Some(a) = parsed.header.audio else {
            return Ok(None);
        };
        let format = AudioFormat {
            sample_rate: a.sample_rate,
            channels: a.channels,
        };
        let pcm = AudioPcm::from_f32le_bytes(format, parsed.audio)?;
        Ok(Some(match window {
            Some(w) => pcm.slice_secs(w.start, w.duration),
            None => pcm,
        }))
    }

    fn sink(&self) -> EngineResult<Box<dyn FrameSink + '_>> {
        Ok(Box::new(RawSink::default()))
    }
}

struct RawFrameSource<'a> {
    frames: &'a [u8],
    width: u32,
    height: u32,
    src_frames: u64,
    src_fps: Fps,
    out_fps: Fps,
    start: f64,
    count: u64,
    emitted: u64,
}

impl FrameSource for RawFrameSource<'_> {
    fn frame_count(&self) -> u64 {
        self.count
    }

    fn next_frame(&mut self) -> EngineResult<Option<FrameRGBA>> {
        if self.emitted >= self.count {
            return Ok(None);
        }
        // Nearest earlier source frame for this output timestamp.
        let t = self.start + self.out_fps.frames_to_secs(self.emitted);
        let src_idx = self
            .src_fps
            .secs_to_frames_floor(t)
            .min(self.src_frames.saturating_sub(1)) as usize;
        self.emitted += 1;

        let len = (self.width as usize) * (self.height as usize) * 4;
        let data = self.frames[src_idx * len..(src_idx + 1) * len].to_vec();
        Ok(Some(FrameRGBA {
            width: self.width,
            height: self.height,
            data,
            premultiplied: true,
        }))
    }
}

#[derive(Default)]
struct RawSink {
    cfg: Option<SinkConfig>,
    frames: Vec<u8>,
    frame_count: u64,
    last_idx: Option<FrameIndex>,
}

impl FrameSink for RawSink {
    fn begin(&mut self, cfg: SinkConfig) -> EngineResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(EngineError::encode("raw sink width/height must be non-zero"));
        }
        self.frames.clear();
        self.frame_count = 0;
        self.last_idx = None;
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> EngineResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| EngineError::encode("raw sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(EngineError::encode(
                "raw sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(EngineError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != (cfg.width as usize) * (cfg.height as usize) * 4 {
            return Err(EngineError::encode(
                "frame.data size mismatch with width*height*4",
            ));
        }

        let start = self.frames.len();
        self.frames.extend_from_slice(&frame.data);
        if !frame.premultiplied {
            premultiply_rgba8_in_place(&mut self.frames[start..]);
        }
        self.frame_count += 1;
        Ok(())
    }

    fn end(&mut self) -> EngineResult<MediaBuffer> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| EngineError::encode("raw sink not started"))?;
        let audio = cfg.audio.as_ref().map(|a| RawAudio {
            sample_rate: a.sample_rate,
            channels: a.channels,
            sample_frames: a.frames() as u64,
        });
        let header = RawHeader {
            width: cfg.width,
            height: cfg.height,
            fps: Some(cfg.fps),
            frame_count: self.frame_count,
            audio,
        };
        let audio_bytes = cfg
            .audio
            .as_ref()
            .map(AudioPcm::to_f32le_bytes)
            .unwrap_or_default();
        let frames = std::mem::take(&mut self.frames);
        write(&header, &frames, &audio_bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/raw.rs"]
mod tests;
