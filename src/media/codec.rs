use crate::audio::pcm::AudioPcm;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::EngineResult;
use crate::media::buffer::{MediaBuffer, MediaInfo};
use crate::render::frame::FrameRGBA;

/// Time window in the source's own time, already clamped to the available media.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
    /// Start in seconds.
    pub start: f64,
    /// Length in seconds.
    pub duration: f64,
}

impl Window {
    /// Number of output frames covering this window at `fps`.
    pub fn frame_count(&self, fps: Fps) -> u64 {
        fps.secs_to_frames_round(self.duration)
    }
}

/// What a [`FrameSource`] should produce.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoRequest {
    /// Source window; `None` decodes the whole stream.
    pub window: Option<Window>,
    /// Output frame rate; frames are resampled to it.
    pub fps: Fps,
}

/// Pull-based stream of decoded frames.
pub trait FrameSource {
    /// Exact number of frames this source yields.
    fn frame_count(&self) -> u64;
    /// Next frame in time order, `None` after the last one.
    fn next_frame(&mut self) -> EngineResult<Option<FrameRGBA>>;
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Audio track to mux, already fitted to the video duration.
    pub audio: Option<AudioPcm>,
}

/// Encoder contract for producing a [`MediaBuffer`] from frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> EngineResult<()>;
    /// Push one frame in strictly increasing order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> EngineResult<()>;
    /// Finish encoding and return the container.
    fn end(&mut self) -> EngineResult<MediaBuffer>;
}

/// Container/codec family used for every intermediate and final buffer.
pub trait MediaCodec: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;
    /// MIME type of produced containers.
    fn mime_type(&self) -> &'static str;
    /// Summarize the streams of `buf`.
    fn probe(&self, buf: &MediaBuffer) -> EngineResult<MediaInfo>;
    /// Open a frame stream over `buf`.
    fn open_video<'a>(
        &'a self,
        buf: &'a MediaBuffer,
        req: VideoRequest,
    ) -> EngineResult<Box<dyn FrameSource + 'a>>;
    /// Decode the audio track over `window` (whole track for `None`), keeping its rate and layout.
    ///
    /// Returns `None` when the container has no audio.
    fn decode_audio(
        &self,
        buf: &MediaBuffer,
        window: Option<Window>,
    ) -> EngineResult<Option<AudioPcm>>;
    /// Fresh encoder.
    fn sink(&self) -> EngineResult<Box<dyn FrameSink + '_>>;
}
