//! wavyte-reel turns a declarative timeline into one finished video.
//!
//! A [`Timeline`] lists rows. Each row trims a source video, draws image and text overlays inside
//! local time windows and optionally replaces (or mixes) the audio. Processed rows are
//! concatenated and the result is handed to a [`ResultPublisher`].
//!
//! - Load a [`Timeline`] and an [`EngineConfig`]
//! - Create a [`Composer`] over an [`AssetResolver`] / [`ResultPublisher`] pair
//! - Call [`Composer::compose`] and inspect the [`ComposeResult`]
//!
//! Media work goes through the [`MediaCodec`] seam: [`FfmpegCodec`] drives the system
//! `ffmpeg`/`ffprobe`, [`RawCodec`] is a lossless in-memory container for tests and hosts without
//! ffmpeg.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod audio;
mod compose;
mod config;
mod foundation;
mod media;
mod pipeline;
mod render;
mod timeline;

#[cfg(test)]
#[path = "../tests/unit/testkit.rs"]
pub(crate) mod testkit;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{EngineError, EngineResult, ErrorKind, Stage};

pub use crate::assets::resolver::{
    AssetResolver, DirAssetStore, InMemoryAssetStore, ResolvedAsset, ResultPublisher,
};
pub use crate::audio::pcm::AudioPcm;
pub use crate::compose::cancel::CancelToken;
pub use crate::compose::orchestrator::Composer;
pub use crate::compose::progress::{ProgressEvent, ProgressTracker};
pub use crate::compose::result::{ComposeData, ComposeError, ComposeResult};
pub use crate::config::{
    CodecKind, ENV_PREFIX, EngineConfig, FfmpegConfig, MissingVideoPolicy, PipelineMode,
};
pub use crate::media::buffer::{AudioFormat, MediaBuffer, MediaInfo};
pub use crate::media::codec::{FrameSink, FrameSource, MediaCodec, SinkConfig, VideoRequest, Window};
pub use crate::media::ffmpeg::{FfmpegCodec, is_tool_on_path};
pub use crate::media::raw::RawCodec;
pub use crate::render::frame::FrameRGBA;
pub use crate::timeline::model::{
    AssetRef, FontWeight, ImageOverlay, ImagePosition, TextOverlay, TextPosition, TimeRange,
    Timeline, TimelineRow,
};
pub use crate::timeline::validate::validate_timeline;
