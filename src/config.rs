use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::color::parse_color;
use crate::foundation::error::{EngineError, EngineResult};
use crate::media::codec::MediaCodec;
use crate::media::ffmpeg::FfmpegCodec;
use crate::media::raw::RawCodec;

/// Prefix of environment variables that override [`EngineConfig`] fields.
pub const ENV_PREFIX: &str = "WAVYTE_REEL_";

/// Container/codec family for intermediate and final buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// System `ffmpeg`/`ffprobe`, H.264/AAC MP4.
    #[default]
    Ffmpeg,
    /// Built-in lossless container.
    Raw,
}

/// How each row is processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// One re-encode per stage (extract, overlays, audio).
    #[default]
    Staged,
    /// Single decode and encode per row.
    Fused,
}

/// What to do with rows that have no `videoAsset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingVideoPolicy {
    /// Drop the row.
    #[default]
    Skip,
    /// Render a solid-color clip for the row's `timeInClip` duration.
    Placeholder,
    /// Fail validation.
    Reject,
}

/// `ffmpeg` binaries and encoder settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FfmpegConfig {
    /// `ffmpeg` executable.
    pub binary: String,
    /// `ffprobe` executable.
    pub probe_binary: String,
    /// libx264 constant rate factor (0-51).
    pub crf: u8,
    /// libx264 preset.
    pub preset: String,
    /// AAC bitrate, e.g. `192k`.
    pub audio_bitrate: String,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            probe_binary: "ffprobe".to_string(),
            crf: 18,
            preset: "veryfast".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// Engine configuration, loaded from JSON with environment overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Codec family.
    pub codec: CodecKind,
    /// Row processing mode.
    pub pipeline: PipelineMode,
    /// Policy for rows without video.
    pub missing_video: MissingVideoPolicy,
    /// Fill color of placeholder rows.
    pub placeholder_color: String,
    /// Font file for text overlays; common system locations are probed when unset.
    pub font_path: Option<PathBuf>,
    /// `ffmpeg` settings.
    pub ffmpeg: FfmpegConfig,
    /// Bounded capacity of progress channel subscribers.
    pub progress_capacity: usize,
    /// Letterbox color behind base frames that do not fill the canvas.
    pub background_color: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            codec: CodecKind::default(),
            pipeline: PipelineMode::default(),
            missing_video: MissingVideoPolicy::default(),
            placeholder_color: "#000000".to_string(),
            font_path: None,
            ffmpeg: FfmpegConfig::default(),
            progress_capacity: 256,
            background_color: "#000000".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration JSON.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::config(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            EngineError::config(format!("open config JSON '{}': {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            EngineError::config(format!("parse config JSON '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `WAVYTE_REEL_*` variables from the process environment.
    pub fn with_env_overrides(self) -> EngineResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` (called with full variable names).
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> EngineResult<Self> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("CODEC") {
            self.codec = parse_enum("CODEC", &v)?;
        }
        if let Some(v) = var("PIPELINE") {
            self.pipeline = parse_enum("PIPELINE", &v)?;
        }
        if let Some(v) = var("MISSING_VIDEO") {
            self.missing_video = parse_enum("MISSING_VIDEO", &v)?;
        }
        if let Some(v) = var("PLACEHOLDER_COLOR") {
            self.placeholder_color = v;
        }
        if let Some(v) = var("FONT_PATH") {
            self.font_path = Some(PathBuf::from(v));
        }
        if let Some(v) = var("FFMPEG") {
            self.ffmpeg.binary = v;
        }
        if let Some(v) = var("FFPROBE") {
            self.ffmpeg.probe_binary = v;
        }
        if let Some(v) = var("CRF") {
            self.ffmpeg.crf = v
                .parse()
                .map_err(|_| EngineError::config(format!("{ENV_PREFIX}CRF is not a number: '{v}'")))?;
        }
        if let Some(v) = var("PRESET") {
            self.ffmpeg.preset = v;
        }
        if let Some(v) = var("PROGRESS_CAPACITY") {
            self.progress_capacity = v.parse().map_err(|_| {
                EngineError::config(format!("{ENV_PREFIX}PROGRESS_CAPACITY is not a number: '{v}'"))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check field ranges and color syntax.
    pub fn validate(&self) -> EngineResult<()> {
        parse_color(&self.placeholder_color)
            .map_err(|e| EngineError::config(format!("placeholderColor: {e}")))?;
        parse_color(&self.background_color)
            .map_err(|e| EngineError::config(format!("backgroundColor: {e}")))?;
        if self.ffmpeg.crf > 51 {
            return Err(EngineError::config(format!(
                "ffmpeg.crf must be in 0..=51, got {}",
                self.ffmpeg.crf
            )));
        }
        if self.ffmpeg.binary.trim().is_empty() || self.ffmpeg.probe_binary.trim().is_empty() {
            return Err(EngineError::config("ffmpeg binaries must be non-empty"));
        }
        if self.progress_capacity == 0 {
            return Err(EngineError::config("progressCapacity must be > 0"));
        }
        Ok(())
    }

    /// Instantiate the configured codec.
    pub fn build_codec(&self) -> Arc<dyn MediaCodec> {
        match self.codec {
            CodecKind::Ffmpeg => Arc::new(FfmpegCodec::new(self.ffmpeg.clone())),
            CodecKind::Raw => Arc::new(RawCodec),
        }
    }

    pub(crate) fn placeholder_rgba(&self) -> [u8; 4] {
        parse_color(&self.placeholder_color).unwrap_or([0, 0, 0, 255])
    }

    pub(crate) fn background_rgba(&self) -> [u8; 4] {
        parse_color(&self.background_color).unwrap_or([0, 0, 0, 255])
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(name: &str, value: &str) -> EngineResult<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_ascii_lowercase()))
        .map_err(|_| EngineError::config(format!("{ENV_PREFIX}{name} has invalid value '{value}'")))
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
