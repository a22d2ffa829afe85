use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{EngineError, EngineResult};

/// Time span in seconds, `start < end`, both non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive start in seconds.
    pub start: f64,
    /// End in seconds.
    pub end: f64,
}

impl TimeRange {
    /// Create a validated range.
    pub fn new(start: f64, end: f64) -> EngineResult<Self> {
        let r = Self { start, end };
        r.validate("time range")?;
        Ok(r)
    }

    /// Check finiteness, non-negativity and `end > start`.
    pub fn validate(&self, what: &str) -> EngineResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(EngineError::validation(format!(
                "{what} must have finite bounds"
            )));
        }
        if self.start < 0.0 {
            return Err(EngineError::validation(format!(
                "{what} start must be >= 0, got {}",
                self.start
            )));
        }
        if self.end <= self.start {
            return Err(EngineError::validation(format!(
                "{what} end must be > start ({} <= {})",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Inclusive containment test used for overlay visibility.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Pointer into an external asset plus the sub-range of interest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    /// Opaque identifier understood by the asset resolver.
    pub asset_id: String,
    /// Human-readable name, informational only.
    #[serde(default)]
    pub display_name: String,
    /// Range of the asset's own time to use.
    pub time_range: TimeRange,
    /// Linear gain for audio references, `[0, 1]`.
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Mix with the row's original audio instead of replacing it.
    #[serde(default)]
    pub mix_with_original: bool,
}

impl AssetRef {
    /// Reference `asset_id` over `time_range` with default audio settings.
    pub fn new(asset_id: impl Into<String>, time_range: TimeRange) -> Self {
        Self {
            asset_id: asset_id.into(),
            display_name: String::new(),
            time_range,
            volume: default_volume(),
            mix_with_original: false,
        }
    }
}

fn default_volume() -> f32 {
    1.0
}

/// Anchor positions accepted by image overlays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImagePosition {
    /// Top-left corner, padded.
    TopLeft,
    /// Top-right corner, padded.
    TopRight,
    /// Bottom-left corner, padded.
    BottomLeft,
    /// Bottom-right corner, padded.
    BottomRight,
    /// Centered on the canvas.
    Center,
    /// Stretched over the whole canvas.
    FullScreen,
}

/// Anchor positions accepted by text overlays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextPosition {
    /// Top-left corner, padded.
    TopLeft,
    /// Top-right corner, padded.
    TopRight,
    /// Bottom-left corner, padded.
    BottomLeft,
    /// Bottom-right corner, padded.
    BottomRight,
    /// Centered on the canvas.
    Center,
    /// Whole canvas; the text box is centered.
    FullScreen,
    /// Horizontally centered at the top pad.
    TopCenter,
    /// Horizontally centered at the bottom pad.
    BottomCenter,
}

/// Image drawn over a row's frames within a local time window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOverlay {
    /// Image asset identifier.
    pub asset_id: String,
    /// Human-readable name, informational only.
    #[serde(default)]
    pub display_name: String,
    /// Where the image is anchored.
    pub position: ImagePosition,
    /// Window in the row's local clip time.
    pub time_range: TimeRange,
    /// Overlay width as a fraction of the canvas width, `(0, 1]`.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    0.2
}

/// CSS-like font weight (`normal`, `bold`, or `100..=900`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FontWeight(pub u16);

impl FontWeight {
    /// Regular weight (400).
    pub const NORMAL: Self = Self(400);
    /// Bold weight (700).
    pub const BOLD: Self = Self(700);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(u16),
            Name(String),
        }

        let w = match Repr::deserialize(deserializer)? {
            Repr::Num(n) => n,
            Repr::Name(s) => match s.trim().to_ascii_lowercase().as_str() {
                "normal" | "regular" => 400,
                "bold" => 700,
                "light" => 300,
                "medium" => 500,
                "semibold" | "semi-bold" => 600,
                "black" | "heavy" => 900,
                other => other.parse::<u16>().map_err(|_| {
                    serde::de::Error::custom(format!("unknown font weight '{other}'"))
                })?,
            },
        };
        if !(1..=1000).contains(&w) {
            return Err(serde::de::Error::custom(format!(
                "font weight must be in 1..=1000, got {w}"
            )));
        }
        Ok(Self(w))
    }
}

/// Text box drawn over a row's frames within a local time window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    /// Text content; newlines start new lines.
    pub text: String,
    /// Where the box is anchored.
    pub position: TextPosition,
    /// Window in the row's local clip time.
    pub time_range: TimeRange,
    /// Font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Foreground color (`#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()/rgba()` or a CSS name).
    #[serde(default = "default_font_color")]
    pub font_color: String,
    /// Background box color, drawn at 60% opacity.
    #[serde(default = "default_background_color")]
    pub background_color: String,
    /// Font weight.
    #[serde(default)]
    pub font_weight: FontWeight,
}

fn default_font_size() -> f32 {
    48.0
}

fn default_font_color() -> String {
    "#ffffff".to_string()
}

fn default_background_color() -> String {
    "#000000".to_string()
}

/// One segment of the output clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRow {
    /// Intended placement in the output; advisory.
    pub time_in_clip: TimeRange,
    /// Free-form description of the row, not interpreted.
    #[serde(default)]
    pub action: String,
    /// Visual source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_asset: Option<AssetRef>,
    /// Audio source replacing (or mixed into) the row's own audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_asset: Option<AssetRef>,
    /// Image overlays, drawn in list order.
    #[serde(default)]
    pub image_overlays: Vec<ImageOverlay>,
    /// Text overlays, drawn in list order after image overlays.
    #[serde(default)]
    pub text_overlays: Vec<TextOverlay>,
}

impl TimelineRow {
    /// Row with only a video source and no overlays.
    pub fn with_video(time_in_clip: TimeRange, video: AssetRef) -> Self {
        Self {
            time_in_clip,
            action: String::new(),
            video_asset: Some(video),
            audio_asset: None,
            image_overlays: Vec::new(),
            text_overlays: Vec::new(),
        }
    }
}

/// Declarative plan of the output clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// Rows in output order.
    pub rows: Vec<TimelineRow>,
    /// Name handed to the publisher.
    pub output_name: String,
    /// Output width in pixels.
    pub target_width: u32,
    /// Output height in pixels.
    pub target_height: u32,
    /// Output frame rate.
    pub target_fps: f64,
}

impl Timeline {
    /// Parse timeline JSON.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::validation(format!("timeline json is invalid: {e}")))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::validation(format!("timeline serialization failed: {e}")))
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.target_width,
            height: self.target_height,
        }
    }

    /// Output frame rate as a rational.
    pub fn fps(&self) -> EngineResult<Fps> {
        Fps::from_f64(self.target_fps)
    }

    /// Nominal end of the output as planned by the caller.
    pub fn nominal_duration_secs(&self) -> f64 {
        self.rows.last().map(|r| r.time_in_clip.end).unwrap_or(0.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
