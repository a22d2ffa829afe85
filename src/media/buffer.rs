use crate::foundation::core::Fps;

/// In-memory encoded container (video and optional audio).
///
/// Buffers are move-only: every stage consumes its input and produces a new buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct MediaBuffer {
    bytes: Vec<u8>,
}

impl MediaBuffer {
    /// Wrap encoded bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Borrow the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Return `true` for an empty buffer.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Audio track layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

/// Stream summary returned by [`crate::MediaCodec::probe`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    /// Video width in pixels (0 without video).
    pub width: u32,
    /// Video height in pixels (0 without video).
    pub height: u32,
    /// Whether a video track is present.
    pub has_video: bool,
    /// Video frame rate.
    pub fps: Option<Fps>,
    /// Number of video frames.
    pub frame_count: u64,
    /// Container duration in seconds (video duration when video is present).
    pub duration_secs: f64,
    /// Audio track layout, if any.
    pub audio: Option<AudioFormat>,
}
