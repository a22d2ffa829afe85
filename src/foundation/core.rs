use crate::foundation::error::{EngineError, EngineResult};

pub use kurbo::Rect;

/// 0-based frame index in the local time of one media buffer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> EngineResult<Self> {
        if den == 0 {
            return Err(EngineError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(EngineError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert a floating-point rate into a rational.
    ///
    /// NTSC-style rates (`29.97`, `23.976`, `59.94`) map to their exact `x000/1001` form.
    pub fn from_f64(fps: f64) -> EngineResult<Self> {
        if !fps.is_finite() || fps <= 0.0 || fps > 1000.0 {
            return Err(EngineError::validation(format!(
                "fps must be finite and in (0, 1000], got {fps}"
            )));
        }
        let rounded = fps.round();
        if (fps - rounded).abs() < 1e-6 {
            return Self::new(rounded as u32, 1);
        }
        let ntsc = (fps * 1001.0 / 1000.0).round();
        if (ntsc * 1000.0 / 1001.0 - fps).abs() < 1e-2 {
            return Self::new(ntsc as u32 * 1000, 1001);
        }
        let num = (fps * 1000.0).round() as u32;
        let g = gcd(num, 1000);
        Self::new(num / g, 1000 / g)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64() + 1e-9).floor().max(0.0) as u64
    }

    /// Convert seconds to the nearest frame count.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a.max(1) } else { gcd(b, a % b) }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Premultiply a straight-alpha color.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Byte array in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
