use crate::foundation::error::{EngineError, EngineResult};
use crate::media::buffer::AudioFormat;

/// Decoded interleaved `f32` PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Samples, `channels` values per sample frame.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Silent track of `frames` sample frames.
    pub fn silence(format: AudioFormat, frames: usize) -> Self {
        Self {
            sample_rate: format.sample_rate,
            channels: format.channels,
            interleaved_f32: vec![0.0; frames * usize::from(format.channels)],
        }
    }

    /// Rate and channel layout.
    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved_f32.len() / usize::from(self.channels)
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / f64::from(self.sample_rate)
        }
    }

    /// Sample frame count covering `secs` at this rate.
    pub(crate) fn frames_for_secs(&self, secs: f64) -> usize {
        (secs.max(0.0) * f64::from(self.sample_rate)).round() as usize
    }

    /// Copy of `[start, start + duration)`, truncated at the end of the track.
    pub fn slice_secs(&self, start: f64, duration: f64) -> Self {
        let ch = usize::from(self.channels);
        let total = self.frames();
        let first = self.frames_for_secs(start).min(total);
        let last = (first + self.frames_for_secs(duration)).min(total);
        Self {
            sample_rate: self.sample_rate,
            channels: self.channels,
            interleaved_f32: self.interleaved_f32[first * ch..last * ch].to_vec(),
        }
    }

    /// Truncate or pad with silence to exactly `secs`.
    pub fn fit_to_secs(&mut self, secs: f64) {
        let want = self.frames_for_secs(secs) * usize::from(self.channels);
        self.interleaved_f32.resize(want, 0.0);
    }

    /// Convert to `format` (linear resampling, then channel remapping).
    pub fn convert_to(&self, format: AudioFormat) -> Self {
        let resampled = if self.sample_rate == format.sample_rate {
            self.clone()
        } else {
            self.resample_linear(format.sample_rate)
        };
        if resampled.channels == format.channels {
            resampled
        } else {
            resampled.remix(format.channels)
        }
    }

    /// Resample with linear interpolation between neighbouring sample frames.
    pub fn resample_linear(&self, sample_rate: u32) -> Self {
        let ch = usize::from(self.channels);
        let src_frames = self.frames();
        if src_frames == 0 || self.sample_rate == 0 || sample_rate == 0 {
            return Self {
                sample_rate,
                channels: self.channels,
                interleaved_f32: Vec::new(),
            };
        }
        let dst_frames = ((src_frames as f64) * f64::from(sample_rate)
            / f64::from(self.sample_rate))
        .round() as usize;
        let step = f64::from(self.sample_rate) / f64::from(sample_rate);

        let src = &self.interleaved_f32;
        let mut out = Vec::with_capacity(dst_frames * ch);
        for i in 0..dst_frames {
            let pos = i as f64 * step;
            let f0 = (pos.floor() as usize).min(src_frames - 1);
            let f1 = (f0 + 1).min(src_frames - 1);
            let frac = (pos - f0 as f64) as f32;
            for c in 0..ch {
                let v0 = src[f0 * ch + c];
                let v1 = src[f1 * ch + c];
                out.push(v0 + (v1 - v0) * frac);
            }
        }
        Self {
            sample_rate,
            channels: self.channels,
            interleaved_f32: out,
        }
    }

    /// Change the channel count: down-mix averages, up-mix repeats source channels.
    pub fn remix(&self, channels: u16) -> Self {
        let src_ch = usize::from(self.channels);
        let dst_ch = usize::from(channels);
        if src_ch == dst_ch || src_ch == 0 || dst_ch == 0 {
            return Self {
                sample_rate: self.sample_rate,
                channels,
                interleaved_f32: if src_ch == dst_ch {
                    self.interleaved_f32.clone()
                } else {
                    Vec::new()
                },
            };
        }

        let mut out = Vec::with_capacity(self.frames() * dst_ch);
        for frame in self.interleaved_f32.chunks_exact(src_ch) {
            if dst_ch == 1 {
                out.push(frame.iter().sum::<f32>() / src_ch as f32);
            } else {
                for c in 0..dst_ch {
                    out.push(frame[c % src_ch]);
                }
            }
        }
        Self {
            sample_rate: self.sample_rate,
            channels,
            interleaved_f32: out,
        }
    }

    /// Append `other`, which must share this track's format.
    pub fn append(&mut self, other: &AudioPcm) -> EngineResult<()> {
        if other.format() != self.format() {
            return Err(EngineError::validation(format!(
                "cannot append {} Hz/{} ch audio to {} Hz/{} ch audio",
                other.sample_rate, other.channels, self.sample_rate, self.channels
            )));
        }
        self.interleaved_f32.extend_from_slice(&other.interleaved_f32);
        Ok(())
    }

    /// Little-endian `f32` bytes of the interleaved samples.
    pub(crate) fn to_f32le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::<u8>::with_capacity(self.interleaved_f32.len() * 4);
        for &sample in &self.interleaved_f32 {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    /// Parse little-endian `f32` samples.
    pub(crate) fn from_f32le_bytes(format: AudioFormat, bytes: &[u8]) -> EngineResult<Self> {
        if !bytes.len().is_multiple_of(4) {
            return Err(EngineError::decode(
                "decoded audio byte length is not aligned to f32 samples",
            ));
        }
        let mut pcm = Vec::<f32>::with_capacity(bytes.len() / 4);
        for chunk in bytes.chunks_exact(4) {
            pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        Ok(Self {
            sample_rate: format.sample_rate,
            channels: format.channels,
            interleaved_f32: pcm,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pcm.rs"]
mod tests;
