use std::path::Path;

use crate::audio::pcm::AudioPcm;
use crate::foundation::error::{EngineError, EngineResult};

/// Multiply every sample by `volume`.
pub(crate) fn scale_volume(pcm: &mut AudioPcm, volume: f32) {
    if volume == 1.0 {
        return;
    }
    for s in &mut pcm.interleaved_f32 {
        *s *= volume;
    }
}

/// Add `src` onto `dst` (converted to `dst`'s format first), clamping to `[-1, 1]`.
///
/// Samples of `src` past the end of `dst` are dropped.
pub(crate) fn mix_into(dst: &mut AudioPcm, src: &AudioPcm) {
    let converted;
    let src = if src.format() == dst.format() {
        src
    } else {
        converted = src.convert_to(dst.format());
        &converted
    };

    for (d, s) in dst.interleaved_f32.iter_mut().zip(&src.interleaved_f32) {
        *d = (*d + *s).clamp(-1.0, 1.0);
    }
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub(crate) fn write_f32le_file(pcm: &AudioPcm, out_path: &Path) -> EngineResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            EngineError::encode(format!(
                "failed to create audio output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(out_path, pcm.to_f32le_bytes()).map_err(|e| {
        EngineError::encode(format!(
            "failed to write audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
