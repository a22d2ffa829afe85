//! Per-row media stages: extract, overlays, audio, concatenation, and the fused row renderer.

pub(crate) mod audio;
pub(crate) mod concat;
pub(crate) mod extract;
pub(crate) mod fused;
pub(crate) mod overlay;
pub(crate) mod range;

use crate::assets::resolver::AssetResolver;
use crate::compose::cancel::CancelToken;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{EngineError, EngineResult, Stage};
use crate::media::buffer::MediaBuffer;
use crate::media::codec::{FrameSink, FrameSource, MediaCodec};
use crate::render::compositor::fit_base_frame;
use crate::render::frame::FrameRGBA;

/// Everything a stage needs besides its input.
pub(crate) struct StageContext<'a> {
    pub(crate) codec: &'a dyn MediaCodec,
    pub(crate) resolver: &'a dyn AssetResolver,
    pub(crate) canvas: Canvas,
    pub(crate) fps: Fps,
    /// Letterbox color (straight RGBA).
    pub(crate) background: [u8; 4],
    pub(crate) cancel: &'a CancelToken,
}

impl StageContext<'_> {
    /// Resolve an asset into a buffer.
    pub(crate) fn resolve(&self, asset_id: &str) -> EngineResult<MediaBuffer> {
        let asset = self.resolver.resolve_asset(asset_id)?;
        tracing::debug!(asset_id, name = %asset.display_name, bytes = asset.bytes.len(), "resolved asset");
        Ok(MediaBuffer::new(asset.bytes))
    }
}

/// Sub-progress callback receiving a fraction in `[0, 1]`.
pub(crate) type StageProgress<'p> = &'p mut dyn FnMut(f64);

/// Pull `count` frames from `source`, fit each to the canvas, let `edit` modify it, and push it.
///
/// `edit` receives the frame's local time in seconds.
pub(crate) fn pump_frames(
    ctx: &StageContext<'_>,
    stage: Stage,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    first_index: u64,
    progress: StageProgress<'_>,
    mut edit: impl FnMut(&mut FrameRGBA, f64) -> EngineResult<()>,
) -> EngineResult<u64> {
    let count = source.frame_count();
    for i in 0..count {
        ctx.cancel.check()?;
        let frame = source
            .next_frame()
            .map_err(|e| e.at_stage(stage))?
            .ok_or_else(|| {
                EngineError::decode(format!("stream ended after {i} of {count} frames"))
                    .at_stage(stage)
            })?;
        let mut frame = fit_base_frame(frame, ctx.canvas, ctx.background).map_err(|e| e.at_stage(stage))?;
        edit(&mut frame, ctx.fps.frames_to_secs(i))?;
        sink.push_frame(FrameIndex(first_index + i), &frame)
            .map_err(|e| e.at_stage(stage))?;
        progress((i + 1) as f64 / count as f64);
    }
    Ok(count)
}
