use crate::foundation::error::{EngineResult, Stage};
use crate::media::buffer::MediaBuffer;
use crate::media::codec::{SinkConfig, VideoRequest};
use crate::pipeline::{StageContext, StageProgress, pump_frames};
use crate::render::compositor::{OverlayCompositor, PreparedOverlay};
use crate::timeline::model::{ImageOverlay, TextOverlay};

/// Resolve and decode every image overlay once.
pub(crate) fn prepare_image_overlays(
    ctx: &StageContext<'_>,
    compositor: &OverlayCompositor,
    overlays: &[ImageOverlay],
) -> EngineResult<Vec<PreparedOverlay>> {
    overlays
        .iter()
        .map(|o| {
            let asset = ctx.resolver.resolve_asset(&o.asset_id)?;
            compositor
                .prepare_image(o, &asset.bytes)
                .map_err(|e| e.at_stage(Stage::ImageOverlay))
        })
        .collect()
}

/// Shape every text overlay once.
pub(crate) fn prepare_text_overlays(
    compositor: &mut OverlayCompositor,
    overlays: &[TextOverlay],
) -> EngineResult<Vec<PreparedOverlay>> {
    overlays
        .iter()
        .map(|o| compositor.prepare_text(o))
        .collect()
}

/// Draw image overlays onto `input`.
pub(crate) fn apply_image_overlays(
    ctx: &StageContext<'_>,
    compositor: &mut OverlayCompositor,
    input: MediaBuffer,
    overlays: &[ImageOverlay],
    progress: StageProgress<'_>,
) -> EngineResult<MediaBuffer> {
    if overlays.is_empty() {
        progress(1.0);
        return Ok(input);
    }
    let prepared = prepare_image_overlays(ctx, compositor, overlays)?;
    render_overlays(ctx, compositor, input, &prepared, Stage::ImageOverlay, progress)
}

/// Draw text overlays onto `input`.
pub(crate) fn apply_text_overlays(
    ctx: &StageContext<'_>,
    compositor: &mut OverlayCompositor,
    input: MediaBuffer,
    overlays: &[TextOverlay],
    progress: StageProgress<'_>,
) -> EngineResult<MediaBuffer> {
    if overlays.is_empty() {
        progress(1.0);
        return Ok(input);
    }
    let prepared = prepare_text_overlays(compositor, overlays)?;
    render_overlays(ctx, compositor, input, &prepared, Stage::TextOverlay, progress)
}

/// Re-encode `input` with `prepared` drawn on frames inside their windows.
///
/// A buffer without a video track is returned unchanged; audio passes through.
#[tracing::instrument(skip_all, fields(stage = %stage, overlays = prepared.len()))]
fn render_overlays(
    ctx: &StageContext<'_>,
    compositor: &mut OverlayCompositor,
    input: MediaBuffer,
    prepared: &[PreparedOverlay],
    stage: Stage,
    progress: StageProgress<'_>,
) -> EngineResult<MediaBuffer> {
    let info = ctx.codec.probe(&input).map_err(|e| e.at_stage(stage))?;
    if !info.has_video {
        tracing::debug!("buffer has no video track; overlays skipped");
        progress(1.0);
        return Ok(input);
    }

    let audio = ctx
        .codec
        .decode_audio(&input, None)
        .map_err(|e| e.at_stage(stage))?;
    let mut sink = ctx.codec.sink().map_err(|e| e.at_stage(stage))?;
    sink.begin(SinkConfig {
        width: ctx.canvas.width,
        height: ctx.canvas.height,
        fps: ctx.fps,
        audio,
    })
    .map_err(|e| e.at_stage(stage))?;

    let mut source = ctx
        .codec
        .open_video(
            &input,
            VideoRequest {
                window: None,
                fps: ctx.fps,
            },
        )
        .map_err(|e| e.at_stage(stage))?;
    let mut drawn = 0u64;
    pump_frames(ctx, stage, source.as_mut(), sink.as_mut(), 0, progress, |frame, t| {
        if compositor.apply(frame, t, prepared)? {
            drawn += 1;
        }
        Ok(())
    })?;
    tracing::debug!(frames_with_overlays = drawn, "overlays composited");
    drop(source);

    sink.end().map_err(|e| e.at_stage(stage))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/overlay.rs"]
mod tests;
