use crate::foundation::core::FrameIndex;
use crate::foundation::error::{EngineError, EngineResult, Stage};
use crate::media::buffer::MediaBuffer;
use crate::media::codec::{SinkConfig, VideoRequest};
use crate::pipeline::range::clamp_window;
use crate::pipeline::{StageContext, StageProgress, pump_frames};
use crate::render::compositor::solid_frame;
use crate::timeline::model::TimeRange;

/// Trim `asset_id` to `range` into a new buffer at the target canvas and frame rate.
///
/// Output timestamps start at zero; the parallel audio track is cut to the same window and fitted
/// to the video duration.
#[tracing::instrument(skip(ctx, progress), fields(codec = ctx.codec.name()))]
pub(crate) fn extract(
    ctx: &StageContext<'_>,
    asset_id: &str,
    range: TimeRange,
    progress: StageProgress<'_>,
) -> EngineResult<MediaBuffer> {
    let stage = Stage::Extract;
    let src = ctx.resolve(asset_id)?;
    let info = ctx.codec.probe(&src).map_err(|e| e.at_stage(stage))?;
    if !info.has_video {
        return Err(
            EngineError::decode(format!("asset '{asset_id}' has no video track")).at_stage(stage),
        );
    }

    let window = clamp_window(range, info.duration_secs, &format!("video asset '{asset_id}'"))?;
    let frames = window.frame_count(ctx.fps);
    if frames == 0 {
        return Err(EngineError::range(format!(
            "video asset '{asset_id}': window of {:.4}s is shorter than one frame",
            window.duration
        )));
    }
    let video_secs = ctx.fps.frames_to_secs(frames);

    let audio = ctx
        .codec
        .decode_audio(&src, Some(window))
        .map_err(|e| e.at_stage(stage))?
        .map(|mut pcm| {
            pcm.fit_to_secs(video_secs);
            pcm
        });

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
            &src,
            VideoRequest {
                window: Some(window),
                fps: ctx.fps,
            },
        )
        .map_err(|e| e.at_stage(stage))?;
    let written = pump_frames(ctx, stage, source.as_mut(), sink.as_mut(), 0, progress, |_, _| Ok(()))?;
    tracing::debug!(frames = written, start = window.start, duration = window.duration, "extracted");

    sink.end().map_err(|e| e.at_stage(stage))
}

/// Solid-color clip of `duration` seconds without audio.
pub(crate) fn placeholder(
    ctx: &StageContext<'_>,
    duration: f64,
    rgba: [u8; 4],
    progress: StageProgress<'_>,
) -> EngineResult<MediaBuffer> {
    let stage = Stage::Extract;
    let frames = ctx.fps.secs_to_frames_round(duration);
    if frames == 0 {
        return Err(EngineError::range(format!(
            "placeholder of {duration:.4}s is shorter than one frame"
        )));
    }

    let mut sink = ctx.codec.sink().map_err(|e| e.at_stage(stage))?;
    sink.begin(SinkConfig {
        width: ctx.canvas.width,
        height: ctx.canvas.height,
        fps: ctx.fps,
        audio: None,
    })
    .map_err(|e| e.at_stage(stage))?;
    let frame = solid_frame(ctx.canvas, rgba);
    for i in 0..frames {
        ctx.cancel.check()?;
        sink.push_frame(FrameIndex(i), &frame)
            .map_err(|e| e.at_stage(stage))?;
        progress((i + 1) as f64 / frames as f64);
    }
    sink.end().map_err(|e| e.at_stage(stage))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/extract.rs"]
mod tests;
