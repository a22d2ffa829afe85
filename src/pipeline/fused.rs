use crate::audio::pcm::AudioPcm;
use crate::foundation::error::{EngineError, EngineResult, Stage};
use crate::media::buffer::MediaBuffer;
use crate::media::codec::{FrameSource, SinkConfig, VideoRequest, Window};
use crate::pipeline::audio::build_audio_track;
use crate::pipeline::overlay::{prepare_image_overlays, prepare_text_overlays};
use crate::pipeline::range::clamp_window;
use crate::pipeline::{StageContext, StageProgress, pump_frames};
use crate::render::compositor::{OverlayCompositor, solid_frame};
use crate::render::frame::FrameRGBA;
use crate::timeline::model::{AssetRef, TimelineRow};

/// Where a row's base frames come from.
#[derive(Clone, Copy, Debug)]
pub(crate) enum RowBase<'r> {
    /// The row's video asset, trimmed to its range.
    Video(&'r AssetRef),
    /// A solid clip of `duration` seconds.
    Placeholder { duration: f64, rgba: [u8; 4] },
}

/// Render one row in a single decode/encode pass.
///
/// Produces the same frames and audio as running extract, image overlays, text overlays and audio
/// one after another, without the intermediate buffers.
#[tracing::instrument(skip_all, fields(base = ?base))]
pub(crate) fn render_row(
    ctx: &StageContext<'_>,
    compositor: &mut OverlayCompositor,
    row: &TimelineRow,
    base: RowBase<'_>,
    progress: StageProgress<'_>,
) -> EngineResult<MediaBuffer> {
    let stage = Stage::Extract;
    let images = prepare_image_overlays(ctx, compositor, &row.image_overlays)?;
    let texts = prepare_text_overlays(compositor, &row.text_overlays)?;

    let src;
    let (mut source, original) = match base {
        RowBase::Video(video) => {
            src = ctx.resolve(&video.asset_id)?;
            let info = ctx.codec.probe(&src).map_err(|e| e.at_stage(stage))?;
            if !info.has_video {
                return Err(EngineError::decode(format!(
                    "asset '{}' has no video track",
                    video.asset_id
                ))
                .at_stage(stage));
            }
            let window = clamp_window(
                video.time_range,
                info.duration_secs,
                &format!("video asset '{}'", video.asset_id),
            )?;
            let frames = window.frame_count(ctx.fps);
            if frames == 0 {
                return Err(EngineError::range(format!(
                    "video asset '{}': window of {:.4}s is shorter than one frame",
                    video.asset_id, window.duration
                )));
            }
            let original = original_audio(ctx, &src, window, ctx.fps.frames_to_secs(frames))?;
            let source = ctx
                .codec
                .open_video(
                    &src,
                    VideoRequest {
                        window: Some(window),
                        fps: ctx.fps,
                    },
                )
                .map_err(|e| e.at_stage(stage))?;
            (source, original)
        }
        RowBase::Placeholder { duration, rgba } => {
            let count = ctx.fps.secs_to_frames_round(duration);
            if count == 0 {
                return Err(EngineError::range(format!(
                    "placeholder of {duration:.4}s is shorter than one frame"
                )));
            }
            let source: Box<dyn FrameSource + '_> = Box::new(SolidSource {
                frame: solid_frame(ctx.canvas, rgba),
                count,
                emitted: 0,
            });
            (source, None)
        }
    };

    let video_secs = ctx.fps.frames_to_secs(source.frame_count());
    let audio = match &row.audio_asset {
        Some(audio_ref) => Some(build_audio_track(ctx, audio_ref, original, video_secs)?),
        None => original,
    };

    let mut sink = ctx.codec.sink().map_err(|e| e.at_stage(stage))?;
    sink.begin(SinkConfig {
        width: ctx.canvas.width,
        height: ctx.canvas.height,
        fps: ctx.fps,
        audio,
    })
    .map_err(|e| e.at_stage(stage))?;
    pump_frames(ctx, stage, source.as_mut(), sink.as_mut(), 0, progress, |frame, t| {
        compositor.apply(frame, t, &images)?;
        compositor.apply(frame, t, &texts)?;
        Ok(())
    })?;
    drop(source);

    sink.end().map_err(|e| e.at_stage(stage))
}

fn original_audio(
    ctx: &StageContext<'_>,
    src: &MediaBuffer,
    window: Window,
    video_secs: f64,
) -> EngineResult<Option<AudioPcm>> {
    Ok(ctx
        .codec
        .decode_audio(src, Some(window))
        .map_err(|e| e.at_stage(Stage::Extract))?
        .map(|mut pcm| {
            pcm.fit_to_secs(video_secs);
            pcm
        }))
}

/// Repeats one canvas-sized frame.
struct SolidSource {
    frame: FrameRGBA,
    count: u64,
    emitted: u64,
}

impl FrameSource for SolidSource {
    fn frame_count(&self) -> u64 {
        self.count
    }

    fn next_frame(&mut self) -> EngineResult<Option<FrameRGBA>> {
        if self.emitted >= self.count {
            return Ok(None);
        }
        self.emitted += 1;
        Ok(Some(self.frame.clone()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/fused.rs"]
mod tests;
