use crate::audio::mix::{mix_into, scale_volume};
use crate::audio::pcm::AudioPcm;
use crate::foundation::error::{EngineError, EngineResult, Stage};
use crate::media::buffer::MediaBuffer;
use crate::media::codec::{SinkConfig, VideoRequest};
use crate::pipeline::range::clamp_window;
use crate::pipeline::{StageContext, StageProgress, pump_frames};
use crate::timeline::model::AssetRef;

/// Decode `audio_ref` over its range, scale it by its volume, and combine it with `original`.
///
/// Replace mode keeps the asset's rate and layout. Mix mode adds onto `original` in the original's
/// format; without an original track it degrades to replace. The result is fitted to `video_secs`.
pub(crate) fn build_audio_track(
    ctx: &StageContext<'_>,
    audio_ref: &AssetRef,
    original: Option<AudioPcm>,
    video_secs: f64,
) -> EngineResult<AudioPcm> {
    let stage = Stage::Audio;
    let src = ctx.resolve(&audio_ref.asset_id)?;
    let info = ctx.codec.probe(&src).map_err(|e| e.at_stage(stage))?;
    if info.audio.is_none() {
        return Err(EngineError::decode(format!(
            "asset '{}' has no audio track",
            audio_ref.asset_id
        ))
        .at_stage(stage));
    }
    let window = clamp_window(
        audio_ref.time_range,
        info.duration_secs,
        &format!("audio asset '{}'", audio_ref.asset_id),
    )?;

    let mut pcm = ctx
        .codec
        .decode_audio(&src, Some(window))
        .map_err(|e| e.at_stage(stage))?
        .ok_or_else(|| {
            EngineError::decode(format!("asset '{}' has no audio track", audio_ref.asset_id))
                .at_stage(stage)
        })?;
    scale_volume(&mut pcm, audio_ref.volume);

    let mut track = match original {
        Some(mut orig) if audio_ref.mix_with_original => {
            orig.fit_to_secs(video_secs);
            mix_into(&mut orig, &pcm);
            orig
        }
        _ => pcm,
    };
    track.fit_to_secs(video_secs);
    Ok(track)
}

/// Re-encode `input`'s video unchanged with its audio replaced (or mixed) from `audio_ref`.
#[tracing::instrument(skip(ctx, input, progress), fields(asset_id = %audio_ref.asset_id))]
pub(crate) fn replace_audio(
    ctx: &StageContext<'_>,
    input: MediaBuffer,
    audio_ref: &AssetRef,
    progress: StageProgress<'_>,
) -> EngineResult<MediaBuffer> {
    let stage = Stage::Audio;
    let info = ctx.codec.probe(&input).map_err(|e| e.at_stage(stage))?;
    if !info.has_video {
        return Err(EngineError::decode("segment has no video track").at_stage(stage));
    }
    let video_secs = info
        .fps
        .map(|f| f.frames_to_secs(info.frame_count))
        .unwrap_or(info.duration_secs);

    let original = if audio_ref.mix_with_original {
        ctx.codec
            .decode_audio(&input, None)
            .map_err(|e| e.at_stage(stage))?
    } else {
        None
    };
    let track = build_audio_track(ctx, audio_ref, original, video_secs)?;
    tracing::debug!(
        sample_rate = track.sample_rate,
        channels = track.channels,
        volume = audio_ref.volume,
        mix = audio_ref.mix_with_original,
        "audio track built"
    );

    let mut sink = ctx.codec.sink().map_err(|e| e.at_stage(stage))?;
    sink.begin(SinkConfig {
        width: ctx.canvas.width,
        height: ctx.canvas.height,
        fps: ctx.fps,
        audio: Some(track),
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
    pump_frames(ctx, stage, source.as_mut(), sink.as_mut(), 0, progress, |_, _| Ok(()))?;
    drop(source);

    sink.end().map_err(|e| e.at_stage(stage))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/audio.rs"]
mod tests;
