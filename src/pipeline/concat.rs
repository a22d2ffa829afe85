use crate::audio::pcm::AudioPcm;
use crate::foundation::error::{EngineError, EngineResult, Stage};
use crate::media::buffer::{AudioFormat, MediaBuffer, MediaInfo};
use crate::media::codec::{SinkConfig, VideoRequest};
use crate::pipeline::{StageContext, StageProgress, pump_frames};

/// Join `segments` end to end into one buffer.
///
/// A single segment is returned as is. Audio is converted to the format of the first segment that
/// carries a track; silent segments contribute silence of their video length so the track stays
/// aligned with the frames.
#[tracing::instrument(skip_all, fields(segments = segments.len()))]
pub(crate) fn concat(
    ctx: &StageContext<'_>,
    segments: Vec<MediaBuffer>,
    progress: StageProgress<'_>,
) -> EngineResult<MediaBuffer> {
    let stage = Stage::Concat;
    if segments.is_empty() {
        return Err(EngineError::NoValidSegments);
    }
    if segments.len() == 1 {
        progress(1.0);
        return segments
            .into_iter()
            .next()
            .ok_or(EngineError::NoValidSegments);
    }

    let infos = segments
        .iter()
        .map(|s| ctx.codec.probe(s).map_err(|e| e.at_stage(stage)))
        .collect::<EngineResult<Vec<MediaInfo>>>()?;
    if let Some(i) = infos.iter().position(|i| !i.has_video) {
        return Err(
            EngineError::decode(format!("segment {i} has no video stream")).at_stage(stage),
        );
    }
    let total_frames: u64 = infos.iter().map(|i| i.frame_count).sum();

    let audio = match infos.iter().find_map(|i| i.audio) {
        Some(format) => Some(joined_audio(ctx, &segments, &infos, format)?),
        None => None,
    };

    let mut sink = ctx.codec.sink().map_err(|e| e.at_stage(stage))?;
    sink.begin(SinkConfig {
        width: ctx.canvas.width,
        height: ctx.canvas.height,
        fps: ctx.fps,
        audio,
    })
    .map_err(|e| e.at_stage(stage))?;

    let mut written = 0u64;
    for (segment, info) in segments.iter().zip(&infos) {
        let mut source = ctx
            .codec
            .open_video(
                segment,
                VideoRequest {
                    window: None,
                    fps: ctx.fps,
                },
            )
            .map_err(|e| e.at_stage(stage))?;
        let base = written;
        let mut report = |f: f64| {
            let done = base as f64 + f * info.frame_count as f64;
            progress(done / total_frames as f64)
        };
        written += pump_frames(
            ctx,
            stage,
            source.as_mut(),
            sink.as_mut(),
            base,
            &mut report,
            |_, _| Ok(()),
        )?;
    }
    tracing::debug!(frames = written, "segments joined");

    sink.end().map_err(|e| e.at_stage(stage))
}

fn joined_audio(
    ctx: &StageContext<'_>,
    segments: &[MediaBuffer],
    infos: &[MediaInfo],
    format: AudioFormat,
) -> EngineResult<AudioPcm> {
    let mut out = AudioPcm::silence(format, 0);
    for (segment, info) in segments.iter().zip(infos) {
        let secs = info
            .fps
            .map(|f| f.frames_to_secs(info.frame_count))
            .unwrap_or(info.duration_secs);
        let mut part = match ctx
            .codec
            .decode_audio(segment, None)
            .map_err(|e| e.at_stage(Stage::Concat))?
        {
            Some(pcm) => pcm.convert_to(format),
            None => AudioPcm::silence(format, 0),
        };
        part.fit_to_secs(secs);
        out.append(&part)?;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/concat.rs"]
mod tests;
