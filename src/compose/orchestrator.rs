use std::sync::Arc;

use crate::assets::resolver::{AssetResolver, ResultPublisher};
use crate::compose::cancel::CancelToken;
use crate::compose::progress::{ProgressTracker, bands};
use crate::compose::result::{ComposeData, ComposeResult};
use crate::config::{EngineConfig, MissingVideoPolicy, PipelineMode};
use crate::foundation::core::Canvas;
use crate::foundation::error::{EngineError, EngineResult, Stage};
use crate::media::buffer::MediaBuffer;
use crate::media::codec::MediaCodec;
use crate::pipeline::audio::replace_audio;
use crate::pipeline::concat::concat;
use crate::pipeline::extract::{extract, placeholder};
use crate::pipeline::fused::{RowBase, render_row};
use crate::pipeline::overlay::{apply_image_overlays, apply_text_overlays};
use crate::pipeline::StageContext;
use crate::render::compositor::OverlayCompositor;
use crate::render::text::TextLayoutEngine;
use crate::timeline::model::{Timeline, TimelineRow};
use crate::timeline::validate::validate_timeline;

/// Runs timelines end to end: validate, process rows, concatenate, publish.
///
/// ```no_run
/// use std::sync::Arc;
/// use wavyte_reel::{Composer, EngineConfig, InMemoryAssetStore, Timeline};
///
/// # fn demo(json: &str) -> wavyte_reel::EngineResult<()> {
/// let store = Arc::new(InMemoryAssetStore::new());
/// let composer = Composer::new(EngineConfig::default(), store.clone(), store)?;
/// let timeline = Timeline::from_json(json)?;
/// let result = composer.compose(&timeline, |stage, pct| println!("{stage}: {pct:.0}%"));
/// println!("{}", result.to_json_pretty());
/// # Ok(())
/// # }
/// ```
pub struct Composer {
    config: EngineConfig,
    codec: Arc<dyn MediaCodec>,
    resolver: Arc<dyn AssetResolver + Send + Sync>,
    publisher: Arc<dyn ResultPublisher + Send + Sync>,
    cancel: CancelToken,
}

impl Composer {
    /// Composer using the codec selected by `config`.
    pub fn new(
        config: EngineConfig,
        resolver: Arc<dyn AssetResolver + Send + Sync>,
        publisher: Arc<dyn ResultPublisher + Send + Sync>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let codec = config.build_codec();
        Ok(Self {
            config,
            codec,
            resolver,
            publisher,
            cancel: CancelToken::new(),
        })
    }

    /// Replace the codec built from the configuration.
    pub fn with_codec(mut self, codec: Arc<dyn MediaCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Use `cancel` instead of a private token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts running compositions of this composer.
    ///
    /// The flag is never cleared: once cancelled, every later `compose` fails with
    /// `Cancelled` until a fresh token is installed with [`Composer::with_cancel`].
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compose `timeline`, calling `on_progress(stage, percent)` on every progress change.
    pub fn compose(&self, timeline: &Timeline, mut on_progress: impl FnMut(Stage, f64)) -> ComposeResult {
        let mut tracker = ProgressTracker::new(self.config.progress_capacity);
        tracker.on_event(move |e| on_progress(e.stage, e.percent));
        self.compose_tracked(timeline, &mut tracker)
    }

    /// Compose `timeline`, reporting through an existing tracker.
    #[tracing::instrument(skip_all, fields(output = %timeline.output_name, rows = timeline.rows.len(), codec = self.codec.name()))]
    pub fn compose_tracked(
        &self,
        timeline: &Timeline,
        tracker: &mut ProgressTracker<'_>,
    ) -> ComposeResult {
        match self.run(timeline, tracker) {
            Ok(data) => {
                tracker.report(Stage::Done, bands::DONE);
                tracing::info!(
                    output_id = %data.output_id,
                    segments = data.segments_processed,
                    skipped = data.rows_skipped,
                    duration = data.duration_seconds,
                    "composition done"
                );
                ComposeResult::success(data)
            }
            Err(err) => {
                tracing::error!(kind = ?err.kind(), error = %err, "composition failed");
                ComposeResult::failure(&err)
            }
        }
    }

    fn run(&self, timeline: &Timeline, tracker: &mut ProgressTracker<'_>) -> EngineResult<ComposeData> {
        tracing::debug!("validating");
        tracker.report(Stage::Validate, 0.0);
        validate_timeline(timeline)?;
        if matches!(self.config.missing_video, MissingVideoPolicy::Reject)
            && let Some(i) = timeline.rows.iter().position(|r| r.video_asset.is_none())
        {
            return Err(missing_video(i));
        }
        let ctx = StageContext {
            codec: self.codec.as_ref(),
            resolver: self.resolver.as_ref(),
            canvas: timeline.canvas(),
            fps: timeline.fps()?,
            background: self.config.background_rgba(),
            cancel: &self.cancel,
        };
        tracker.report(Stage::Validate, bands::VALIDATE_END);

        tracing::debug!(mode = ?self.config.pipeline, "processing rows");
        let mut compositor = None;
        let mut segments = Vec::with_capacity(timeline.rows.len());
        let mut rows_skipped = 0usize;
        let span = (bands::ROWS_END - bands::ROWS_START) / timeline.rows.len() as f64;
        for (i, row) in timeline.rows.iter().enumerate() {
            self.cancel.check()?;
            let row_start = bands::ROWS_START + span * i as f64;
            let base = match (&row.video_asset, self.config.missing_video) {
                (Some(video), _) => RowBase::Video(video),
                (None, MissingVideoPolicy::Skip) => {
                    tracing::warn!(row = i, "row has no videoAsset; skipped");
                    rows_skipped += 1;
                    tracker.report(Stage::Extract, row_start + span);
                    continue;
                }
                (None, MissingVideoPolicy::Reject) => return Err(missing_video(i)),
                (None, MissingVideoPolicy::Placeholder) => {
                    tracing::warn!(row = i, "row has no videoAsset; rendering placeholder");
                    RowBase::Placeholder {
                        duration: row.time_in_clip.duration(),
                        rgba: self.config.placeholder_rgba(),
                    }
                }
            };

            let segment = match self.config.pipeline {
                PipelineMode::Staged => {
                    self.staged_row(&ctx, &mut compositor, row, base, tracker, row_start, span)?
                }
                PipelineMode::Fused => {
                    let comp = ensure_compositor(&mut compositor, ctx.canvas, &self.config)?;
                    render_row(&ctx, comp, row, base, &mut |f| {
                        tracker.report_band(Stage::Extract, row_start, row_start + span, f)
                    })?
                }
            };
            tracing::debug!(row = i, bytes = segment.len(), "row processed");
            segments.push(segment);
        }
        tracker.report(Stage::Extract, bands::ROWS_END);

        self.cancel.check()?;
        tracing::debug!(segments = segments.len(), "concatenating");
        let segments_processed = segments.len();
        tracker.report(Stage::Concat, bands::CONCAT_START);
        let output = concat(&ctx, segments, &mut |f| {
            tracker.report_band(Stage::Concat, bands::CONCAT_START, bands::CONCAT_END, f)
        })?;

        self.cancel.check()?;
        tracing::debug!(bytes = output.len(), "publishing");
        tracker.report(Stage::Publish, bands::PUBLISH_START);
        let info = self.codec.probe(&output).map_err(|e| e.at_stage(Stage::Publish))?;
        let size_bytes = output.len() as u64;
        let output_id = self.publisher.publish_result(
            output.into_bytes(),
            &timeline.output_name,
            self.codec.mime_type(),
        )?;

        Ok(ComposeData {
            output_id,
            output_name: timeline.output_name.clone(),
            size_bytes,
            duration_seconds: info.duration_secs,
            segments_processed,
            rows_skipped,
            nominal_duration_seconds: timeline.nominal_duration_secs(),
        })
    }

    /// Extract (or placeholder), image overlays, text overlays and audio, one buffer per step.
    #[allow(clippy::too_many_arguments)]
    fn staged_row(
        &self,
        ctx: &StageContext<'_>,
        compositor: &mut Option<OverlayCompositor>,
        row: &TimelineRow,
        base: RowBase<'_>,
        tracker: &mut ProgressTracker<'_>,
        row_start: f64,
        span: f64,
    ) -> EngineResult<MediaBuffer> {
        let extract_end = row_start + span * bands::ROW_EXTRACT;
        let image_end = extract_end + span * bands::ROW_IMAGE;
        let text_end = image_end + span * bands::ROW_TEXT;
        let audio_end = text_end + span * bands::ROW_AUDIO;
        let row_end = row_start + span;

        let mut segment = match base {
            RowBase::Video(video) => extract(ctx, &video.asset_id, video.time_range, &mut |f| {
                tracker.report_band(Stage::Extract, row_start, extract_end, f)
            })?,
            RowBase::Placeholder { duration, rgba } => placeholder(ctx, duration, rgba, &mut |f| {
                tracker.report_band(Stage::Extract, row_start, extract_end, f)
            })?,
        };

        if !row.image_overlays.is_empty() || !row.text_overlays.is_empty() {
            let comp = ensure_compositor(compositor, ctx.canvas, &self.config)?;
            segment = apply_image_overlays(ctx, comp, segment, &row.image_overlays, &mut |f| {
                tracker.report_band(Stage::ImageOverlay, extract_end, image_end, f)
            })?;
            segment = apply_text_overlays(ctx, comp, segment, &row.text_overlays, &mut |f| {
                tracker.report_band(Stage::TextOverlay, image_end, text_end, f)
            })?;
        }
        tracker.report(Stage::TextOverlay, text_end);

        if let Some(audio) = &row.audio_asset {
            segment = replace_audio(ctx, segment, audio, &mut |f| {
                tracker.report_band(Stage::Audio, text_end, audio_end, f)
            })?;
        }
        tracker.report(Stage::Audio, row_end);
        Ok(segment)
    }
}

fn missing_video(row: usize) -> EngineError {
    EngineError::validation(format!("rows[{row}] has no videoAsset"))
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("config", &self.config)
            .field("codec", &self.codec.name())
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Build the compositor on first use; font discovery is skipped for rows without overlays.
fn ensure_compositor<'c>(
    slot: &'c mut Option<OverlayCompositor>,
    canvas: Canvas,
    config: &EngineConfig,
) -> EngineResult<&'c mut OverlayCompositor> {
    let comp = match slot.take() {
        Some(c) => c,
        None => OverlayCompositor::new(canvas, TextLayoutEngine::new(config.font_path.as_deref())?)?,
    };
    Ok(slot.insert(comp))
}
