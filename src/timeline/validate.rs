use crate::assets::color::parse_color;
use crate::foundation::error::{EngineError, EngineResult};
use crate::timeline::model::{AssetRef, Timeline, TimelineRow};

/// Largest accepted canvas edge; `vello_cpu` surfaces are `u16`-sized.
const MAX_CANVAS_EDGE: u32 = 8192;

/// Reject structurally invalid timelines before any media work.
///
/// Returns the same timeline on success.
pub fn validate_timeline(timeline: &Timeline) -> EngineResult<&Timeline> {
    if timeline.rows.is_empty() {
        return Err(EngineError::validation("timeline must contain at least one row"));
    }
    let canvas = timeline.canvas();
    if canvas.width == 0 || canvas.height == 0 {
        return Err(EngineError::validation(
            "targetWidth/targetHeight must be non-zero",
        ));
    }
    if canvas.width > MAX_CANVAS_EDGE || canvas.height > MAX_CANVAS_EDGE {
        return Err(EngineError::validation(format!(
            "targetWidth/targetHeight must be <= {MAX_CANVAS_EDGE}"
        )));
    }
    if !canvas.width.is_multiple_of(2) || !canvas.height.is_multiple_of(2) {
        return Err(EngineError::validation(
            "targetWidth/targetHeight must be even (required for yuv420p output)",
        ));
    }
    timeline.fps()?;
    if timeline.output_name.trim().is_empty() {
        return Err(EngineError::validation("outputName must be non-empty"));
    }

    for (i, row) in timeline.rows.iter().enumerate() {
        validate_row(i, row)?;
    }
    Ok(timeline)
}

fn validate_row(i: usize, row: &TimelineRow) -> EngineResult<()> {
    row.time_in_clip
        .validate(&format!("rows[{i}].timeInClip"))?;

    if let Some(video) = &row.video_asset {
        validate_asset_ref(&format!("rows[{i}].videoAsset"), video)?;
    }
    if let Some(audio) = &row.audio_asset {
        let what = format!("rows[{i}].audioAsset");
        validate_asset_ref(&what, audio)?;
        if !audio.volume.is_finite() || !(0.0..=1.0).contains(&audio.volume) {
            return Err(EngineError::validation(format!(
                "{what}.volume must be in [0, 1], got {}",
                audio.volume
            )));
        }
    }

    for (j, overlay) in row.image_overlays.iter().enumerate() {
        let what = format!("rows[{i}].imageOverlays[{j}]");
        if overlay.asset_id.trim().is_empty() {
            return Err(EngineError::validation(format!(
                "{what}.assetId must be non-empty"
            )));
        }
        overlay.time_range.validate(&format!("{what}.timeRange"))?;
        if !overlay.scale.is_finite() || overlay.scale <= 0.0 || overlay.scale > 1.0 {
            return Err(EngineError::validation(format!(
                "{what}.scale must be in (0, 1], got {}",
                overlay.scale
            )));
        }
    }

    for (j, overlay) in row.text_overlays.iter().enumerate() {
        let what = format!("rows[{i}].textOverlays[{j}]");
        overlay.time_range.validate(&format!("{what}.timeRange"))?;
        if !overlay.font_size.is_finite() || overlay.font_size <= 0.0 {
            return Err(EngineError::validation(format!(
                "{what}.fontSize must be finite and > 0"
            )));
        }
        parse_color(&overlay.font_color)
            .map_err(|e| EngineError::validation(format!("{what}.fontColor: {e}")))?;
        parse_color(&overlay.background_color)
            .map_err(|e| EngineError::validation(format!("{what}.backgroundColor: {e}")))?;
    }
    Ok(())
}

fn validate_asset_ref(what: &str, r: &AssetRef) -> EngineResult<()> {
    if r.asset_id.trim().is_empty() {
        return Err(EngineError::validation(format!(
            "{what}.assetId must be non-empty"
        )));
    }
    r.time_range.validate(&format!("{what}.timeRange"))
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/validate.rs"]
mod tests;
