use crate::foundation::error::{EngineError, EngineResult};
use crate::media::codec::Window;
use crate::timeline::model::TimeRange;

const EPS: f64 = 1e-9;

/// Clamp `requested` to `[0, available_secs]`.
///
/// Partial overlaps are clamped with a warning; a request with nothing left is a range error.
pub(crate) fn clamp_window(
    requested: TimeRange,
    available_secs: f64,
    what: &str,
) -> EngineResult<Window> {
    let start = requested.start.max(0.0);
    let end = requested.end.min(available_secs);
    if !(end - start > EPS) {
        return Err(EngineError::range(format!(
            "{what}: requested {:.3}s-{:.3}s but the media is {:.3}s long",
            requested.start, requested.end, available_secs
        )));
    }
    if requested.end > available_secs + EPS {
        tracing::warn!(
            what,
            requested_end = requested.end,
            available_secs,
            "time range clamped to available media"
        );
    }
    Ok(Window {
        start,
        duration: end - start,
    })
}
