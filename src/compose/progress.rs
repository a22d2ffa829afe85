use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::foundation::error::Stage;

/// Progress bands of the composition, in percent.
pub(crate) mod bands {
    pub(crate) const VALIDATE_END: f64 = 5.0;
    pub(crate) const ROWS_START: f64 = 5.0;
    pub(crate) const ROWS_END: f64 = 65.0;
    pub(crate) const CONCAT_START: f64 = 70.0;
    pub(crate) const CONCAT_END: f64 = 85.0;
    pub(crate) const PUBLISH_START: f64 = 85.0;
    pub(crate) const DONE: f64 = 100.0;

    /// Share of one row spent extracting.
    pub(crate) const ROW_EXTRACT: f64 = 0.60;
    /// Share of one row spent on image overlays.
    pub(crate) const ROW_IMAGE: f64 = 0.125;
    /// Share of one row spent on text overlays.
    pub(crate) const ROW_TEXT: f64 = 0.125;
    /// Share of one row spent on audio.
    pub(crate) const ROW_AUDIO: f64 = 0.15;
}

/// One progress update.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ProgressEvent {
    /// Stage currently running.
    pub stage: Stage,
    /// Overall completion in `[0, 100]`, never decreasing within one job.
    pub percent: f64,
}

type Callback<'a> = Box<dyn FnMut(&ProgressEvent) + 'a>;

/// Fans progress events out to channel subscribers and callbacks.
///
/// Reported percentages are clamped so that they never decrease. Channel subscribers are
/// bounded; a full channel drops the event for that subscriber and a disconnected one is removed.
pub struct ProgressTracker<'a> {
    capacity: usize,
    last: Option<ProgressEvent>,
    senders: Vec<Sender<ProgressEvent>>,
    callbacks: Vec<Callback<'a>>,
}

impl<'a> ProgressTracker<'a> {
    /// Tracker whose channel subscribers buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            last: None,
            senders: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    /// New channel subscriber.
    pub fn subscribe(&mut self) -> Receiver<ProgressEvent> {
        let (tx, rx) = crossbeam_channel::bounded(self.capacity);
        self.senders.push(tx);
        rx
    }

    /// Register a callback invoked synchronously for every event.
    pub fn on_event(&mut self, callback: impl FnMut(&ProgressEvent) + 'a) {
        self.callbacks.push(Box::new(callback));
    }

    /// Last reported event.
    pub fn last(&self) -> Option<ProgressEvent> {
        self.last
    }

    /// Last reported percentage (0 before the first report).
    pub fn percent(&self) -> f64 {
        self.last.map(|e| e.percent).unwrap_or(0.0)
    }

    /// Report `percent` for `stage`; duplicates are suppressed.
    pub fn report(&mut self, stage: Stage, percent: f64) {
        let floor = self.percent();
        let percent = if percent.is_finite() {
            percent.clamp(floor, 100.0)
        } else {
            floor
        };
        let event = ProgressEvent { stage, percent };
        if let Some(last) = self.last
            && last.stage == stage
            && (percent - last.percent).abs() < 1e-6
        {
            return;
        }
        self.last = Some(event);

        self.senders.retain(|tx| match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::trace!(stage = %stage, "progress subscriber full; event dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        for cb in &mut self.callbacks {
            cb(&event);
        }
    }

    /// Report `fraction` of the `[start, end]` band.
    pub(crate) fn report_band(&mut self, stage: Stage, start: f64, end: f64, fraction: f64) {
        let f = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.report(stage, start + (end - start) * f);
    }
}

impl std::fmt::Debug for ProgressTracker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("capacity", &self.capacity)
            .field("last", &self.last)
            .field("subscribers", &self.senders.len())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/progress.rs"]
mod tests;
