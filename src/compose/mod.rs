//! Composition entry point, progress reporting, cancellation and boundary results.

pub(crate) mod cancel;
pub(crate) mod orchestrator;
pub(crate) mod progress;
pub(crate) mod result;
