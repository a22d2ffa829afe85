use serde::Serialize;

use crate::foundation::error::{EngineError, ErrorKind, Stage};

/// Structured failure carried by a [`ComposeResult`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComposeError {
    /// Error kind, serialized as e.g. `"ValidationError"`.
    pub kind: ErrorKind,
    /// Stage a codec error originated from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Human-readable description.
    pub message: String,
}

impl From<&EngineError> for ComposeError {
    fn from(e: &EngineError) -> Self {
        Self {
            kind: e.kind(),
            stage: e.stage(),
            message: e.to_string(),
        }
    }
}

/// Metadata of a published output.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeData {
    /// Identifier returned by the publisher.
    pub output_id: String,
    /// Name the output was published under.
    pub output_name: String,
    /// Size of the published container.
    pub size_bytes: u64,
    /// Measured duration of the output.
    pub duration_seconds: f64,
    /// Rows that produced a segment.
    pub segments_processed: usize,
    /// Rows dropped by the missing-video policy.
    pub rows_skipped: usize,
    /// End of the last row's `timeInClip`.
    pub nominal_duration_seconds: f64,
}

/// Outcome of one `compose` call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComposeResult {
    /// Whether an output was published.
    pub success: bool,
    /// Summary line.
    pub message: String,
    /// Failure details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ComposeError>,
    /// Output metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ComposeData>,
}

impl ComposeResult {
    pub(crate) fn success(data: ComposeData) -> Self {
        Self {
            success: true,
            message: format!(
                "composed {} segment(s) into '{}'",
                data.segments_processed, data.output_name
            ),
            error: None,
            data: Some(data),
        }
    }

    pub(crate) fn failure(err: &EngineError) -> Self {
        Self {
            success: false,
            message: format!("composition failed: {err}"),
            error: Some(ComposeError::from(err)),
            data: None,
        }
    }

    /// Error kind of a failed result.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!("{{\"success\":{},\"message\":\"unserializable result: {e}\"}}", self.success)
        })
    }
}
