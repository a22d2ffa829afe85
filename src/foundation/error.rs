use std::fmt;

/// Convenience result type used across the engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Pipeline stage an error or progress event originates from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Timeline validation.
    Validate,
    /// Segment extraction (trim).
    Extract,
    /// Image overlay compositing.
    ImageOverlay,
    /// Text overlay compositing.
    TextOverlay,
    /// Audio replacement or mixing.
    Audio,
    /// Concatenation of processed segments.
    Concat,
    /// Handing the final buffer to the publisher.
    Publish,
    /// Terminal state reached after a successful publish.
    Done,
}

impl Stage {
    /// Stable lowercase name used in progress events and error payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Extract => "extract",
            Self::ImageOverlay => "image_overlay",
            Self::TextOverlay => "text_overlay",
            Self::Audio => "audio",
            Self::Concat => "concat",
            Self::Publish => "publish",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error kinds exposed at the `compose` boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Malformed timeline or argument.
    ValidationError,
    /// The resolver does not know a referenced asset.
    AssetNotFoundError,
    /// A requested time range lies outside the source media.
    RangeError,
    /// Every row was skipped, nothing to concatenate.
    NoValidSegmentsError,
    /// Codec failure while decoding.
    DecodeError,
    /// Codec failure while encoding.
    EncodeError,
    /// The publisher rejected the final artifact.
    PublishError,
    /// Invalid engine configuration.
    ConfigError,
    /// The caller cancelled the job.
    CancelledError,
    /// Wrapped lower-level failure (IO and friends).
    InternalError,
}

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Invalid user-provided timeline data or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// An asset id could not be resolved.
    #[error("asset not found: '{asset_id}'")]
    AssetNotFound {
        /// The unresolved identifier.
        asset_id: String,
    },

    /// A time range could not be satisfied by the source media.
    #[error("range error: {0}")]
    Range(String),

    /// Every timeline row was skipped.
    #[error("no valid segments: every timeline row was skipped")]
    NoValidSegments,

    /// Decoding failed.
    #[error("decode error{}: {message}", stage_suffix(.stage))]
    Decode {
        /// Originating stage, attached by the pipeline.
        stage: Option<Stage>,
        /// Codec message.
        message: String,
    },

    /// Encoding failed.
    #[error("encode error{}: {message}", stage_suffix(.stage))]
    Encode {
        /// Originating stage, attached by the pipeline.
        stage: Option<Stage>,
        /// Codec message.
        message: String,
    },

    /// Publishing the final artifact failed.
    #[error("publish error: {0}")]
    Publish(String),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The job was cancelled through its cancel token.
    #[error("composition cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn stage_suffix(stage: &Option<Stage>) -> String {
    match stage {
        Some(s) => format!(" in {s}"),
        None => String::new(),
    }
}

impl EngineError {
    /// Build an [`EngineError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`EngineError::AssetNotFound`] value.
    pub fn asset_not_found(asset_id: impl Into<String>) -> Self {
        Self::AssetNotFound {
            asset_id: asset_id.into(),
        }
    }

    /// Build an [`EngineError::Range`] value.
    pub fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    /// Build an [`EngineError::Decode`] value without a stage.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            stage: None,
            message: msg.into(),
        }
    }

    /// Build an [`EngineError::Encode`] value without a stage.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            stage: None,
            message: msg.into(),
        }
    }

    /// Build an [`EngineError::Publish`] value.
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Build an [`EngineError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Attach `stage` to codec errors that do not carry one yet.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            Self::Decode {
                stage: None,
                message,
            } => Self::Decode {
                stage: Some(stage),
                message,
            },
            Self::Encode {
                stage: None,
                message,
            } => Self::Encode {
                stage: Some(stage),
                message,
            },
            other => other,
        }
    }

    /// Boundary kind for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::AssetNotFound { .. } => ErrorKind::AssetNotFoundError,
            Self::Range(_) => ErrorKind::RangeError,
            Self::NoValidSegments => ErrorKind::NoValidSegmentsError,
            Self::Decode { .. } => ErrorKind::DecodeError,
            Self::Encode { .. } => ErrorKind::EncodeError,
            Self::Publish(_) => ErrorKind::PublishError,
            Self::Config(_) => ErrorKind::ConfigError,
            Self::Cancelled => ErrorKind::CancelledError,
            Self::Other(_) => ErrorKind::InternalError,
        }
    }

    /// Stage attached to codec errors, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Decode { stage, .. } | Self::Encode { stage, .. } => *stage,
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
