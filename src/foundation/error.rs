use crate::cache::key::RenderKind;

/// Convenience result type used across scriptcast.
pub type ScriptcastResult<T> = Result<T, ScriptcastError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ScriptcastError {
    /// Structural violation in the narration script (e.g. code block without a caption).
    #[error("malformed script: {0}")]
    MalformedScript(String),

    /// An external renderer failed. Nothing is left behind under the artifact's final name.
    #[error("render failed ({kind}): {cause}")]
    RenderFailed {
        /// Which renderer failed.
        kind: RenderKind,
        /// Renderer error message.
        cause: String,
    },

    /// The script produced no content to encode.
    #[error("empty timeline: the script produced no segments to encode")]
    EmptyTimeline,

    /// Invalid user-provided options or pipeline data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors raised while encoding the final media file.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScriptcastError {
    /// Build a [`ScriptcastError::MalformedScript`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedScript(msg.into())
    }

    /// Build a [`ScriptcastError::RenderFailed`] value.
    pub fn render_failed(kind: RenderKind, cause: impl std::fmt::Display) -> Self {
        Self::RenderFailed {
            kind,
            cause: cause.to_string(),
        }
    }

    /// Build a [`ScriptcastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScriptcastError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ScriptcastError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
