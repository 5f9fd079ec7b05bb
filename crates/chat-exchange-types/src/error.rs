// Unified error type for the exchange model.

use serde::{Deserialize, Serialize};

/// Discriminator for every failure the model can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Input errors (data-URI codec and content construction)
    MalformedUri,
    InvalidMediaType,
    MissingMediaType,

    // Construction and configuration errors
    InvalidArgument,
    Configuration,

    // Transport-facing errors surfaced by external collaborators
    Serialization,
    Stream,
}

impl ErrorKind {
    /// Returns `true` for the codec failures raised while parsing or
    /// constructing binary and URI content.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedUri | Self::InvalidMediaType | Self::MissingMediaType
        )
    }
}

/// The single error type for the workspace.
#[derive(Debug, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Convenience: the input is not a well-formed `data:` URI (or URI).
    pub fn malformed_uri(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedUri, message)
    }

    /// Convenience: a media type failed the `type/subtype[;params]` grammar.
    pub fn invalid_media_type(media_type: &str) -> Self {
        Self::new(
            ErrorKind::InvalidMediaType,
            format!("'{media_type}' is not a valid media type"),
        )
    }

    /// Convenience: no media type was embedded or supplied.
    pub fn missing_media_type() -> Self {
        Self::new(
            ErrorKind::MissingMediaType,
            "a media type must be embedded in the URI or supplied explicitly",
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Convenience: stream error with source, for update producers.
    pub fn stream(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::new(ErrorKind::Stream, message).with_source(source)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Serialization, err.to_string()).with_source(err)
    }
}
