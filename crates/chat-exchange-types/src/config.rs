// config.rs: explicit JSON options for persisting model entities.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::content::{
    Content, ContentKind, DataContent, ErrorContent, FunctionCallContent, FunctionResultContent,
    ReasoningContent, TextContent, UriContent, UsageContent,
};
use crate::embedding::{Embedding, EmbeddingGenerationOptions, GeneratedEmbeddings};
use crate::error::{Error, ErrorKind};
use crate::message::{ChatMessage, Role};
use crate::options::{ChatOptions, ChatResponseFormat, ChatToolMode, ToolDefinition};
use crate::property_bag::PropertyBag;
use crate::response::{ChatResponse, FinishReason};
use crate::update::ChatResponseUpdate;
use crate::usage::UsageDetails;

/// What to do with content whose `"type"` discriminator is not recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownContentPolicy {
    /// Keep it as [`crate::Content::Unknown`] so it round-trips.
    #[default]
    Preserve,
    /// Fail deserialization with a `Serialization` error.
    Reject,
}

/// JSON encoding options, passed explicitly to [`to_json`] and [`from_json`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonOptions {
    /// Indented output (default: false).
    #[serde(default)]
    pub pretty: bool,
    #[serde(default)]
    pub unknown_content: UnknownContentPolicy,
}

impl JsonOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Default::default()
        }
    }

    pub fn strict() -> Self {
        Self {
            unknown_content: UnknownContentPolicy::Reject,
            ..Default::default()
        }
    }
}

/// Serialize any model entity to JSON text.
pub fn to_json<T: Serialize>(value: &T, options: &JsonOptions) -> Result<String, Error> {
    let json = if options.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Deserialize any model entity from JSON text.
///
/// Unknown content is always decoded as [`Content::Unknown`]; under
/// [`UnknownContentPolicy::Reject`] the decoded value is then scanned and the
/// first unknown item fails the call.
pub fn from_json<T>(json: &str, options: &JsonOptions) -> Result<T, Error>
where
    T: DeserializeOwned + ContainsContent,
{
    let value: T = serde_json::from_str(json)?;
    if options.unknown_content == UnknownContentPolicy::Reject {
        if let Some(kind) = value.first_unknown_content() {
            return Err(Error::new(
                ErrorKind::Serialization,
                format!("unknown content type '{kind}'"),
            ));
        }
    }
    Ok(value)
}

/// Model values that may hold [`Content`] items.
pub trait ContainsContent {
    /// Discriminator of the first unknown content item reachable from `self`.
    fn first_unknown_content(&self) -> Option<&str>;
}

impl ContainsContent for Content {
    fn first_unknown_content(&self) -> Option<&str> {
        match self {
            Content::Unknown { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

impl ContainsContent for ChatMessage {
    fn first_unknown_content(&self) -> Option<&str> {
        self.contents.first_unknown_content()
    }
}

impl ContainsContent for ChatResponseUpdate {
    fn first_unknown_content(&self) -> Option<&str> {
        self.contents.first_unknown_content()
    }
}

impl ContainsContent for ChatResponse {
    fn first_unknown_content(&self) -> Option<&str> {
        self.messages.first_unknown_content()
    }
}

impl<T: ContainsContent> ContainsContent for Vec<T> {
    fn first_unknown_content(&self) -> Option<&str> {
        self.iter().find_map(ContainsContent::first_unknown_content)
    }
}

impl<T: ContainsContent> ContainsContent for Option<T> {
    fn first_unknown_content(&self) -> Option<&str> {
        self.as_ref().and_then(ContainsContent::first_unknown_content)
    }
}

macro_rules! no_content {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ContainsContent for $ty {
                fn first_unknown_content(&self) -> Option<&str> {
                    None
                }
            }
        )*
    };
}

no_content!(
    TextContent,
    ReasoningContent,
    DataContent,
    UriContent,
    FunctionCallContent,
    FunctionResultContent,
    ErrorContent,
    UsageContent,
    ContentKind,
    Role,
    FinishReason,
    UsageDetails,
    PropertyBag,
    ChatOptions,
    ChatToolMode,
    ChatResponseFormat,
    ToolDefinition,
    Embedding,
    GeneratedEmbeddings,
    EmbeddingGenerationOptions,
    JsonOptions,
);
