use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{Content, RawRepresentation};
use crate::message::Role;
use crate::property_bag::PropertyBag;
use crate::response::FinishReason;

/// One incremental slice of a streamed response. Every field is optional;
/// absent fields never overwrite state when folded.
///
/// `message_id` groups updates into logical messages: consecutive updates
/// sharing a non-empty id belong to the same message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponseUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl ChatResponseUpdate {
    /// Convenience: an update carrying a role and one text delta.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            contents: vec![Content::text(text)],
            ..Default::default()
        }
    }

    /// Convenience: an update carrying a single content item.
    pub fn from_content(content: impl Into<Content>) -> Self {
        Self {
            contents: vec![content.into()],
            ..Default::default()
        }
    }

    /// Builder-style setter for message_id.
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Builder-style setter for response_id.
    pub fn with_response_id(mut self, response_id: impl Into<String>) -> Self {
        self.response_id = Some(response_id.into());
        self
    }

    /// Builder-style setter for finish_reason.
    pub fn with_finish_reason(mut self, finish_reason: FinishReason) -> Self {
        self.finish_reason = Some(finish_reason);
        self
    }

    /// Concatenated text of this update's `Text` items.
    pub fn text(&self) -> String {
        self.contents.iter().filter_map(Content::as_text).collect()
    }
}

impl std::fmt::Display for ChatResponseUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}
