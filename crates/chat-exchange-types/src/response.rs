use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{Content, FunctionCallContent, RawRepresentation};
use crate::message::ChatMessage;
use crate::property_bag::PropertyBag;
use crate::update::ChatResponseUpdate;
use crate::usage::UsageDetails;

/// Why the model stopped generating. Open enum: provider-specific reasons
/// are kept verbatim in `Other`.
#[derive(Debug, Clone)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "tool_calls" => FinishReason::ToolCalls,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Other(s.to_string()),
        }
    }
}

impl PartialEq for FinishReason {
    fn eq(&self, other: &Self) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl Eq for FinishReason {}

impl Hash for FinishReason {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().to_ascii_lowercase().hash(state);
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FinishReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FinishReason {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FinishReason::parse(&s))
    }
}

/// A complete response: one or more messages plus response-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
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
    /// Aggregate usage for the whole response, not per message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl From<ChatMessage> for ChatResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            messages: vec![message],
            ..Default::default()
        }
    }
}

impl ChatResponse {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Concatenated text of every message, with no separator.
    pub fn text(&self) -> String {
        self.messages.iter().map(ChatMessage::text).collect()
    }

    /// Concatenated reasoning text across all messages.
    pub fn reasoning(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .flat_map(|m| m.contents.iter())
            .filter_map(|c| match c {
                Content::Reasoning(r) => Some(r.text.as_str()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(""))
        }
    }

    /// Extract function calls from every message, in order.
    pub fn function_calls(&self) -> Vec<&FunctionCallContent> {
        self.messages
            .iter()
            .flat_map(|m| m.contents.iter())
            .filter_map(|c| match c {
                Content::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Split this response into updates that fold back into an equivalent
    /// response.
    ///
    /// One update per message carries the message fields and the shared
    /// response metadata. A trailing update is added only when usage or a
    /// response-level bag exists; it carries a single `Usage` item and the
    /// bag. The finish reason rides on the last emitted update only.
    /// Message-level bags travel on their update and therefore land in the
    /// response-level bag when folded back.
    ///
    /// Messages are told apart by `message_id` when folded back. Two
    /// adjacent messages without ids fold into one.
    pub fn to_updates(&self) -> Vec<ChatResponseUpdate> {
        let has_trailer = self.usage.is_some() || self.additional_properties.is_some();
        let mut updates = Vec::with_capacity(self.messages.len() + usize::from(has_trailer));

        for message in &self.messages {
            updates.push(ChatResponseUpdate {
                role: Some(message.role.clone()),
                author_name: message.author_name().map(str::to_string),
                contents: message.contents.clone(),
                message_id: message.message_id.clone(),
                additional_properties: message.additional_properties.clone(),
                raw_representation: message.raw_representation.clone(),
                ..self.metadata_update()
            });
        }

        if has_trailer {
            let mut trailer = self.metadata_update();
            if let Some(usage) = &self.usage {
                trailer.contents.push(Content::usage(usage.clone()));
            }
            trailer.additional_properties = self.additional_properties.clone();
            updates.push(trailer);
        }

        if let Some(last) = updates.last_mut() {
            last.finish_reason = self.finish_reason.clone();
        }
        updates
    }

    fn metadata_update(&self) -> ChatResponseUpdate {
        ChatResponseUpdate {
            response_id: self.response_id.clone(),
            conversation_id: self.conversation_id.clone(),
            model_id: self.model_id.clone(),
            created_at: self.created_at,
            ..Default::default()
        }
    }
}

impl std::fmt::Display for ChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use serde_json::json;

    fn sample_response() -> ChatResponse {
        let mut first = ChatMessage::assistant("Hello, ");
        first.message_id = Some("m1".into());
        first.contents.insert(0, Content::reasoning("greet"));
        let mut second = ChatMessage::assistant("world!").with_author_name("bot");
        second.message_id = Some("m2".into());
        second.contents.push(Content::from(FunctionCallContent::new(
            "call_1",
            "lookup",
            None,
        )));
        ChatResponse {
            messages: vec![first, second],
            response_id: Some("resp_1".into()),
            model_id: Some("model-x".into()),
            finish_reason: Some(FinishReason::ToolCalls),
            usage: Some(UsageDetails::new(10, 5).total_tokens(15)),
            additional_properties: Some(PropertyBag::new().with("region", "eu")),
            ..Default::default()
        }
    }

    #[test]
    fn test_finish_reason_serde_roundtrip() {
        for (reason, expected) in [
            (FinishReason::Stop, "\"stop\""),
            (FinishReason::Length, "\"length\""),
            (FinishReason::ToolCalls, "\"tool_calls\""),
            (FinishReason::ContentFilter, "\"content_filter\""),
            (FinishReason::Other("recitation".into()), "\"recitation\""),
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, expected);
            let back: FinishReason = serde_json::from_str(&json).unwrap();
            assert_eq!(back, reason);
        }
    }

    #[test]
    fn test_finish_reason_case_insensitive() {
        assert_eq!(FinishReason::parse("STOP"), FinishReason::Stop);
        assert_eq!(FinishReason::Other("Stop".into()), FinishReason::Stop);
    }

    #[test]
    fn test_response_text_concatenates_messages() {
        let response = sample_response();
        assert_eq!(response.text(), "Hello, world!");
        assert_eq!(response.to_string(), "Hello, world!");
    }

    #[test]
    fn test_response_reasoning_and_function_calls() {
        let response = sample_response();
        assert_eq!(response.reasoning().as_deref(), Some("greet"));
        let calls = response.function_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "lookup");
        assert_eq!(ChatResponse::default().reasoning(), None);
    }

    #[test]
    fn test_to_updates_one_per_message_plus_trailer() {
        let response = sample_response();
        let updates = response.to_updates();
        assert_eq!(updates.len(), 3);

        assert_eq!(updates[0].message_id.as_deref(), Some("m1"));
        assert_eq!(updates[0].role, Some(Role::Assistant));
        assert_eq!(updates[0].response_id.as_deref(), Some("resp_1"));
        assert_eq!(updates[1].author_name.as_deref(), Some("bot"));
        assert_eq!(updates[1].contents.len(), 2);

        let trailer = &updates[2];
        assert!(trailer.role.is_none());
        assert!(trailer.message_id.is_none());
        assert!(matches!(
            trailer.contents.as_slice(),
            [Content::Usage(u)] if u.details.total_tokens == Some(15)
        ));
        assert_eq!(
            trailer.additional_properties.as_ref().unwrap().get("REGION"),
            Some(&json!("eu"))
        );
    }

    #[test]
    fn test_to_updates_finish_reason_only_on_last_update() {
        let updates = sample_response().to_updates();
        assert!(updates[0].finish_reason.is_none());
        assert!(updates[1].finish_reason.is_none());
        assert_eq!(updates[2].finish_reason, Some(FinishReason::ToolCalls));

        let mut response = sample_response();
        response.usage = None;
        response.additional_properties = None;
        let updates = response.to_updates();
        assert_eq!(updates.len(), 2);
        assert!(updates[0].finish_reason.is_none());
        assert_eq!(updates[1].finish_reason, Some(FinishReason::ToolCalls));
    }

    #[test]
    fn test_to_updates_without_usage_or_bag_has_no_trailer() {
        let response = ChatResponse::from(ChatMessage::assistant("hi"));
        let updates = response.to_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].text(), "hi");
    }

    #[test]
    fn test_to_updates_empty_response() {
        assert!(ChatResponse::default().to_updates().is_empty());
    }

    #[test]
    fn test_response_serde_roundtrip() {
        let response = sample_response();
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"finish_reason\":\"tool_calls\""));
        let back: ChatResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn test_response_messages_default_to_empty() {
        let response: ChatResponse = serde_json::from_str(r#"{"response_id":"r"}"#).unwrap();
        assert!(response.messages.is_empty());
        assert_eq!(response.text(), "");
    }
}
