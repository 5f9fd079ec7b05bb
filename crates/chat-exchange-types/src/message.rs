use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};

use crate::content::{Content, FunctionResultContent, RawRepresentation};
use crate::property_bag::PropertyBag;

/// Who authored a message. Comparison is case-insensitive; unrecognized
/// role strings are kept verbatim in `Other`.
#[derive(Debug, Clone, Default)]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
    Tool,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            _ => Role::Other(s.to_string()),
        }
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().to_ascii_lowercase().hash(state);
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::parse(s)
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Role::parse(&s))
    }
}

fn normalize_author_name(name: Option<String>) -> Option<String> {
    name.filter(|n| !n.trim().is_empty())
}

fn deserialize_author_name<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(normalize_author_name(Option::deserialize(deserializer)?))
}

/// The fundamental unit of conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_author_name"
    )]
    author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl ChatMessage {
    pub fn new(role: Role, contents: Vec<Content>) -> Self {
        Self {
            role,
            contents,
            ..Default::default()
        }
    }

    /// Convenience: create a system message from text.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Content::text(text)])
    }

    /// Convenience: create a user message from text.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Content::text(text)])
    }

    /// Convenience: create an assistant message from text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Content::text(text)])
    }

    /// Convenience: create a tool message carrying one function result.
    pub fn tool(result: FunctionResultContent) -> Self {
        Self::new(Role::Tool, vec![Content::FunctionResult(result)])
    }

    pub fn author_name(&self) -> Option<&str> {
        self.author_name.as_deref()
    }

    /// Empty or whitespace-only names are stored as absent.
    pub fn set_author_name(&mut self, name: Option<String>) {
        self.author_name = normalize_author_name(name);
    }

    /// Builder-style variant of [`ChatMessage::set_author_name`].
    pub fn with_author_name(mut self, name: impl Into<String>) -> Self {
        self.set_author_name(Some(name.into()));
        self
    }

    /// Concatenate text from all `Text` content items, in order.
    pub fn text(&self) -> String {
        self.contents.iter().filter_map(Content::as_text).collect()
    }
}

impl std::fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FunctionCallContent;
    use std::collections::HashSet;

    #[test]
    fn test_role_serde_roundtrip() {
        for (role, expected_json) in [
            (Role::System, "\"system\""),
            (Role::User, "\"user\""),
            (Role::Assistant, "\"assistant\""),
            (Role::Tool, "\"tool\""),
            (Role::Other("critic".into()), "\"critic\""),
        ] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, expected_json);
            let back: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(back, role);
        }
    }

    #[test]
    fn test_role_case_insensitive() {
        assert_eq!(Role::parse("ASSISTANT"), Role::Assistant);
        assert!(matches!(Role::parse("Tool"), Role::Tool));
        assert_eq!(Role::Other("Critic".into()), Role::Other("CRITIC".into()));
        assert_eq!(Role::Other("USER".into()), Role::User);
        assert_ne!(Role::User, Role::Assistant);

        let mut set = HashSet::new();
        set.insert(Role::Other("Critic".into()));
        assert!(set.contains(&Role::Other("critic".into())));
    }

    #[test]
    fn test_role_unknown_kept_verbatim() {
        let role: Role = serde_json::from_str("\"Developer\"").unwrap();
        assert_eq!(role.as_str(), "Developer");
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"Developer\"");
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("Be brief.").role, Role::System);
        assert_eq!(ChatMessage::user("Hello").text(), "Hello");
        assert_eq!(ChatMessage::assistant("Hi there").role, Role::Assistant);
        let tool = ChatMessage::tool(FunctionResultContent::new("call_1", "sunny"));
        assert_eq!(tool.role, Role::Tool);
        assert!(matches!(&tool.contents[0], Content::FunctionResult(r) if r.call_id == "call_1"));
    }

    #[test]
    fn test_message_text_concatenation_skips_other_content() {
        let msg = ChatMessage::new(
            Role::Assistant,
            vec![
                Content::text("Answer: "),
                Content::reasoning("thinking..."),
                Content::from(FunctionCallContent::new("c1", "lookup", None)),
                Content::text("42"),
            ],
        );
        assert_eq!(msg.text(), "Answer: 42");
        assert_eq!(msg.to_string(), "Answer: 42");
    }

    #[test]
    fn test_message_text_empty_when_no_text_parts() {
        assert_eq!(ChatMessage::new(Role::User, vec![]).text(), "");
    }

    #[test]
    fn test_author_name_whitespace_normalized() {
        let mut msg = ChatMessage::user("hi");
        msg.set_author_name(Some("   ".into()));
        assert_eq!(msg.author_name(), None);
        msg.set_author_name(Some(String::new()));
        assert_eq!(msg.author_name(), None);
        let msg = msg.with_author_name("alice");
        assert_eq!(msg.author_name(), Some("alice"));
    }

    #[test]
    fn test_message_serde_roundtrip() {
        let mut msg = ChatMessage::assistant("Hello").with_author_name("bot");
        msg.message_id = Some("m1".into());
        msg.additional_properties = Some(PropertyBag::new().with("seed", 7));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"author_name\":\"bot\""));
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_message_optional_fields_omitted() {
        let json = serde_json::to_string(&ChatMessage::user("Hello")).unwrap();
        assert_eq!(
            json,
            r#"{"role":"user","contents":[{"type":"text","text":"Hello"}]}"#
        );
    }

    #[test]
    fn test_message_deserialize_blank_author_name() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"user","author_name":"  "}"#).unwrap();
        assert_eq!(msg.author_name(), None);
        assert!(msg.contents.is_empty());
    }
}
