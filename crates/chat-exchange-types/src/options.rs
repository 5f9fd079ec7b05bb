// Request options. Configured alongside the reducer, never consulted by it.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::property_bag::PropertyBag;

/// Tool definition sent to the provider (serializable subset, no execute handler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            additional_properties: None,
        }
    }

    /// Validate the name format `[a-zA-Z][a-zA-Z0-9_-]{0,63}` and that
    /// parameters have `"type": "object"` at the root.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() || self.name.len() > 64 {
            return Err(Error::invalid_argument(format!(
                "Tool name '{}' must be 1-64 characters",
                self.name
            )));
        }
        let valid = self.name.chars().enumerate().all(|(i, c)| {
            if i == 0 {
                c.is_ascii_alphabetic()
            } else {
                c.is_ascii_alphanumeric() || c == '_' || c == '-'
            }
        });
        if !valid {
            return Err(Error::invalid_argument(format!(
                "Tool name '{}' must match [a-zA-Z][a-zA-Z0-9_-]{{0,63}}",
                self.name
            )));
        }

        match self.parameters.as_object() {
            Some(obj) if obj.get("type").and_then(|v| v.as_str()) == Some("object") => Ok(()),
            Some(_) => Err(Error::invalid_argument(
                "Tool parameters must have \"type\": \"object\" at root",
            )),
            None => Err(Error::invalid_argument(
                "Tool parameters must be a JSON object",
            )),
        }
    }
}

/// How the model may use the supplied tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChatToolMode {
    /// The model decides whether to call a tool.
    #[default]
    Auto,
    /// Tools must not be called.
    None,
    /// The model must call at least one tool.
    RequireAny,
    /// The model must call the named tool.
    RequireSpecific { name: String },
}

impl ChatToolMode {
    pub fn require_specific(name: impl Into<String>) -> Self {
        ChatToolMode::RequireSpecific { name: name.into() }
    }
}

/// Requested shape of the model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatResponseFormat {
    #[default]
    Text,
    Json {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema_description: Option<String>,
    },
}

impl ChatResponseFormat {
    /// JSON output without a schema.
    pub fn json() -> Self {
        ChatResponseFormat::Json {
            schema: None,
            schema_name: None,
            schema_description: None,
        }
    }

    pub fn json_schema(
        schema: serde_json::Value,
        schema_name: Option<String>,
        schema_description: Option<String>,
    ) -> Self {
        ChatResponseFormat::Json {
            schema: Some(schema),
            schema_name,
            schema_description,
        }
    }
}

/// Per-call options for a chat request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ChatResponseFormat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_mode: Option<ChatToolMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_multiple_tool_calls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
}

impl ChatOptions {
    /// Check tool definitions and that a specific tool requirement names one
    /// of the supplied tools.
    pub fn validate(&self) -> Result<(), Error> {
        for tool in &self.tools {
            tool.validate()?;
        }
        if let Some(ChatToolMode::RequireSpecific { name }) = &self.tool_mode {
            if !self.tools.iter().any(|t| &t.name == name) {
                return Err(Error::invalid_argument(format!(
                    "Tool mode requires '{name}' but no such tool was supplied"
                )));
            }
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(Error::invalid_argument(format!(
                    "temperature {t} is outside 0.0..=2.0"
                )));
            }
        }
        Ok(())
    }

    /// Builder-style setter for model_id.
    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Builder-style setter for temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Builder-style setter for max_output_tokens.
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Builder-style setter for tools.
    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Builder-style setter for tool_mode.
    pub fn tool_mode(mut self, tool_mode: ChatToolMode) -> Self {
        self.tool_mode = Some(tool_mode);
        self
    }

    /// Builder-style setter for response_format.
    pub fn response_format(mut self, response_format: ChatResponseFormat) -> Self {
        self.response_format = Some(response_format);
        self
    }
}
