use std::any::Any;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::data_uri;
use crate::error::Error;
use crate::property_bag::PropertyBag;
use crate::usage::UsageDetails;

/// Opaque provider object an entity was built from. Never serialized.
///
/// Clones share the underlying object; equality is identity.
#[derive(Clone)]
pub struct RawRepresentation(Arc<dyn Any + Send + Sync>);

impl RawRepresentation {
    pub fn new<T: Any + Send + Sync>(raw: T) -> Self {
        Self(Arc::new(raw))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for RawRepresentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RawRepresentation(..)")
    }
}

impl PartialEq for RawRepresentation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Discriminator for content variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Text,
    Reasoning,
    Data,
    Uri,
    FunctionCall,
    FunctionResult,
    Error,
    Usage,
    /// Extensibility: unknown content kinds from providers.
    /// Preserves the original kind string.
    Other(String),
}

impl ContentKind {
    pub fn as_str(&self) -> &str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Reasoning => "reasoning",
            ContentKind::Data => "data",
            ContentKind::Uri => "uri",
            ContentKind::FunctionCall => "function_call",
            ContentKind::FunctionResult => "function_result",
            ContentKind::Error => "error",
            ContentKind::Usage => "usage",
            ContentKind::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "text" => ContentKind::Text,
            "reasoning" => ContentKind::Reasoning,
            "data" => ContentKind::Data,
            "uri" => ContentKind::Uri,
            "function_call" => ContentKind::FunctionCall,
            "function_result" => ContentKind::FunctionResult,
            "error" => ContentKind::Error,
            "usage" => ContentKind::Usage,
            _ => ContentKind::Other(s.to_string()),
        }
    }
}

impl Serialize for ContentKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ContentKind::parse(&s))
    }
}

/// Known discriminator strings for dispatch during deserialization.
pub const KNOWN_KINDS: &[&str] = &[
    "text",
    "reasoning",
    "data",
    "uri",
    "function_call",
    "function_result",
    "error",
    "usage",
];

/// Plain text produced by or sent to a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Reasoning ("thinking") text. Kept apart from [`TextContent`]; the two are
/// never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl ReasoningContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

fn validate_media_type(media_type: &str) -> Result<(), Error> {
    if media_type.trim().is_empty() {
        return Err(Error::missing_media_type());
    }
    if !data_uri::is_valid_media_type(media_type) {
        return Err(Error::invalid_media_type(media_type));
    }
    Ok(())
}

/// Binary payload with a required media type.
///
/// The canonical `data:` URI is computed on first request and cached.
/// Instances parsed from a URI that is already canonical keep that string;
/// any other URI form is normalized to raw bytes on construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "DataContentRepr")]
pub struct DataContent {
    media_type: String,
    data: Vec<u8>,
    uri: OnceLock<String>,
    pub name: Option<String>,
    pub additional_properties: Option<PropertyBag>,
    pub raw_representation: Option<RawRepresentation>,
}

impl DataContent {
    /// Build from raw bytes. Fails when `media_type` is empty or malformed.
    pub fn new(data: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Result<Self, Error> {
        let media_type = media_type.into();
        validate_media_type(&media_type)?;
        Ok(Self {
            media_type,
            data: data.into(),
            uri: OnceLock::new(),
            name: None,
            additional_properties: None,
            raw_representation: None,
        })
    }

    /// Build from a `data:` URI. An explicit `media_type` takes precedence
    /// over the one embedded in the URI; one of the two must be present.
    pub fn from_uri(uri: &str, media_type: Option<&str>) -> Result<Self, Error> {
        let parsed = data_uri::parse(uri)?;
        let media_type = match media_type {
            Some(mt) => {
                validate_media_type(mt)?;
                mt.to_string()
            }
            None => parsed.media_type.clone().ok_or_else(Error::missing_media_type)?,
        };

        let cache = OnceLock::new();
        let canonical_prefix = format!("data:{media_type};base64,");
        if parsed.is_base64 && uri.starts_with(&canonical_prefix) {
            let _ = cache.set(uri.to_string());
        } else {
            tracing::trace!(
                media_type = %media_type,
                base64 = parsed.is_base64,
                "normalizing non-canonical data URI"
            );
        }

        Ok(Self {
            media_type,
            data: parsed.data,
            uri: cache,
            name: None,
            additional_properties: None,
            raw_representation: None,
        })
    }

    /// Builder-style setter for name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// The canonical `data:{media_type};base64,{payload}` string.
    pub fn uri(&self) -> &str {
        self.uri
            .get_or_init(|| data_uri::encode(&self.media_type, &self.data))
    }

    /// The base64 payload of [`DataContent::uri`].
    pub fn base64_data(&self) -> &str {
        let uri = self.uri();
        uri.split_once(',').map(|(_, payload)| payload).unwrap_or_default()
    }

    pub fn has_top_level_media_type(&self, top_level: &str) -> bool {
        data_uri::has_top_level_media_type(&self.media_type, top_level)
    }
}

impl PartialEq for DataContent {
    fn eq(&self, other: &Self) -> bool {
        self.media_type == other.media_type
            && self.data == other.data
            && self.name == other.name
            && self.additional_properties == other.additional_properties
            && self.raw_representation == other.raw_representation
    }
}

impl Serialize for DataContent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DataContent", 4)?;
        state.serialize_field("uri", self.uri())?;
        state.serialize_field("media_type", &self.media_type)?;
        if let Some(name) = &self.name {
            state.serialize_field("name", name)?;
        } else {
            state.skip_field("name")?;
        }
        if let Some(props) = &self.additional_properties {
            state.serialize_field("additional_properties", props)?;
        } else {
            state.skip_field("additional_properties")?;
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct DataContentRepr {
    uri: String,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    additional_properties: Option<PropertyBag>,
}

impl TryFrom<DataContentRepr> for DataContent {
    type Error = Error;

    fn try_from(repr: DataContentRepr) -> Result<Self, Self::Error> {
        let mut content = DataContent::from_uri(&repr.uri, repr.media_type.as_deref())?;
        content.name = repr.name;
        content.additional_properties = repr.additional_properties;
        Ok(content)
    }
}

/// Reference to remote content by absolute URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UriContentRepr")]
pub struct UriContent {
    uri: Url,
    media_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl UriContent {
    /// Fails on a relative/unparseable URI or a missing/malformed media type.
    /// Wildcard subtypes such as `image/*` are accepted.
    pub fn new(uri: &str, media_type: impl Into<String>) -> Result<Self, Error> {
        let uri = Url::parse(uri)
            .map_err(|e| Error::malformed_uri(format!("'{uri}' is not an absolute URI")).with_source(e))?;
        let media_type = media_type.into();
        validate_media_type(&media_type)?;
        Ok(Self {
            uri,
            media_type,
            additional_properties: None,
            raw_representation: None,
        })
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn has_top_level_media_type(&self, top_level: &str) -> bool {
        data_uri::has_top_level_media_type(&self.media_type, top_level)
    }
}

#[derive(Deserialize)]
struct UriContentRepr {
    uri: String,
    media_type: String,
    #[serde(default)]
    additional_properties: Option<PropertyBag>,
}

impl TryFrom<UriContentRepr> for UriContent {
    type Error = Error;

    fn try_from(repr: UriContentRepr) -> Result<Self, Self::Error> {
        let mut content = UriContent::new(&repr.uri, repr.media_type)?;
        content.additional_properties = repr.additional_properties;
        Ok(content)
    }
}

/// A model's request to invoke a function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallContent {
    pub call_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
    /// Set when the arguments could not be decoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl FunctionCallContent {
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
            ..Default::default()
        }
    }

    /// Build from a raw JSON argument string as streamed by a provider.
    ///
    /// Blank input yields no arguments. Input that is not a JSON object is
    /// recorded in `error` instead of failing.
    pub fn from_json_arguments(
        call_id: impl Into<String>,
        name: impl Into<String>,
        raw_arguments: &str,
    ) -> Self {
        let mut call = Self::new(call_id, name, None);
        if raw_arguments.trim().is_empty() {
            return call;
        }
        match serde_json::from_str::<Map<String, Value>>(raw_arguments) {
            Ok(map) => call.arguments = Some(map),
            Err(e) => {
                call.error = Some(format!("failed to parse function call arguments: {e}"));
            }
        }
        call
    }
}

/// The outcome of a function invocation, sent back to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionResultContent {
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl FunctionResultContent {
    pub fn new(call_id: impl Into<String>, result: impl Into<Value>) -> Self {
        Self {
            call_id: call_id.into(),
            result: Some(result.into()),
            ..Default::default()
        }
    }

    pub fn failed(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// An error reported in-band by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContent {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl ErrorContent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Usage counters delivered as content (typically on the last update).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageContent {
    pub details: UsageDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl UsageContent {
    pub fn new(details: UsageDetails) -> Self {
        Self {
            details,
            ..Default::default()
        }
    }
}

/// A single unit of message payload. Tagged union on `"type"`.
///
/// Custom `Serialize`/`Deserialize` implementations handle the tag: known
/// variants use standard internally-tagged enum logic; the `Unknown` variant
/// preserves both the original type string and all sibling fields so that
/// unrecognised content survives a round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(TextContent),
    Reasoning(ReasoningContent),
    Data(DataContent),
    Uri(UriContent),
    FunctionCall(FunctionCallContent),
    FunctionResult(FunctionResultContent),
    Error(ErrorContent),
    Usage(UsageContent),
    Unknown { kind: String, data: Value },
}

// ---------------------------------------------------------------------------
// Private helper enums for derived serde on known variants only.
// ---------------------------------------------------------------------------
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownContentRef<'a> {
    Text(&'a TextContent),
    Reasoning(&'a ReasoningContent),
    Data(&'a DataContent),
    Uri(&'a UriContent),
    FunctionCall(&'a FunctionCallContent),
    FunctionResult(&'a FunctionResultContent),
    Error(&'a ErrorContent),
    Usage(&'a UsageContent),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownContent {
    Text(TextContent),
    Reasoning(ReasoningContent),
    Data(DataContent),
    Uri(UriContent),
    FunctionCall(FunctionCallContent),
    FunctionResult(FunctionResultContent),
    Error(ErrorContent),
    Usage(UsageContent),
}

impl Serialize for Content {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let known = match self {
            Content::Text(c) => KnownContentRef::Text(c),
            Content::Reasoning(c) => KnownContentRef::Reasoning(c),
            Content::Data(c) => KnownContentRef::Data(c),
            Content::Uri(c) => KnownContentRef::Uri(c),
            Content::FunctionCall(c) => KnownContentRef::FunctionCall(c),
            Content::FunctionResult(c) => KnownContentRef::FunctionResult(c),
            Content::Error(c) => KnownContentRef::Error(c),
            Content::Usage(c) => KnownContentRef::Usage(c),
            Content::Unknown { kind, data } => {
                use serde::ser::SerializeMap;
                // Start with "type", then flatten the preserved fields.
                return if let Value::Object(obj) = data {
                    let mut map = serializer.serialize_map(Some(obj.len() + 1))?;
                    map.serialize_entry("type", kind)?;
                    for (k, v) in obj {
                        map.serialize_entry(k, v)?;
                    }
                    map.end()
                } else {
                    let mut map = serializer.serialize_map(Some(2))?;
                    map.serialize_entry("type", kind)?;
                    map.serialize_entry("data", data)?;
                    map.end()
                };
            }
        };
        known.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = Map::deserialize(deserializer)?;
        let kind = map
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        if KNOWN_KINDS.contains(&kind.as_str()) {
            let known: KnownContent =
                serde_json::from_value(Value::Object(map)).map_err(serde::de::Error::custom)?;
            Ok(match known {
                KnownContent::Text(c) => Content::Text(c),
                KnownContent::Reasoning(c) => Content::Reasoning(c),
                KnownContent::Data(c) => Content::Data(c),
                KnownContent::Uri(c) => Content::Uri(c),
                KnownContent::FunctionCall(c) => Content::FunctionCall(c),
                KnownContent::FunctionResult(c) => Content::FunctionResult(c),
                KnownContent::Error(c) => Content::Error(c),
                KnownContent::Usage(c) => Content::Usage(c),
            })
        } else {
            map.shift_remove("type");
            Ok(Content::Unknown {
                kind,
                data: Value::Object(map),
            })
        }
    }
}

impl Content {
    /// Convenience: create a text content item.
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(TextContent::new(text))
    }

    /// Convenience: create a reasoning content item.
    pub fn reasoning(text: impl Into<String>) -> Self {
        Content::Reasoning(ReasoningContent::new(text))
    }

    /// Convenience: create a usage content item.
    pub fn usage(details: UsageDetails) -> Self {
        Content::Usage(UsageContent::new(details))
    }

    /// Return the discriminant kind of this content item.
    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Text(_) => ContentKind::Text,
            Content::Reasoning(_) => ContentKind::Reasoning,
            Content::Data(_) => ContentKind::Data,
            Content::Uri(_) => ContentKind::Uri,
            Content::FunctionCall(_) => ContentKind::FunctionCall,
            Content::FunctionResult(_) => ContentKind::FunctionResult,
            Content::Error(_) => ContentKind::Error,
            Content::Usage(_) => ContentKind::Usage,
            Content::Unknown { kind, .. } => ContentKind::Other(kind.clone()),
        }
    }

    /// The text of a `Text` item; `None` for every other variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(c) => Some(&c.text),
            _ => None,
        }
    }

    pub fn additional_properties(&self) -> Option<&PropertyBag> {
        match self {
            Content::Text(c) => c.additional_properties.as_ref(),
            Content::Reasoning(c) => c.additional_properties.as_ref(),
            Content::Data(c) => c.additional_properties.as_ref(),
            Content::Uri(c) => c.additional_properties.as_ref(),
            Content::FunctionCall(c) => c.additional_properties.as_ref(),
            Content::FunctionResult(c) => c.additional_properties.as_ref(),
            Content::Error(c) => c.additional_properties.as_ref(),
            Content::Usage(c) => c.additional_properties.as_ref(),
            Content::Unknown { .. } => None,
        }
    }

    /// Mutable access to the bag slot. `None` for `Unknown`, which carries
    /// its extension data inline.
    pub fn additional_properties_mut(&mut self) -> Option<&mut Option<PropertyBag>> {
        match self {
            Content::Text(c) => Some(&mut c.additional_properties),
            Content::Reasoning(c) => Some(&mut c.additional_properties),
            Content::Data(c) => Some(&mut c.additional_properties),
            Content::Uri(c) => Some(&mut c.additional_properties),
            Content::FunctionCall(c) => Some(&mut c.additional_properties),
            Content::FunctionResult(c) => Some(&mut c.additional_properties),
            Content::Error(c) => Some(&mut c.additional_properties),
            Content::Usage(c) => Some(&mut c.additional_properties),
            Content::Unknown { .. } => None,
        }
    }

    pub fn raw_representation(&self) -> Option<&RawRepresentation> {
        match self {
            Content::Text(c) => c.raw_representation.as_ref(),
            Content::Reasoning(c) => c.raw_representation.as_ref(),
            Content::Data(c) => c.raw_representation.as_ref(),
            Content::Uri(c) => c.raw_representation.as_ref(),
            Content::FunctionCall(c) => c.raw_representation.as_ref(),
            Content::FunctionResult(c) => c.raw_representation.as_ref(),
            Content::Error(c) => c.raw_representation.as_ref(),
            Content::Usage(c) => c.raw_representation.as_ref(),
            Content::Unknown { .. } => None,
        }
    }
}

impl From<TextContent> for Content {
    fn from(c: TextContent) -> Self {
        Content::Text(c)
    }
}

impl From<ReasoningContent> for Content {
    fn from(c: ReasoningContent) -> Self {
        Content::Reasoning(c)
    }
}

impl From<DataContent> for Content {
    fn from(c: DataContent) -> Self {
        Content::Data(c)
    }
}

impl From<UriContent> for Content {
    fn from(c: UriContent) -> Self {
        Content::Uri(c)
    }
}

impl From<FunctionCallContent> for Content {
    fn from(c: FunctionCallContent) -> Self {
        Content::FunctionCall(c)
    }
}

impl From<FunctionResultContent> for Content {
    fn from(c: FunctionResultContent) -> Self {
        Content::FunctionResult(c)
    }
}

impl From<ErrorContent> for Content {
    fn from(c: ErrorContent) -> Self {
        Content::Error(c)
    }
}

impl From<UsageContent> for Content {
    fn from(c: UsageContent) -> Self {
        Content::Usage(c)
    }
}
