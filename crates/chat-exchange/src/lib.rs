// chat-exchange: Layer 2. Update aggregation, streaming helpers, test utilities.
#![allow(clippy::result_large_err)]

pub mod streaming;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod util;

// --- Curated re-exports from chat-exchange-types (Layer 1) ---
// We avoid `pub use chat_exchange_types::*` to keep the public API surface
// intentional.
pub use chat_exchange_types::{
    // Type aliases
    BoxFuture,
    BoxStream,
    // Provider traits
    ChatClient,
    // Messages and responses
    ChatMessage,
    // Options
    ChatOptions,
    ChatResponse,
    ChatResponseFormat,
    ChatResponseUpdate,
    ChatToolMode,
    // Config
    ContainsContent,
    // Content
    Content,
    ContentKind,
    DataContent,
    // Embeddings
    Embedding,
    EmbeddingGenerationOptions,
    EmbeddingGenerator,
    // Errors
    Error,
    ErrorContent,
    ErrorKind,
    FinishReason,
    FunctionCallContent,
    FunctionResultContent,
    GeneratedEmbeddings,
    JsonOptions,
    PropertyBag,
    RawRepresentation,
    ReasoningContent,
    Role,
    TextContent,
    ToolDefinition,
    UnknownContentPolicy,
    UriContent,
    UsageContent,
    UsageDetails,
};

/// Data-URI codec.
pub use chat_exchange_types::data_uri;
pub use chat_exchange_types::{from_json, to_json};

// --- Aggregation entry points at crate root ---
pub use streaming::{get_response_via_stream, to_chat_response_stream, updates_from_response};
pub use util::update_aggregation::{
    coalesce_text_contents, process_update, to_chat_response, UpdateAccumulator,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify curated re-exports cover the essential public types.
    #[test]
    fn test_curated_reexports_available() {
        let _ = Role::User;
        let _ = ChatMessage::user("test");
        let _ = ErrorKind::MalformedUri;
        let _ = JsonOptions::default();
        let _ = ChatToolMode::Auto;
        let _: fn(&str) -> Result<data_uri::DataUri, Error> = data_uri::parse;
    }

    #[test]
    fn test_aggregation_entry_points_at_root() {
        let response = to_chat_response(vec![ChatResponseUpdate::new(Role::Assistant, "hi")]);
        assert_eq!(response.text(), "hi");
        let mut acc = UpdateAccumulator::new();
        acc.process(ChatResponseUpdate::new(Role::Assistant, "yo"));
        assert_eq!(acc.into_response().text(), "yo");
    }
}
