// Async adapters between update streams and complete responses.

use futures::{Stream, StreamExt};

use chat_exchange_types::{
    BoxStream, ChatClient, ChatMessage, ChatOptions, ChatResponse, ChatResponseUpdate, Error,
};

use crate::util::update_aggregation::UpdateAccumulator;

/// Fold an async update stream into a finalized response.
///
/// Updates are applied in arrival order. The first stream error aborts the
/// fold and is returned; updates already folded are discarded with it.
pub async fn to_chat_response_stream<S>(updates: S) -> Result<ChatResponse, Error>
where
    S: Stream<Item = Result<ChatResponseUpdate, Error>>,
{
    let mut updates = std::pin::pin!(updates);
    let mut acc = UpdateAccumulator::new();
    while let Some(update) = updates.next().await {
        match update {
            Ok(update) => acc.process(update),
            Err(e) => {
                tracing::debug!(
                    folded = acc.update_count(),
                    error = %e,
                    "update stream failed"
                );
                return Err(e);
            }
        }
    }
    Ok(acc.into_response())
}

/// Replay a finished response as a stream of updates.
pub fn updates_from_response(
    response: &ChatResponse,
) -> BoxStream<'static, Result<ChatResponseUpdate, Error>> {
    Box::pin(futures::stream::iter(
        response.to_updates().into_iter().map(Ok),
    ))
}

/// Drive a client's streaming endpoint to completion and fold the result.
pub async fn get_response_via_stream(
    client: &dyn ChatClient,
    messages: Vec<ChatMessage>,
    options: Option<ChatOptions>,
) -> Result<ChatResponse, Error> {
    to_chat_response_stream(client.get_streaming_response(messages, options)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_exchange_types::{Content, ErrorKind, FinishReason, Role, UsageDetails};

    fn updates() -> Vec<ChatResponseUpdate> {
        vec![
            ChatResponseUpdate::new(Role::Assistant, "Hello, ").with_message_id("m1"),
            ChatResponseUpdate::new(Role::Assistant, "world!")
                .with_message_id("m1")
                .with_finish_reason(FinishReason::Stop),
            ChatResponseUpdate::from_content(Content::usage(UsageDetails::new(4, 2))),
        ]
    }

    #[tokio::test]
    async fn test_to_chat_response_stream_folds_in_order() {
        let stream = futures::stream::iter(updates().into_iter().map(Ok));
        let response = to_chat_response_stream(stream).await.unwrap();
        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.text(), "Hello, world!");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().input_tokens, Some(4));
    }

    #[tokio::test]
    async fn test_to_chat_response_stream_propagates_error() {
        let items = vec![
            Ok(ChatResponseUpdate::new(Role::Assistant, "partial")),
            Err(Error::stream(
                "connection reset",
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
            )),
            Ok(ChatResponseUpdate::new(Role::Assistant, "never")),
        ];
        let err = to_chat_response_stream(futures::stream::iter(items))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Stream);
    }

    #[tokio::test]
    async fn test_empty_stream_yields_empty_response() {
        let response = to_chat_response_stream(futures::stream::empty::<Result<ChatResponseUpdate, Error>>())
            .await
            .unwrap();
        assert!(response.messages.is_empty());
        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn test_updates_from_response_round_trip() {
        let original = to_chat_response_stream(futures::stream::iter(updates().into_iter().map(Ok)))
            .await
            .unwrap();
        let replayed = to_chat_response_stream(updates_from_response(&original))
            .await
            .unwrap();
        assert_eq!(replayed, original);
    }
}
