// ChatClient / EmbeddingGenerator: the contract concrete provider clients implement.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::embedding::{EmbeddingGenerationOptions, GeneratedEmbeddings};
use crate::error::Error;
use crate::message::ChatMessage;
use crate::options::ChatOptions;
use crate::response::ChatResponse;
use crate::update::ChatResponseUpdate;

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed stream that is Send.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// The contract a chat provider client implements.
///
/// Uses explicit BoxFuture/BoxStream return types instead of the `async-trait`
/// macro, keeping lifetime bounds explicit.
pub trait ChatClient: Send + Sync {
    /// Provider name (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Send the conversation, return the full response.
    fn get_response(
        &self,
        messages: Vec<ChatMessage>,
        options: Option<ChatOptions>,
    ) -> BoxFuture<'_, Result<ChatResponse, Error>>;

    /// Send the conversation, return a stream of updates.
    ///
    /// The default adapts [`ChatClient::get_response`]: the finished response
    /// is split with [`ChatResponse::to_updates`].
    fn get_streaming_response(
        &self,
        messages: Vec<ChatMessage>,
        options: Option<ChatOptions>,
    ) -> BoxStream<'_, Result<ChatResponseUpdate, Error>> {
        Box::pin(ResponseUpdates::new(self.get_response(messages, options)))
    }
}

/// The contract an embedding provider implements.
pub trait EmbeddingGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Embed each input value, returning embeddings in input order.
    fn generate(
        &self,
        values: Vec<String>,
        options: Option<EmbeddingGenerationOptions>,
    ) -> BoxFuture<'_, Result<GeneratedEmbeddings, Error>>;
}

enum ResponseUpdatesState<'a> {
    Pending(BoxFuture<'a, Result<ChatResponse, Error>>),
    Draining(std::vec::IntoIter<ChatResponseUpdate>),
    Done,
}

/// Stream over the updates of a response that is still being produced.
pub struct ResponseUpdates<'a> {
    state: ResponseUpdatesState<'a>,
}

impl<'a> ResponseUpdates<'a> {
    pub fn new(response: BoxFuture<'a, Result<ChatResponse, Error>>) -> Self {
        Self {
            state: ResponseUpdatesState::Pending(response),
        }
    }
}

impl Stream for ResponseUpdates<'_> {
    type Item = Result<ChatResponseUpdate, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                ResponseUpdatesState::Pending(fut) => match fut.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(response)) => {
                        this.state = ResponseUpdatesState::Draining(response.to_updates().into_iter());
                    }
                    Poll::Ready(Err(e)) => {
                        this.state = ResponseUpdatesState::Done;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                ResponseUpdatesState::Draining(updates) => {
                    let next = updates.next();
                    if next.is_none() {
                        this.state = ResponseUpdatesState::Done;
                    }
                    return Poll::Ready(next.map(Ok));
                }
                ResponseUpdatesState::Done => return Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::usage::UsageDetails;
    use futures::StreamExt;

    // Compile-time verification: a mock can implement the trait
    struct FixedClient {
        fail: bool,
    }

    impl ChatClient for FixedClient {
        fn name(&self) -> &str {
            "fixed"
        }

        fn get_response(
            &self,
            _messages: Vec<ChatMessage>,
            _options: Option<ChatOptions>,
        ) -> BoxFuture<'_, Result<ChatResponse, Error>> {
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    return Err(Error::configuration("not configured"));
                }
                let mut response = ChatResponse::from(ChatMessage::assistant("pong"));
                response.usage = Some(UsageDetails::new(3, 1));
                Ok(response)
            })
        }
    }

    struct ZeroEmbedder;

    impl EmbeddingGenerator for ZeroEmbedder {
        fn name(&self) -> &str {
            "zero"
        }

        fn generate(
            &self,
            values: Vec<String>,
            _options: Option<EmbeddingGenerationOptions>,
        ) -> BoxFuture<'_, Result<GeneratedEmbeddings, Error>> {
            Box::pin(async move {
                Ok(GeneratedEmbeddings::new(
                    values
                        .iter()
                        .map(|_| crate::embedding::Embedding::new(vec![0.0; 2]))
                        .collect(),
                ))
            })
        }
    }

    #[test]
    fn test_chat_client_trait_object() {
        let client: Box<dyn ChatClient> = Box::new(FixedClient { fail: false });
        assert_eq!(client.name(), "fixed");
    }

    #[tokio::test]
    async fn test_default_streaming_adapts_response() {
        let client = FixedClient { fail: false };
        let updates: Vec<_> = client
            .get_streaming_response(vec![ChatMessage::user("ping")], None)
            .collect()
            .await;
        assert_eq!(updates.len(), 2);
        let first = updates[0].as_ref().unwrap();
        assert_eq!(first.text(), "pong");
        let trailer = updates[1].as_ref().unwrap();
        assert_eq!(trailer.contents.len(), 1);
    }

    #[tokio::test]
    async fn test_default_streaming_surfaces_error_once() {
        let client = FixedClient { fail: true };
        let updates: Vec<_> = client
            .get_streaming_response(vec![ChatMessage::user("ping")], None)
            .collect()
            .await;
        assert_eq!(updates.len(), 1);
        let err = updates.into_iter().next().unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_embedding_generator_preserves_order_and_count() {
        let generator: Box<dyn EmbeddingGenerator> = Box::new(ZeroEmbedder);
        let result = generator
            .generate(vec!["a".into(), "b".into(), "c".into()], None)
            .await
            .unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.get(0).unwrap().dimensions(), 2);
    }
}
