// MockChatClient: testing utility for unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chat_exchange_types::{
    BoxFuture, BoxStream, ChatClient, ChatMessage, ChatOptions, ChatResponse, ChatResponseUpdate,
    Error, FinishReason, ResponseUpdates, UsageDetails,
};

/// Create a minimal test ChatResponse with the given text.
pub fn make_test_response(text: &str) -> ChatResponse {
    let mut message = ChatMessage::assistant(text);
    message.message_id = Some("msg_test".into());
    ChatResponse {
        messages: vec![message],
        response_id: Some("resp_test".into()),
        model_id: Some("test-model".into()),
        finish_reason: Some(FinishReason::Stop),
        usage: Some(UsageDetails::new(1, 1).total_tokens(2)),
        ..Default::default()
    }
}

/// One recorded call to the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub options: Option<ChatOptions>,
    pub streaming: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mock chat client. Returns pre-configured responses or errors in the
/// order they were queued (unified FIFO queue).
///
/// Streaming calls consume the stream queue first; when it is empty they
/// fall back to splitting the next queued response into updates.
pub struct MockChatClient {
    name: String,
    /// Unified queue: Ok(ChatResponse) or Err(Error), consumed in insertion order.
    actions: Mutex<Vec<Result<ChatResponse, Error>>>,
    /// Stream queue: each entry is a sequence of Result<ChatResponseUpdate, Error>.
    stream_actions: Mutex<Vec<Vec<Result<ChatResponseUpdate, Error>>>>,
    recorded: Mutex<Vec<RecordedRequest>>,
    call_count: AtomicUsize,
}

impl MockChatClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Mutex::new(Vec::new()),
            stream_actions: Mutex::new(Vec::new()),
            recorded: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Queue a successful response.
    pub fn with_response(self, response: ChatResponse) -> Self {
        lock(&self.actions).push(Ok(response));
        self
    }

    /// Queue an error.
    pub fn with_error(self, error: Error) -> Self {
        lock(&self.actions).push(Err(error));
        self
    }

    /// Queue a set of updates to be returned by the next streaming call.
    /// All updates are wrapped in Ok() automatically.
    pub fn with_updates(self, updates: Vec<ChatResponseUpdate>) -> Self {
        lock(&self.stream_actions).push(updates.into_iter().map(Ok).collect());
        self
    }

    /// Queue a raw stream sequence (e.g. partial-then-error).
    pub fn with_stream_items(self, items: Vec<Result<ChatResponseUpdate, Error>>) -> Self {
        lock(&self.stream_actions).push(items);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Return a clone of every recorded call, streaming or not.
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.recorded).clone()
    }

    fn record(&self, messages: &[ChatMessage], options: &Option<ChatOptions>, streaming: bool) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.recorded).push(RecordedRequest {
            messages: messages.to_vec(),
            options: options.clone(),
            streaming,
        });
    }

    fn next_action(&self) -> Result<ChatResponse, Error> {
        let mut actions = lock(&self.actions);
        if actions.is_empty() {
            return Err(Error::configuration("MockChatClient: no actions configured"));
        }
        actions.remove(0)
    }
}

impl ChatClient for MockChatClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_response(
        &self,
        messages: Vec<ChatMessage>,
        options: Option<ChatOptions>,
    ) -> BoxFuture<'_, Result<ChatResponse, Error>> {
        self.record(&messages, &options, false);
        let result = self.next_action();
        Box::pin(async move { result })
    }

    fn get_streaming_response(
        &self,
        messages: Vec<ChatMessage>,
        options: Option<ChatOptions>,
    ) -> BoxStream<'_, Result<ChatResponseUpdate, Error>> {
        self.record(&messages, &options, true);
        let mut queue = lock(&self.stream_actions);
        if !queue.is_empty() {
            let items = queue.remove(0);
            return Box::pin(futures::stream::iter(items));
        }
        drop(queue);
        let result = self.next_action();
        Box::pin(ResponseUpdates::new(Box::pin(async move { result })))
    }
}
