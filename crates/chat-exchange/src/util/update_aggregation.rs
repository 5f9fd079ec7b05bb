// update_aggregation.rs: folds ChatResponseUpdates into a complete ChatResponse.

use chat_exchange_types::property_bag::merge_into;
use chat_exchange_types::{ChatMessage, ChatResponse, ChatResponseUpdate, Content, Role};

use crate::util::update_lifecycle::UpdateLifecycle;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Message boundary test, evaluated before `update` is applied.
///
/// A new message starts when there is none yet, or when the update carries a
/// non-empty id and the last message has a different recorded id. An update
/// with an id following a message that never received one continues that
/// message.
pub fn starts_new_message(response: &ChatResponse, update: &ChatResponseUpdate) -> bool {
    let Some(last) = response.messages.last() else {
        return true;
    };
    match (non_empty(&update.message_id), last.message_id.as_deref()) {
        (Some(incoming), Some(existing)) => incoming != existing,
        _ => false,
    }
}

/// Apply one update to `response`. Order-sensitive; never fails.
///
/// Absent fields leave existing state untouched. `Usage` items are summed
/// into `response.usage` instead of being stored on the message. Coalescing
/// is deferred to [`finalize_response`].
pub fn process_update(update: ChatResponseUpdate, response: &mut ChatResponse) {
    if starts_new_message(response, &update) {
        tracing::debug!(
            message_id = ?update.message_id,
            index = response.messages.len(),
            "starting new message"
        );
        response
            .messages
            .push(ChatMessage::new(Role::Assistant, Vec::new()));
    }

    let ChatResponseUpdate {
        role,
        author_name,
        contents,
        message_id,
        response_id,
        conversation_id,
        model_id,
        created_at,
        finish_reason,
        additional_properties,
        raw_representation: _,
    } = update;

    if let Some(message) = response.messages.last_mut() {
        if let Some(name) = author_name.filter(|n| !n.trim().is_empty()) {
            message.set_author_name(Some(name));
        }
        if let Some(role) = role {
            message.role = role;
        }
        if let Some(id) = message_id.filter(|id| !id.is_empty()) {
            message.message_id = Some(id);
        }

        for content in contents {
            match content {
                Content::Usage(usage) => {
                    *response.usage.get_or_insert_with(Default::default) += &usage.details;
                }
                other => message.contents.push(other),
            }
        }
    }

    if let Some(id) = response_id.filter(|id| !id.is_empty()) {
        response.response_id = Some(id);
    }
    if let Some(id) = conversation_id.filter(|id| !id.is_empty()) {
        response.conversation_id = Some(id);
    }
    if let Some(id) = model_id.filter(|id| !id.is_empty()) {
        response.model_id = Some(id);
    }
    if created_at.is_some() {
        response.created_at = created_at;
    }
    if finish_reason.is_some() {
        response.finish_reason = finish_reason;
    }
    if let Some(bag) = &additional_properties {
        merge_into(&mut response.additional_properties, bag);
    }
}

/// Merge each run of two or more contiguous `Text` (or `Reasoning`) items
/// into one. The merged item keeps the first item's bag and drops its raw
/// representation; single items and all other variants are left as is.
pub fn coalesce_text_contents(contents: &mut Vec<Content>) {
    if contents.len() < 2 {
        return;
    }
    let mut merged: Vec<Content> = Vec::with_capacity(contents.len());
    for content in contents.drain(..) {
        let absorbed = match (merged.last_mut(), &content) {
            (Some(Content::Text(prev)), Content::Text(next)) => {
                prev.text.push_str(&next.text);
                prev.raw_representation = None;
                true
            }
            (Some(Content::Reasoning(prev)), Content::Reasoning(next)) => {
                prev.text.push_str(&next.text);
                prev.raw_representation = None;
                true
            }
            _ => false,
        };
        if !absorbed {
            merged.push(content);
        }
    }
    *contents = merged;
}

/// Finalize step: coalesce the content of every message.
pub fn finalize_response(response: &mut ChatResponse) {
    for message in &mut response.messages {
        coalesce_text_contents(&mut message.contents);
    }
}

/// Accumulates updates into a complete ChatResponse.
///
/// Feed updates via `process()`, peek with `current_response()`, and take the
/// finished result with `into_response()`.
#[derive(Debug, Default)]
pub struct UpdateAccumulator {
    response: ChatResponse,
    lifecycle: UpdateLifecycle,
}

impl UpdateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a single update.
    pub fn process(&mut self, update: ChatResponseUpdate) {
        let new_message = starts_new_message(&self.response, &update);
        self.lifecycle.observe(&update, new_message);
        process_update(update, &mut self.response);
    }

    /// Snapshot of the response so far, coalesced.
    pub fn current_response(&self) -> ChatResponse {
        let mut snapshot = self.response.clone();
        finalize_response(&mut snapshot);
        snapshot
    }

    /// Number of updates processed so far.
    pub fn update_count(&self) -> usize {
        self.lifecycle.updates_seen()
    }

    /// Whether any update reported a finish reason.
    pub fn is_finished(&self) -> bool {
        self.lifecycle.is_finished()
    }

    pub fn into_response(mut self) -> ChatResponse {
        finalize_response(&mut self.response);
        self.response
    }
}

impl Extend<ChatResponseUpdate> for UpdateAccumulator {
    fn extend<I: IntoIterator<Item = ChatResponseUpdate>>(&mut self, iter: I) {
        for update in iter {
            self.process(update);
        }
    }
}

/// Fold a complete sequence of updates into a finalized response.
pub fn to_chat_response<I>(updates: I) -> ChatResponse
where
    I: IntoIterator<Item = ChatResponseUpdate>,
{
    let mut acc = UpdateAccumulator::new();
    acc.extend(updates);
    acc.into_response()
}
