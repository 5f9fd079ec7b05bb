// update_lifecycle.rs: update-sequence sanity checks.
//
// Warns when updates arrive in a shape that the reducer tolerates but that
// usually points at a misbehaving producer. Never alters folding results.

use chat_exchange_types::{ChatResponseUpdate, Content, Role};

/// Tracks update ordering and warns on suspicious sequences.
///
/// Observed conditions, each logged via `tracing::warn!`:
/// - the response id changes partway through the stream
/// - the role changes inside one logical message
/// - non-usage content arrives after a finish reason was reported
#[derive(Debug, Default)]
pub struct UpdateLifecycle {
    response_id: Option<String>,
    role: Option<Role>,
    finished: bool,
    updates_seen: usize,
}

impl UpdateLifecycle {
    /// Record one update. `starts_new_message` is the reducer's boundary
    /// decision for this update.
    pub fn observe(&mut self, update: &ChatResponseUpdate, starts_new_message: bool) {
        self.updates_seen += 1;

        if let Some(incoming) = update.response_id.as_deref().filter(|id| !id.is_empty()) {
            match &self.response_id {
                Some(current) if current != incoming => {
                    tracing::warn!(
                        previous = %current,
                        incoming = %incoming,
                        update = self.updates_seen,
                        "response id changed mid-stream"
                    );
                }
                _ => {}
            }
            self.response_id = Some(incoming.to_string());
        }

        if starts_new_message {
            self.role = None;
        }
        if let Some(role) = &update.role {
            if let Some(current) = &self.role {
                if current != role {
                    tracing::warn!(
                        previous = %current,
                        incoming = %role,
                        update = self.updates_seen,
                        "role changed within a single message"
                    );
                }
            }
            self.role = Some(role.clone());
        }

        let has_payload = update
            .contents
            .iter()
            .any(|c| !matches!(c, Content::Usage(_)));
        if self.finished && has_payload {
            tracing::warn!(
                update = self.updates_seen,
                items = update.contents.len(),
                "content received after finish reason"
            );
        }
        if update.finish_reason.is_some() {
            self.finished = true;
        }
    }

    /// Whether a finish reason has been observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn updates_seen(&self) -> usize {
        self.updates_seen
    }
}
