//! The chat view's state machine: draft, loading flag and transcript.
//!
//! A submission is split in two so event-driven front-ends can run the
//! request off the UI task: `begin_submit` applies the guards and flips the
//! loading flag, `complete_submit` applies whatever the backend returned.
//! Failures are only logged; the transcript and draft stay as they were.

use tracing::{error, info};

use crate::client::ChatBackend;
use crate::draft::Draft;
use crate::error::ChatError;
use crate::state::{ChatExchange, Transcript};

#[derive(Debug, Default)]
pub struct ChatSession {
    draft: Draft,
    loading: bool,
    transcript: Transcript,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the submit control is currently usable
    pub fn can_submit(&self) -> bool {
        !self.loading && !self.draft.is_blank()
    }

    /// Apply a draft edit. Input is disabled while a request is outstanding.
    pub fn edit(&mut self, f: impl FnOnce(&mut Draft)) {
        if !self.loading {
            f(&mut self.draft);
        }
    }

    /// Returns the message to send, or `None` if the draft is blank or a
    /// request is already in flight.
    pub fn begin_submit(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        self.loading = true;
        Some(self.draft.text().to_string())
    }

    pub fn complete_submit(&mut self, result: Result<ChatExchange, ChatError>) {
        self.loading = false;
        match result {
            Ok(exchange) => {
                self.transcript.push_exchange(exchange);
                self.draft.clear();
                info!(turns = self.transcript.len(), "chat exchange appended");
            }
            Err(e) => {
                error!(error = %e, "chat request failed");
            }
        }
    }

    /// Run a whole submission against `backend`. Returns false when the
    /// guards turned it into a no-op.
    pub async fn submit(&mut self, backend: &dyn ChatBackend) -> bool {
        let Some(message) = self.begin_submit() else {
            return false;
        };
        let result = backend.send(&message).await;
        self.complete_submit(result);
        true
    }
}
