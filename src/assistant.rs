//! Chat exchange driver.
//!
//! One exchange: the rep's message goes into the transcript, the backend is
//! awaited with the store unlocked, then the reply and the autofill patch are
//! committed together under a single lock. A failed exchange only adds an
//! error message; the record is not patched. An exchange whose future is
//! dropped mid-flight is failed as `Cancelled` so the store returns to idle.

use chrono::Local;
use std::time::Instant;
use tracing::info;

use crate::activity_log;
use crate::backend::{ChatBackend, ChatReply};
use crate::error::{BackendError, ExchangeError};
use crate::extractor::extract_patch;
use crate::models::{Message, RecordField, RecordPatch};
use crate::store::{lock_store, RecordStore, SharedStore};
use crate::summary::build_interaction_log;

/// Result of a successful exchange
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    pub reply: ChatReply,
    pub patch: RecordPatch,
    pub fields_filled: Vec<RecordField>,
}

/// Fails the in-flight exchange on drop unless it was settled first
struct PendingExchange<'a> {
    store: &'a SharedStore,
    session_id: String,
    started: Instant,
    settled: bool,
}

impl<'a> PendingExchange<'a> {
    fn new(store: &'a SharedStore, session_id: String) -> Self {
        Self {
            store,
            session_id,
            started: Instant::now(),
            settled: false,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for PendingExchange<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let error = BackendError::Cancelled;
        lock_store(self.store).fail_exchange(&error);
        activity_log::log_exchange_failed(&self.session_id, error.kind(), self.elapsed_ms());
    }
}

pub struct Assistant<B: ChatBackend> {
    store: SharedStore,
    backend: B,
}

impl<B: ChatBackend> Assistant<B> {
    pub fn new(backend: B) -> Self {
        Self::with_store(RecordStore::shared(), backend)
    }

    pub fn with_store(store: SharedStore, backend: B) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send one chat message and autofill the record from the exchange
    pub async fn submit(&self, raw: &str) -> Result<ExchangeOutcome, ExchangeError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(ExchangeError::EmptyMessage);
        }

        let session_id = {
            let mut store = lock_store(&self.store);
            store.begin_exchange(text)?;
            store.session_id().to_string()
        };
        activity_log::log_exchange_start(&session_id, text.chars().count());

        let mut pending = PendingExchange::new(&self.store, session_id);
        let result = self.backend.send(text).await;
        let duration_ms = pending.elapsed_ms();

        let mut store = lock_store(&self.store);
        pending.settle();
        let session_id = pending.session_id.as_str();
        match result {
            Ok(reply) => {
                let patch = extract_patch(
                    store.record(),
                    text,
                    &reply.response,
                    Local::now().fixed_offset(),
                );
                let message = Message::ai(
                    reply.response.clone(),
                    reply.action_taken.clone(),
                    reply.tools_used.clone(),
                );
                let fields_filled = store.complete_exchange(message, &patch);
                activity_log::log_exchange_complete(
                    session_id,
                    &fields_filled,
                    reply.tools_used.as_ref().map_or(0, |t| t.len()),
                    duration_ms,
                );
                Ok(ExchangeOutcome {
                    reply,
                    patch,
                    fields_filled,
                })
            }
            Err(e) => {
                store.fail_exchange(&e);
                activity_log::log_exchange_failed(session_id, e.kind(), duration_ms);
                Err(ExchangeError::Backend(e))
            }
        }
    }

    /// Submit the current record as an interaction log message
    pub async fn submit_form(&self) -> Result<ExchangeOutcome, ExchangeError> {
        let (summary, session_id) = {
            let store = lock_store(&self.store);
            (
                build_interaction_log(store.record()),
                store.session_id().to_string(),
            )
        };
        info!("Submitting interaction form");
        activity_log::log_form_submitted(&session_id, summary.chars().count());
        self.submit(&summary).await
    }
}
