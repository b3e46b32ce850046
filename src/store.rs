//! Interaction record store.
//!
//! Holds the record being logged, the chat transcript and the exchange state
//! behind one mutex. Autofill patches and manual form edits both land here.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::activity_log;
use crate::error::{BackendError, ExchangeError, FieldError};
use crate::models::{
    split_list_text, FieldValue, InteractionRecord, Message, RecordField, RecordPatch,
};

/// Store shared between the exchange driver and form editors.
/// Every mutation goes through the mutex so readers see whole merges.
pub type SharedStore = Arc<Mutex<RecordStore>>;

/// Lock the shared store. A panic while holding the lock cannot leave a
/// half-applied merge behind, so a poisoned lock is recovered.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, RecordStore> {
    store.lock().unwrap_or_else(|poisoned| {
        warn!("Record store lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Follow-up actions offered as one-click additions on the form
pub const SUGGESTED_FOLLOW_UPS: [&str; 3] = [
    "Schedule a follow-up meeting in 2 weeks",
    "Send OncoBoost Phase III PDF",
    "Add Dr. Sharma to the advisory board invite list",
];

/// Exchange state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeState {
    Idle,
    Sending,
}

/// Status snapshot for the front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeStatus {
    pub state: ExchangeState,
    pub loading: bool,
    pub error: Option<String>,
    pub message_count: usize,
    pub session_id: String,
}

/// Owns the interaction record and the chat transcript.
///
/// Two producers write the record: exchange completions (autofill patches)
/// and manual form edits (single-field patches). The transcript is
/// append-only except for an explicit `clear_messages`.
pub struct RecordStore {
    record: InteractionRecord,
    messages: Vec<Message>,
    state: ExchangeState,
    error: Option<String>,
    /// Unique id for log correlation, stable for the store's lifetime
    session_id: String,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            record: InteractionRecord::new(),
            messages: Vec::new(),
            state: ExchangeState::Idle,
            error: None,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn record(&self) -> &InteractionRecord {
        &self.record
    }

    /// Owned copy of the current record
    pub fn snapshot(&self) -> InteractionRecord {
        self.record.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.state == ExchangeState::Sending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> ExchangeStatus {
        ExchangeStatus {
            state: self.state,
            loading: self.is_loading(),
            error: self.error.clone(),
            message_count: self.messages.len(),
            session_id: self.session_id.clone(),
        }
    }

    /// Shallow-merge a patch into the record
    pub fn apply_patch(&mut self, patch: &RecordPatch) -> Vec<RecordField> {
        let written = self.record.apply(patch);
        debug!("Applied patch: {} fields", written.len());
        written
    }

    /// Manual single-field edit
    pub fn set_field(&mut self, field: RecordField, value: FieldValue) -> Result<(), FieldError> {
        let patch = RecordPatch::for_field(field, value)?;
        self.apply_patch(&patch);
        activity_log::log_field_edit(&self.session_id, field);
        Ok(())
    }

    /// Manual edit addressed by the form input's name
    pub fn set_field_named(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let field: RecordField = name.parse()?;
        self.set_field(field, value)
    }

    pub fn add_material(&mut self, name: &str) -> Result<(), FieldError> {
        let mut materials = self.record.materials_shared.clone();
        materials.push(name.trim().to_string());
        self.set_field(RecordField::MaterialsShared, FieldValue::List(materials))
    }

    pub fn remove_material(&mut self, index: usize) -> Result<String, FieldError> {
        let mut materials = self.record.materials_shared.clone();
        if index >= materials.len() {
            return Err(FieldError::IndexOutOfRange {
                field: RecordField::MaterialsShared.name().to_string(),
                index,
                len: materials.len(),
            });
        }
        let removed = materials.remove(index);
        self.set_field(RecordField::MaterialsShared, FieldValue::List(materials))?;
        Ok(removed)
    }

    pub fn add_sample(&mut self, name: &str) -> Result<(), FieldError> {
        let mut samples = self.record.samples_distributed.clone();
        samples.push(name.trim().to_string());
        self.set_field(RecordField::SamplesDistributed, FieldValue::List(samples))
    }

    /// Replace samples from comma-joined form text
    pub fn set_samples_from_text(&mut self, text: &str) -> Result<(), FieldError> {
        self.set_field(
            RecordField::SamplesDistributed,
            FieldValue::List(split_list_text(text)),
        )
    }

    /// Append a follow-up action on its own line
    pub fn add_follow_up(&mut self, suggestion: &str) -> Result<(), FieldError> {
        let current = &self.record.follow_up_actions;
        let actions = if current.is_empty() {
            suggestion.to_string()
        } else {
            format!("{}\n{}", current, suggestion)
        };
        self.set_field(RecordField::FollowUpActions, FieldValue::Text(actions))
    }

    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Restore the default record. The transcript is kept.
    pub fn reset(&mut self) {
        info!("Record resetting to defaults");
        self.record = InteractionRecord::new();
        activity_log::log_record_reset(&self.session_id);
    }

    pub fn clear_messages(&mut self) {
        let count = self.messages.len();
        self.messages.clear();
        activity_log::log_transcript_cleared(&self.session_id, count);
    }

    /// Idle -> Sending. Appends the user message and clears any previous error.
    pub fn begin_exchange(&mut self, text: &str) -> Result<(), ExchangeError> {
        if self.state == ExchangeState::Sending {
            return Err(ExchangeError::Busy);
        }
        self.state = ExchangeState::Sending;
        self.error = None;
        self.messages.push(Message::user(text));
        Ok(())
    }

    /// Sending -> Idle on success. Appends the AI reply, then merges the patch.
    pub fn complete_exchange(&mut self, reply: Message, patch: &RecordPatch) -> Vec<RecordField> {
        if self.state != ExchangeState::Sending {
            warn!("Completing an exchange that was not in progress");
        }
        self.messages.push(reply);
        let written = self.apply_patch(patch);
        self.state = ExchangeState::Idle;
        written
    }

    /// Sending -> Idle on failure. The record is left untouched.
    pub fn fail_exchange(&mut self, error: &BackendError) {
        warn!("Exchange failed: {}", error.kind());
        let description = error.to_string();
        self.messages.push(Message::error(description.clone()));
        self.error = Some(description);
        self.state = ExchangeState::Idle;
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
