//! Activity Logging Module
//!
//! Provides structured activity logging for auditing and debugging.
//! IMPORTANT: This module must NEVER log free text from an interaction.
//!
//! What IS logged:
//! - Session ids
//! - Field names touched by autofill or manual edits
//! - Message and tool counts, character counts, durations
//! - Error kinds (sanitized labels, never response bodies)
//!
//! What is NOT logged:
//! - Chat messages or backend replies
//! - HCP names, attendees, topics or any other record value
//! - The submitted interaction summary

use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::models::RecordField;

/// Guard that must be held for the duration of the application
/// to ensure logs are flushed before exit
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize logging.
///
/// Console output is always on (filter from `RUST_LOG`, else `default_level`).
/// When `log_dir` is given, a JSON file layer with daily rotation writes
/// `activity.log` there as well.
pub fn init_logging(
    log_dir: Option<&Path>,
    default_level: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    // Console sits directly on the registry in both setups
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry().with(console_layer).try_init()?;
        return Ok(());
    };

    std::fs::create_dir_all(log_dir)?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "activity.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // JSON with explicit UTC timestamps
    let file_layer = fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;
    LOG_GUARD.set(guard).ok();

    info!(
        event = "logging_initialized",
        log_dir = %log_dir.display(),
        "Activity logging system initialized"
    );

    Ok(())
}

fn field_names(fields: &[RecordField]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Exchange Events
// ============================================================================

/// Log exchange start (character count only)
pub fn log_exchange_start(session_id: &str, message_chars: usize) {
    info!(
        event = "exchange_start",
        session_id = %session_id,
        message_chars = message_chars,
        "Chat exchange started"
    );
}

/// Log a completed exchange and the fields autofill wrote
pub fn log_exchange_complete(
    session_id: &str,
    fields_filled: &[RecordField],
    tools_used: usize,
    duration_ms: u64,
) {
    info!(
        event = "exchange_complete",
        session_id = %session_id,
        fields_filled = %field_names(fields_filled),
        field_count = fields_filled.len(),
        tools_used = tools_used,
        duration_ms = duration_ms,
        "Chat exchange completed"
    );
}

/// Log a failed exchange by error kind
pub fn log_exchange_failed(session_id: &str, error_kind: &str, duration_ms: u64) {
    warn!(
        event = "exchange_failed",
        session_id = %session_id,
        error_kind = %error_kind,
        duration_ms = duration_ms,
        "Chat exchange failed"
    );
}

// ============================================================================
// Record Events
// ============================================================================

/// Log a manual form edit (field name only)
pub fn log_field_edit(session_id: &str, field: RecordField) {
    info!(
        event = "field_edit",
        session_id = %session_id,
        field = %field.name(),
        "Form field edited"
    );
}

pub fn log_record_reset(session_id: &str) {
    info!(
        event = "record_reset",
        session_id = %session_id,
        "Interaction record reset to defaults"
    );
}

pub fn log_transcript_cleared(session_id: &str, message_count: usize) {
    info!(
        event = "transcript_cleared",
        session_id = %session_id,
        message_count = message_count,
        "Chat transcript cleared"
    );
}

/// Log form submission (summary size, never its content)
pub fn log_form_submitted(session_id: &str, summary_chars: usize) {
    info!(
        event = "form_submitted",
        session_id = %session_id,
        summary_chars = summary_chars,
        "Interaction form submitted"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Installs the global subscriber, so it is the only test that may call
    /// `init_logging` successfully.
    #[test]
    fn test_init_logging_once() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        init_logging(Some(log_dir.as_path()), "info").unwrap();
        assert!(log_dir.is_dir());
        assert!(LOG_GUARD.get().is_some());

        // A global subscriber is already installed
        assert!(init_logging(None, "info").is_err());
    }

    #[test]
    fn test_field_names_joined() {
        assert_eq!(
            field_names(&[RecordField::HcpName, RecordField::AiDescription]),
            "hcp_name,ai_description"
        );
        assert_eq!(field_names(&[]), "");
    }

    /// The exchange loggers take counts and field names, not message text.
    /// If someone changes these to accept free text, this stops compiling.
    #[test]
    fn test_exchange_logging_is_text_free() {
        log_exchange_start("test-session-id", 42);
        log_exchange_complete(
            "test-session-id",
            &[RecordField::HcpName, RecordField::Outcomes],
            2,
            150,
        );
        log_exchange_failed("test-session-id", "timeout", 60_000);
    }

    #[test]
    fn test_record_logging_is_text_free() {
        log_field_edit("test-session-id", RecordField::Attendees);
        log_record_reset("test-session-id");
        log_transcript_cleared("test-session-id", 4);
        log_form_submitted("test-session-id", 512);
    }
}
