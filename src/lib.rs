pub mod activity_log;
pub mod assistant;
pub mod backend;
pub mod config;
pub mod error;
pub mod extractor;
pub mod models;
pub mod store;
pub mod summary;


pub use assistant::{Assistant, ExchangeOutcome};
pub use backend::{ChatBackend, ChatReply, HttpBackend};
pub use config::Config;
pub use models::{InteractionRecord, RecordField, RecordPatch};
pub use store::{lock_store, RecordStore, SharedStore};
