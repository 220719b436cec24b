//! Storage module for clinia
//!
//! Holds completed pipeline sessions for later lookup and export.

mod models;
mod repository;

pub use models::{
    export_file_name, new_session_id, SessionRecord, SessionStatus, StructuredExport,
    TranscriptSummary,
};
pub use repository::{InMemorySessionStore, SessionStore};
