//! Document module for clinia
//!
//! Writes clinical records into a copy of a Google Docs template.

pub mod builder;
mod client;
mod google;
mod renderer;

pub use builder::{DocumentBuilder, DocumentOperation, LineEnd, Weight};
pub use client::{build_provider, DocumentContent, DocumentInfo, DocumentProvider, StructuralElement};
pub use google::GoogleDocsClient;
pub use renderer::{build_note, default_title, DocumentRenderer};
