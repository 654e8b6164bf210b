//! Editor-facing JSON API for managing taxonomy, programs, resources, pages and
//! newsletter recipients.

pub mod auth;
pub mod export;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use auth::{require_editor, EditorToken};
pub use export::ExportFile;
pub use router::admin_router;
pub use service::{AdminError, AdminService, Listing, ProgramListing, TermInput};
