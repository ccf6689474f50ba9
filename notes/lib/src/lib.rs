//! Notes Library - Client for the Notes API
//!
//! This library wraps the three Notes API endpoints (create, search, append)
//! behind [`NotesClient`], and ships a small [`ResearchAgent`] demonstrating
//! the search-then-create-or-append workflow.
//!
//! Every request carries `Content-Type: application/json` and an `X-API-Key`
//! header. Two call surfaces exist side by side: structured `try_*` methods
//! returning [`Result`], and a sentinel facade (`Option` / empty `Vec` /
//! `bool`) that logs failures instead of propagating them.

pub mod agent;
pub mod client;
pub mod error;

pub use agent::{ResearchAgent, ResearchOutcome};
pub use client::{note_id, Note, NoteDraft, NotesClient, NotesClientBuilder, SearchFilter};
pub use error::NotesError;
