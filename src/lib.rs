//! `mailsindex`: load per-user maildir corpora into a full-text search index.
//!
//! The library walks a corpus laid out as `root/username/folder/.../message`,
//! turns every message file into a [`model::document::MailDocument`] and
//! delivers it once to a ZincSearch-compatible index over HTTP.

pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod model;
pub mod parser;
