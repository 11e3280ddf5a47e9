//! Core data model: the indexed mail document and the index schema.

pub mod document;
pub mod schema;
