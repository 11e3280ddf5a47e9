//! Per-file parsing: corpus path classification and RFC 822 message reading.

pub mod header;
pub mod message;
pub mod path;
