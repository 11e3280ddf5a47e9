//! The unit of indexing: one document per source message file.

use chrono::{DateTime, FixedOffset};

use crate::error::Result;
use crate::parser::message::MailMessage;
use crate::parser::path::ClassifiedPath;

/// A mail message ready to be sent to the index.
///
/// Built for one source file, serialized, sent, then dropped. Nothing is kept
/// across files.
#[derive(Debug, Clone, PartialEq)]
pub struct MailDocument {
    /// Path-derived identifier, stable across runs.
    pub id: String,
    /// Mailbox owner (first path segment below the corpus root).
    pub username: String,
    /// Logical folder, e.g. `"inbox"` or `"deleted_items/archive"`.
    pub folder: String,
    /// Parsed `Date:` header, original offset preserved.
    pub date: DateTime<FixedOffset>,
    /// Body text, header section excluded.
    pub content: String,
}

impl MailDocument {
    /// Combine path metadata with a parsed message.
    ///
    /// Fails with `DateParse` when the message has no usable `Date:` header;
    /// such a message is never indexed.
    pub fn from_parts(path: ClassifiedPath, message: MailMessage) -> Result<Self> {
        let date = message.date()?;
        Ok(Self {
            id: path.id,
            username: path.username,
            folder: path.folder,
            date,
            content: message.into_body(),
        })
    }
}
