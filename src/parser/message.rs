//! RFC 822 message reader: header block, blank line, body.
//!
//! Only what indexing needs is kept: unfolded header fields and the body as
//! text. MIME structure is not interpreted.

use std::io::{BufRead, Read};

use chrono::{DateTime, FixedOffset};

use crate::error::{IndexerError, Result};
use crate::parser::header;

/// A parsed message.
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    /// `(lowercase_name, value)` pairs in file order, folding resolved.
    headers: Vec<(String, String)>,
    body: String,
}

impl MailMessage {
    /// Parse a message held in memory.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::read_from(raw)
    }

    /// Read a message from any buffered source.
    ///
    /// Structural problems in the header block yield `Parse`; a failure while
    /// reading the body yields `BodyRead`.
    pub fn read_from<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut line = Vec::new();
        let mut saw_separator = false;

        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| IndexerError::Parse {
                    reason: format!("read error in header block: {e}"),
                })?;
            if n == 0 {
                break;
            }

            let text = header::decode_text(trim_line_ending(&line));
            if text.is_empty() {
                saw_separator = true;
                break;
            }

            if text.starts_with(' ') || text.starts_with('\t') {
                let Some(last) = headers.last_mut() else {
                    return Err(IndexerError::Parse {
                        reason: "continuation line before the first header".into(),
                    });
                };
                last.1.push(' ');
                last.1.push_str(text.trim());
                continue;
            }

            let Some(colon) = text.find(':') else {
                return Err(IndexerError::Parse {
                    reason: format!("header line without colon: {}", truncate(&text)),
                });
            };
            let name = &text[..colon];
            if !is_valid_field_name(name) {
                return Err(IndexerError::Parse {
                    reason: format!("invalid header name: {}", truncate(name)),
                });
            }
            headers.push((name.to_ascii_lowercase(), text[colon + 1..].trim().to_string()));
        }

        // A message that ends inside its header block is fine as long as it had headers
        if !saw_separator && headers.is_empty() {
            return Err(IndexerError::Parse {
                reason: "empty message".into(),
            });
        }

        let mut raw_body = Vec::new();
        reader
            .read_to_end(&mut raw_body)
            .map_err(|source| IndexerError::BodyRead { source })?;

        Ok(Self {
            headers,
            body: header::decode_text(&raw_body),
        })
    }

    /// First value of a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    /// The parsed `Date:` header.
    pub fn date(&self) -> Result<DateTime<FixedOffset>> {
        let value = self.header("date").unwrap_or_default();
        header::parse_date(value).ok_or_else(|| IndexerError::DateParse {
            value: value.to_string(),
        })
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// RFC 5322 field name: printable US-ASCII except colon, no whitespace.
fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| (33..=126).contains(&b) && b != b':')
}

fn truncate(s: &str) -> String {
    s.chars().take(60).collect()
}
