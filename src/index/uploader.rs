//! Deliver each document to the index at most once.

use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{IndexerError, Result};
use crate::index::transport::{
    create_document_segments, document_segments, ApiRequest, ApiResponse, IndexTransport,
};
use crate::model::document::MailDocument;
use crate::model::schema::IndexSchema;

/// Whether a document id is already in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Present,
    Absent,
}

/// Result of a single upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    SkippedAsDuplicate,
    /// The create request was answered with a non-2xx status.
    Failed { status: u16 },
}

/// Error body returned by the index service, e.g. `{"error":"id not found"}`.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: String,
}

/// Existence check followed by a conditional create, one document at a time.
pub struct Uploader<'a, T: IndexTransport + ?Sized> {
    transport: &'a T,
    schema: &'a IndexSchema,
    delay: Duration,
}

impl<'a, T: IndexTransport + ?Sized> Uploader<'a, T> {
    /// `delay` is slept after every network call.
    pub fn new(transport: &'a T, schema: &'a IndexSchema, delay: Duration) -> Self {
        Self {
            transport,
            schema,
            delay,
        }
    }

    /// Ask the index whether `id` exists.
    ///
    /// A 404, or a 2xx carrying a "not found" error payload, means absent;
    /// another 2xx means present. Other statuses (bad credentials, server
    /// errors) are fatal whatever their body says.
    pub fn document_status(&self, id: &str) -> Result<DocumentStatus> {
        let request = ApiRequest::get(document_segments(&self.schema.index, id));
        let response = self.transport.send(&request)?;
        self.throttle();

        if response.status == 404 {
            return Ok(DocumentStatus::Absent);
        }
        if !response.is_success() {
            return Err(unexpected(&request, response));
        }
        if is_not_found_payload(&response.body) {
            Ok(DocumentStatus::Absent)
        } else {
            Ok(DocumentStatus::Present)
        }
    }

    /// Upload `doc` unless a document with the same id is already indexed.
    pub fn upload(&self, doc: &MailDocument) -> Result<UploadOutcome> {
        if self.document_status(&doc.id)? == DocumentStatus::Present {
            debug!(id = %doc.id, "Document already indexed");
            return Ok(UploadOutcome::SkippedAsDuplicate);
        }

        let request = ApiRequest::post(
            create_document_segments(&self.schema.index),
            self.schema.document_body(doc),
        );
        let response = self.transport.send(&request)?;
        self.throttle();

        if response.is_success() {
            debug!(id = %doc.id, "Document uploaded");
            Ok(UploadOutcome::Uploaded)
        } else {
            debug!(id = %doc.id, status = response.status, body = %response.body, "Document rejected");
            Ok(UploadOutcome::Failed {
                status: response.status,
            })
        }
    }

    fn throttle(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

fn is_not_found_payload(body: &str) -> bool {
    serde_json::from_str::<ErrorPayload>(body)
        .map(|p| p.error.to_ascii_lowercase().contains("not found"))
        .unwrap_or(false)
}

fn unexpected(request: &ApiRequest, response: ApiResponse) -> IndexerError {
    IndexerError::UnexpectedStatus {
        method: request.method.to_string(),
        url: request.path(),
        status: response.status,
        body: response.body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::testing::ScriptedTransport;
    use crate::index::transport::Method;
    use chrono::DateTime;

    fn schema() -> IndexSchema {
        IndexSchema {
            index: "mailsIndex".into(),
            folder_field: "folder".into(),
            date_format: "2006-01-02T15:04:05Z07:00".into(),
        }
    }

    fn document() -> MailDocument {
        MailDocument {
            id: "maildir_allen-p_inbox_1_".into(),
            username: "allen-p".into(),
            folder: "inbox".into(),
            date: DateTime::parse_from_rfc2822("Mon, 2 Jan 2006 15:04:05 -0700").unwrap(),
            content: "hello".into(),
        }
    }

    #[test]
    fn test_absent_document_is_posted() {
        let transport = ScriptedTransport::new(vec![
            Some((404, r#"{"error":"id not found"}"#)),
            Some((200, r#"{"message":"ok","id":"maildir_allen-p_inbox_1_"}"#)),
        ]);
        let schema = schema();
        let uploader = Uploader::new(&transport, &schema, Duration::ZERO);
        assert_eq!(uploader.upload(&document()).unwrap(), UploadOutcome::Uploaded);

        let requests = transport.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].path(), "/api/mailsIndex/_doc/maildir_allen-p_inbox_1_");
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[1].path(), "/api/mailsIndex/_doc");
        let body = requests[1].body.as_ref().unwrap();
        assert_eq!(body["_id"], "maildir_allen-p_inbox_1_");
        assert_eq!(body["content"], "hello");
    }

    #[test]
    fn test_not_found_payload_with_ok_status_counts_as_absent() {
        let transport = ScriptedTransport::new(vec![
            Some((200, r#"{"error":"id not found"}"#)),
            Some((200, "{}")),
        ]);
        let schema = schema();
        let uploader = Uploader::new(&transport, &schema, Duration::ZERO);
        assert_eq!(uploader.upload(&document()).unwrap(), UploadOutcome::Uploaded);
    }

    #[test]
    fn test_present_document_is_not_posted() {
        let transport = ScriptedTransport::new(vec![Some((
            200,
            r#"{"_index":"mailsIndex","_id":"maildir_allen-p_inbox_1_","_source":{}}"#,
        ))]);
        let schema = schema();
        let uploader = Uploader::new(&transport, &schema, Duration::ZERO);
        assert_eq!(
            uploader.upload(&document()).unwrap(),
            UploadOutcome::SkippedAsDuplicate
        );
        assert_eq!(transport.requests.borrow().len(), 1);
    }

    #[test]
    fn test_rejected_create_is_not_fatal() {
        let transport = ScriptedTransport::new(vec![Some((404, "")), Some((500, "boom"))]);
        let schema = schema();
        let uploader = Uploader::new(&transport, &schema, Duration::ZERO);
        assert_eq!(
            uploader.upload(&document()).unwrap(),
            UploadOutcome::Failed { status: 500 }
        );
    }

    #[test]
    fn test_bad_credentials_on_check_are_fatal() {
        let transport = ScriptedTransport::new(vec![Some((401, r#"{"error":"auth failed"}"#))]);
        let schema = schema();
        let uploader = Uploader::new(&transport, &schema, Duration::ZERO);
        let err = uploader.upload(&document()).unwrap_err();
        assert!(matches!(err, IndexerError::UnexpectedStatus { status: 401, .. }));
        assert_eq!(transport.requests.borrow().len(), 1);
    }

    #[test]
    fn test_not_found_payload_on_error_status_is_fatal() {
        let transport =
            ScriptedTransport::new(vec![Some((401, r#"{"error":"user not found"}"#))]);
        let schema = schema();
        let uploader = Uploader::new(&transport, &schema, Duration::ZERO);
        let err = uploader.upload(&document()).unwrap_err();
        assert!(matches!(err, IndexerError::UnexpectedStatus { status: 401, .. }));
        assert_eq!(transport.requests.borrow().len(), 1);

        let transport = ScriptedTransport::new(vec![Some((503, r#"{"error":"node not found"}"#))]);
        let uploader = Uploader::new(&transport, &schema, Duration::ZERO);
        assert!(matches!(
            uploader.document_status("maildir_allen-p_inbox_1_"),
            Err(IndexerError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[test]
    fn test_transport_failures_are_fatal() {
        let schema = schema();

        let transport = ScriptedTransport::new(vec![None]);
        let uploader = Uploader::new(&transport, &schema, Duration::ZERO);
        assert!(matches!(
            uploader.upload(&document()),
            Err(IndexerError::Transport { .. })
        ));

        let transport = ScriptedTransport::new(vec![Some((404, "")), None]);
        let uploader = Uploader::new(&transport, &schema, Duration::ZERO);
        assert!(matches!(
            uploader.upload(&document()),
            Err(IndexerError::Transport { .. })
        ));
    }

    #[test]
    fn test_not_found_payload_detection() {
        assert!(is_not_found_payload(r#"{"error":"id not found"}"#));
        assert!(is_not_found_payload(r#"{"error": "Document Not Found"}"#));
        assert!(!is_not_found_payload(r#"{"error":"index mailsIndex does not exists"}"#));
        assert!(!is_not_found_payload(
            r#"{"_index":"mailsIndex","_id":"x","_source":{"username":"a"}}"#
        ));
        assert!(!is_not_found_payload(""));
        assert!(!is_not_found_payload("id not found"));
    }
}
