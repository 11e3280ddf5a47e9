//! Make sure the target index exists before any document is sent.

use tracing::{info, warn};

use crate::error::{IndexerError, Result};
use crate::index::transport::{
    create_index_segments, index_segments, ApiRequest, IndexTransport,
};
use crate::model::schema::IndexSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    AlreadyPresent,
    Created,
}

/// Probe the index and create it with the schema's mapping if it is absent.
///
/// Only a 404 on the HEAD request counts as "absent". Transport failures and a
/// rejected create request are fatal.
pub fn ensure_index<T: IndexTransport + ?Sized>(
    transport: &T,
    schema: &IndexSchema,
) -> Result<BootstrapOutcome> {
    let head = ApiRequest::head(index_segments(&schema.index));
    let response = transport.send(&head)?;

    if response.status != 404 {
        if !response.is_success() {
            warn!(
                index = %schema.index,
                status = response.status,
                "Index check returned an unexpected status, assuming the index exists"
            );
        }
        info!(index = %schema.index, "Index already exists");
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    let mapping = serde_json::to_value(schema.mapping())?;
    let create = ApiRequest::post(create_index_segments(), mapping);
    let response = transport.send(&create)?;
    if !response.is_success() {
        return Err(IndexerError::UnexpectedStatus {
            method: create.method.to_string(),
            url: create.path(),
            status: response.status,
            body: response.body,
        });
    }

    info!(index = %schema.index, "Index created");
    Ok(BootstrapOutcome::Created)
}
