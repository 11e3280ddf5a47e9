//! Index schema: field names and the fixed mapping sent on index creation.
//!
//! The field names are declared here once and used both for the mapping and
//! for document serialization, so the two can never drift apart.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::Config;
use crate::model::document::MailDocument;

/// Field holding the document identifier in the request body.
pub const ID_FIELD: &str = "_id";
pub const USERNAME_FIELD: &str = "username";
pub const DATE_FIELD: &str = "date";
pub const CONTENT_FIELD: &str = "content";

/// Index name plus the configurable parts of the document layout.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    /// Name of the target index.
    pub index: String,
    /// Field holding the logical folder.
    pub folder_field: String,
    /// Timestamp format declared on the `date` mapping.
    pub date_format: String,
}

/// Body of the create-index request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexMapping {
    pub name: String,
    pub mappings: Mappings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mappings {
    pub properties: BTreeMap<String, FieldMapping>,
}

/// Mapping of a single document field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMapping {
    #[serde(rename = "type")]
    pub kind: String,
    pub index: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlightable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregatable: Option<bool>,
}

impl FieldMapping {
    /// Full-text field: indexed, stored and highlightable.
    pub fn text() -> Self {
        Self {
            kind: "text".to_string(),
            index: true,
            store: Some(true),
            highlightable: Some(true),
            format: None,
            sortable: None,
            aggregatable: None,
        }
    }

    /// Keyword timestamp: sortable and aggregatable with a fixed format.
    pub fn timestamp(format: &str) -> Self {
        Self {
            kind: "keyword".to_string(),
            index: true,
            store: None,
            highlightable: None,
            format: Some(format.to_string()),
            sortable: Some(true),
            aggregatable: Some(true),
        }
    }
}

impl IndexSchema {
    pub fn from_config(config: &Config) -> Self {
        Self {
            index: config.server.index.clone(),
            folder_field: config.schema.folder_field.clone(),
            date_format: config.schema.date_format.clone(),
        }
    }

    /// The mapping sent when the index does not exist yet.
    pub fn mapping(&self) -> IndexMapping {
        let mut properties = BTreeMap::new();
        properties.insert(USERNAME_FIELD.to_string(), FieldMapping::text());
        properties.insert(CONTENT_FIELD.to_string(), FieldMapping::text());
        properties.insert(self.folder_field.clone(), FieldMapping::text());
        properties.insert(
            DATE_FIELD.to_string(),
            FieldMapping::timestamp(&self.date_format),
        );
        IndexMapping {
            name: self.index.clone(),
            mappings: Mappings { properties },
        }
    }

    /// Serialize a document under this schema's field names.
    ///
    /// String escaping is left to `serde_json`; the message text goes in as-is.
    pub fn document_body(&self, doc: &MailDocument) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(ID_FIELD.into(), doc.id.clone().into());
        body.insert(USERNAME_FIELD.into(), doc.username.clone().into());
        body.insert(DATE_FIELD.into(), doc.date.to_rfc3339().into());
        body.insert(self.folder_field.clone(), doc.folder.clone().into());
        body.insert(CONTENT_FIELD.into(), doc.content.clone().into());
        serde_json::Value::Object(body)
    }
}
