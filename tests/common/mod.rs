//! In-memory stand-in for the index service.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use mailsindex::error::{IndexerError, Result};
use mailsindex::index::transport::{ApiRequest, ApiResponse, IndexTransport, Method};

#[derive(Default)]
struct State {
    index: Option<(String, serde_json::Value)>,
    documents: BTreeMap<String, serde_json::Value>,
    rejected_ids: HashSet<String>,
    down: bool,
}

/// Behaves like the REST document store: HEAD/POST on indexes, GET/POST on
/// documents keyed by `_id`. Every request is recorded.
#[derive(Default)]
pub struct FakeIndexService {
    state: RefCell<State>,
    pub requests: RefCell<Vec<ApiRequest>>,
}

impl FakeIndexService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service where `name` already exists.
    pub fn with_index(name: &str) -> Self {
        let service = Self::default();
        service.state.borrow_mut().index = Some((name.to_string(), serde_json::json!({})));
        service
    }

    /// A service that refuses every connection.
    pub fn unreachable() -> Self {
        let service = Self::default();
        service.state.borrow_mut().down = true;
        service
    }

    /// Answer 400 to creates of this document id.
    pub fn reject(&self, id: &str) {
        self.state.borrow_mut().rejected_ids.insert(id.to_string());
    }

    pub fn index_mapping(&self) -> Option<serde_json::Value> {
        self.state.borrow().index.as_ref().map(|(_, m)| m.clone())
    }

    pub fn documents(&self) -> BTreeMap<String, serde_json::Value> {
        self.state.borrow().documents.clone()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    /// Recorded requests matching a method and path.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.path() == path)
            .count()
    }

    /// Bodies of all document create requests, in order.
    pub fn created_documents(&self) -> Vec<serde_json::Value> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == Method::Post && r.segments.last().map(String::as_str) == Some("_doc"))
            .filter_map(|r| r.body.clone())
            .collect()
    }
}

fn reply(status: u16, body: serde_json::Value) -> Result<ApiResponse> {
    Ok(ApiResponse {
        status,
        body: body.to_string(),
    })
}

impl IndexTransport for FakeIndexService {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.borrow_mut().push(request.clone());
        let mut state = self.state.borrow_mut();
        if state.down {
            return Err(IndexerError::Transport {
                method: request.method.to_string(),
                url: request.path(),
                reason: "connection refused".into(),
            });
        }

        let segments: Vec<&str> = request.segments.iter().map(String::as_str).collect();
        let index_name = state.index.as_ref().map(|(name, _)| name.clone());

        match (request.method, segments.as_slice()) {
            (Method::Head, ["api", "index", name]) => {
                if index_name.as_deref() == Some(*name) {
                    reply(200, serde_json::Value::Null)
                } else {
                    reply(404, serde_json::Value::Null)
                }
            }
            (Method::Post, ["api", "index"]) => {
                let mapping = request.body.clone().unwrap_or_default();
                let name = mapping["name"].as_str().unwrap_or_default().to_string();
                state.index = Some((name.clone(), mapping));
                reply(200, serde_json::json!({ "message": "ok", "index": name }))
            }
            (Method::Get, ["api", name, "_doc", id]) if index_name.as_deref() == Some(*name) => {
                match state.documents.get(*id) {
                    Some(doc) => reply(
                        200,
                        serde_json::json!({ "_index": name, "_id": id, "_source": doc }),
                    ),
                    None => reply(404, serde_json::json!({ "error": "id not found" })),
                }
            }
            (Method::Post, ["api", name, "_doc"]) if index_name.as_deref() == Some(*name) => {
                let doc = request.body.clone().unwrap_or_default();
                let id = doc["_id"].as_str().unwrap_or_default().to_string();
                if state.rejected_ids.contains(&id) {
                    return reply(400, serde_json::json!({ "error": "rejected" }));
                }
                state.documents.insert(id.clone(), doc);
                reply(200, serde_json::json!({ "message": "ok", "id": id }))
            }
            _ => reply(400, serde_json::json!({ "error": "index does not exist" })),
        }
    }
}
