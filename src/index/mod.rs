//! Index service access: HTTP transport, index bootstrap, document upload.

pub mod bootstrap;
pub mod transport;
pub mod uploader;

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::transport::{ApiRequest, ApiResponse, IndexTransport};
    use crate::error::{IndexerError, Result};

    /// Answers requests from a fixed script and records what was sent.
    ///
    /// `None` in the script simulates a transport failure.
    pub struct ScriptedTransport {
        script: RefCell<VecDeque<Option<ApiResponse>>>,
        pub requests: RefCell<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        pub fn new(script: Vec<Option<(u16, &str)>>) -> Self {
            Self {
                script: RefCell::new(
                    script
                        .into_iter()
                        .map(|r| {
                            r.map(|(status, body)| ApiResponse {
                                status,
                                body: body.to_string(),
                            })
                        })
                        .collect(),
                ),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl IndexTransport for ScriptedTransport {
        fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
            self.requests.borrow_mut().push(request.clone());
            match self.script.borrow_mut().pop_front() {
                Some(Some(response)) => Ok(response),
                Some(None) => Err(IndexerError::Transport {
                    method: request.method.to_string(),
                    url: request.path(),
                    reason: "connection refused".into(),
                }),
                None => panic!("unscripted request: {} {}", request.method, request.path()),
            }
        }
    }
}
