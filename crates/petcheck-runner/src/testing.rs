//! Scripted executor for unit tests

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use petcheck_core::{EndpointDescriptor, HarnessError, RequestSpec, ResponseEnvelope};

use crate::executor::RequestExecutor;

type Script = dyn Fn(&str, &RequestSpec) -> Result<ResponseEnvelope, HarnessError> + Send + Sync;

/// Answers each call through a closure keyed by the endpoint label and
/// records every call it sees.
pub struct ScriptedExecutor {
    script: Box<Script>,
    calls: Mutex<Vec<(String, RequestSpec)>>,
}

impl ScriptedExecutor {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str, &RequestSpec) -> Result<ResponseEnvelope, HarnessError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<(String, RequestSpec)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RequestExecutor for ScriptedExecutor {
    fn execute(
        &self,
        endpoint: &EndpointDescriptor,
        request: RequestSpec,
    ) -> Result<ResponseEnvelope, HarnessError> {
        let label = endpoint.label();
        let result = (self.script)(&label, &request);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((label, request));
        result
    }
}

pub fn json_response(status: u16, body: serde_json::Value) -> ResponseEnvelope {
    let headers = BTreeMap::from([("content-type".to_string(), "application/json".to_string())]);
    ResponseEnvelope::new(status, headers, body.to_string(), 1)
}

pub fn text_response(status: u16, body: &str) -> ResponseEnvelope {
    let headers = BTreeMap::from([("content-type".to_string(), "text/plain".to_string())]);
    ResponseEnvelope::new(status, headers, body.to_string(), 1)
}
