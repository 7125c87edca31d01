//! Request Executor: one blocking HTTP exchange per call

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use petcheck_core::{Config, EndpointDescriptor, HarnessError, Method, RequestSpec, ResponseEnvelope};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::SetupError;

/// Sends one request and captures the response.
///
/// Network failures surface as `Transport`; any HTTP status, including 5xx,
/// is a successful execution. No retries.
pub trait RequestExecutor: Send + Sync {
    /// # Errors
    ///
    /// `Transport` on network failure, `InvalidRequest` if the URL cannot be built.
    fn execute(
        &self,
        endpoint: &EndpointDescriptor,
        request: RequestSpec,
    ) -> Result<ResponseEnvelope, HarnessError>;
}

/// `reqwest` blocking client with suite-wide headers and timeout.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::blocking::Client,
}

impl HttpExecutor {
    /// # Errors
    ///
    /// Returns error if a header is not valid HTTP or the client fails to build.
    pub fn new(timeout: Duration, headers: &BTreeMap<String, String>) -> Result<Self, SetupError> {
        let mut default_headers = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| SetupError::Header(key.clone(), e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SetupError::Header(key.clone(), e.to_string()))?;
            default_headers.insert(name, value);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| SetupError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// # Errors
    ///
    /// See [`HttpExecutor::new`].
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        Self::new(config.timeout(), &config.headers)
    }
}

const fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl RequestExecutor for HttpExecutor {
    fn execute(
        &self,
        endpoint: &EndpointDescriptor,
        request: RequestSpec,
    ) -> Result<ResponseEnvelope, HarnessError> {
        let url = endpoint.url(&request)?;
        let method = endpoint.method();

        let mut req = self.client.request(reqwest_method(method), &url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let start = Instant::now();
        let resp = req
            .send()
            .map_err(|e| HarnessError::Transport(format!("{method} {url}: {e}")))?;

        let status = resp.status().as_u16();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = resp
            .text()
            .map_err(|e| HarnessError::Transport(format!("{method} {url}: reading body: {e}")))?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::debug!(%method, %url, status, elapsed_ms, "request");
        Ok(ResponseEnvelope::new(status, headers, body, elapsed_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_header_name() {
        let headers = BTreeMap::from([("bad header".to_string(), "x".to_string())]);
        let err = HttpExecutor::new(Duration::from_secs(1), &headers).unwrap_err();
        assert!(matches!(err, SetupError::Header(name, _) if name == "bad header"));
    }

    #[test]
    fn rejects_invalid_header_value() {
        let headers = BTreeMap::from([("X-Trace".to_string(), "a\nb".to_string())]);
        assert!(HttpExecutor::new(Duration::from_secs(1), &headers).is_err());
    }

    #[test]
    fn refused_connection_is_transport_error() {
        let executor = HttpExecutor::new(Duration::from_secs(2), &BTreeMap::new()).unwrap();
        let endpoint = EndpointDescriptor::new("http://127.0.0.1:1", Method::Get, "/pet/{petId}");
        let err = executor
            .execute(&endpoint, RequestSpec::new().path_param("petId", 1))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Transport(ref msg) if msg.starts_with("GET http://127.0.0.1:1/pet/1")));
        assert!(!err.is_failure());
    }

    #[test]
    fn missing_path_param_is_invalid_request() {
        let executor = HttpExecutor::new(Duration::from_secs(1), &BTreeMap::new()).unwrap();
        let endpoint = EndpointDescriptor::new("http://127.0.0.1:1", Method::Delete, "/pet/{petId}");
        let err = executor.execute(&endpoint, RequestSpec::new()).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidRequest(_)));
    }
}
