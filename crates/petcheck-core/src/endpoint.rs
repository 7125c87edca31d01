//! Endpoint and request descriptors

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// HTTP methods the harness issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(HarnessError::InvalidRequest(format!(
                "unsupported HTTP method '{other}'"
            ))),
        }
    }
}

/// Where a request goes: base URL + path template + method.
///
/// Configured once per suite run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    base_url: String,
    path_template: String,
    method: Method,
}

impl EndpointDescriptor {
    pub fn new(base_url: impl Into<String>, method: Method, path_template: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            path_template: path_template.into(),
            method,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Operation label, e.g. `"GET /pet/{petId}"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path_template)
    }

    /// Substitute `{name}` placeholders in the path template.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if a placeholder has no value.
    pub fn render(&self, path_params: &BTreeMap<String, String>) -> Result<String, HarnessError> {
        let mut rendered = String::with_capacity(self.path_template.len());
        let mut rest = self.path_template.as_str();

        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                return Err(HarnessError::InvalidRequest(format!(
                    "unterminated placeholder in {}",
                    self.path_template
                )));
            };
            let name = &rest[open + 1..open + close];
            let value = path_params.get(name).ok_or_else(|| {
                HarnessError::InvalidRequest(format!(
                    "missing path parameter '{name}' for {}",
                    self.label()
                ))
            })?;
            rendered.push_str(&rest[..open]);
            rendered.push_str(value);
            rest = &rest[open + close + 1..];
        }
        rendered.push_str(rest);

        Ok(rendered)
    }

    /// Full URL for a request (without query string).
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if a path parameter is missing.
    pub fn url(&self, request: &RequestSpec) -> Result<String, HarnessError> {
        Ok(format!("{}{}", self.base_url, self.render(&request.path_params)?))
    }
}

/// Per-scenario request inputs, consumed by the executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSpec {
    pub path_params: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path_params.insert(name.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the value cannot be serialized to JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HarnessError> {
        let value = serde_json::to_value(body)
            .map_err(|e| HarnessError::InvalidRequest(format!("body is not JSON: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Attach an already-built JSON value.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}
