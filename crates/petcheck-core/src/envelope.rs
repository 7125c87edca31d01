//! Captured result of one HTTP exchange

use std::collections::BTreeMap;

use crate::HarnessError;

/// Status, headers, raw body and (if the body is JSON) its parsed form.
///
/// Read-only once produced by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    status: u16,
    headers: BTreeMap<String, String>,
    body: String,
    json: Option<serde_json::Value>,
    elapsed_ms: u64,
}

impl ResponseEnvelope {
    /// Build an envelope, parsing the body as JSON when possible.
    ///
    /// Empty and non-JSON bodies leave `json` absent; they are not errors.
    #[must_use]
    pub fn new(
        status: u16,
        headers: BTreeMap<String, String>,
        body: String,
        elapsed_ms: u64,
    ) -> Self {
        let json = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&body).ok()
        };
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status,
            headers,
            body,
            json,
            elapsed_ms,
        }
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Raw body text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub const fn json(&self) -> Option<&serde_json::Value> {
        self.json.as_ref()
    }

    /// Header lookup (names are stored lowercase).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Media type without parameters, e.g. `application/json`.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
            .map(|ct| ct.split(';').next().unwrap_or("").trim())
    }

    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Check the status against an expected set.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedStatus` carrying the body so the report shows what
    /// the service actually said.
    pub fn expect_status(&self, expected: &[u16]) -> Result<&Self, HarnessError> {
        if expected.contains(&self.status) {
            Ok(self)
        } else {
            Err(HarnessError::UnexpectedStatus {
                expected: expected.to_vec(),
                actual: self.status,
                body: truncate(&self.body, 200),
            })
        }
    }
}

/// UTF-8 safe truncation for report snippets.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…({} bytes total)", &text[..end], text.len())
}
