//! HTTP file generator - converts failed scenarios to .http format

use std::collections::BTreeMap;

use super::{Outcome, ScenarioReport};

/// Headers that should be masked in reproductions.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "api_key",
    "x-api-key",
    "x-auth-token",
    "cookie",
    "set-cookie",
    "proxy-authorization",
];

/// Mask value for redacted headers.
const MASK: &str = "***";

/// Returns true if the header name matches a known sensitive header (case-insensitive).
fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|&h| name.eq_ignore_ascii_case(h))
}

/// Copy of `headers` with sensitive values replaced by `***`.
#[must_use]
pub fn mask_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| {
            let value = if is_sensitive_header(key) {
                MASK.to_string()
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}

/// Generate .http file content for every exchange of failed/errored scenarios.
///
/// `headers` are the suite-wide request headers; sensitive ones are masked.
#[must_use]
pub fn to_http_file(reports: &[ScenarioReport], headers: &BTreeMap<String, String>) -> String {
    let failing: Vec<&ScenarioReport> = reports
        .iter()
        .filter(|r| r.outcome != Outcome::Passed)
        .collect();
    let headers = mask_headers(headers);

    let mut lines = Vec::new();
    lines.push(format!(
        "# Auto-generated reproduction cases ({} scenarios)",
        failing.len()
    ));
    lines.push(String::new());

    for report in failing {
        for (idx, exchange) in report.exchanges.iter().enumerate() {
            let status = exchange
                .status
                .map_or_else(|| "no response".to_string(), |s| s.to_string());
            lines.push(format!(
                "### {} / {} [{idx}] - {} ({status})",
                report.feature, report.title, report.outcome
            ));
            lines.push(format!("{} {}", exchange.method, exchange.url));

            for (key, value) in &headers {
                if !matches!(
                    key.to_ascii_lowercase().as_str(),
                    "host" | "content-length" | "content-type"
                ) {
                    lines.push(format!("{key}: {value}"));
                }
            }

            if let Some(body) = &exchange.request_body {
                lines.push("Content-Type: application/json".to_string());
                lines.push(String::new());
                lines.push(serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string()));
            }

            lines.push(String::new());
        }
    }

    lines.join("\n")
}
