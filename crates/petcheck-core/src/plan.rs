//! Suite plan and config validation
//!
//! Describes what a run *would* do without sending any requests.
//! Used by `petcheck list` for pre-flight checks and CI previews.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::config::RESERVED_IDS;

// ── Plan types ──

/// Scenario listing plus config validation results.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuitePlan {
    pub scenarios: Vec<ScenarioListing>,
    pub validations: Vec<Validation>,
}

/// One scenario as it would be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioListing {
    pub feature: String,
    pub title: String,
    /// Runs alone after the parallel batch
    pub serial: bool,
    /// Fixture aliases and their resource kinds, e.g. "pet (pet)"
    pub fixtures: Vec<String>,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: String) -> Self {
        Self {
            check: check.into(),
            status,
            message,
        }
    }
}

// ── Config validation ──

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "YOUR_TOKEN",
    "your-api-key",
    "YOUR_API_KEY",
    "CHANGEME",
    "changeme",
    "placeholder",
    "replace-me",
    "REPLACE_ME",
];

/// Validate config and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    if config.base_url.starts_with("http://") || config.base_url.starts_with("https://") {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Ok,
            format!("base_url: {}", config.base_url),
        ));
    } else {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Error,
            format!(
                "base_url: {} (missing http:// or https:// prefix)",
                config.base_url
            ),
        ));
    }

    if config.timeout_secs == 0 {
        checks.push(Validation::new(
            "timeout",
            ValidationStatus::Error,
            "timeout_secs: 0 (must be positive)".into(),
        ));
    } else {
        checks.push(Validation::new(
            "timeout",
            ValidationStatus::Ok,
            format!("timeout_secs: {}", config.timeout_secs),
        ));
    }

    if config.parallelism == 0 {
        checks.push(Validation::new(
            "parallelism",
            ValidationStatus::Error,
            "parallelism: 0 (must be at least 1)".into(),
        ));
    } else {
        checks.push(Validation::new(
            "parallelism",
            ValidationStatus::Ok,
            format!("parallelism: {}", config.parallelism),
        ));
    }

    let ids = config.fixture_ids;
    let reserved: Vec<String> = RESERVED_IDS
        .iter()
        .filter(|id| ids.contains(**id))
        .map(ToString::to_string)
        .collect();
    if ids.is_empty() {
        checks.push(Validation::new(
            "fixture_ids",
            ValidationStatus::Error,
            format!("fixture_ids: [{}, {}) is empty", ids.start, ids.end),
        ));
    } else if !reserved.is_empty() {
        checks.push(Validation::new(
            "fixture_ids",
            ValidationStatus::Error,
            format!(
                "fixture_ids: [{}, {}) contains well-known ids {}",
                ids.start,
                ids.end,
                reserved.join(", ")
            ),
        ));
    } else if ids.start <= 0 {
        checks.push(Validation::new(
            "fixture_ids",
            ValidationStatus::Warning,
            format!(
                "fixture_ids: [{}, {}) includes non-positive ids",
                ids.start, ids.end
            ),
        ));
    } else {
        checks.push(Validation::new(
            "fixture_ids",
            ValidationStatus::Ok,
            format!("fixture_ids: [{}, {})", ids.start, ids.end),
        ));
    }

    if config.array_error_cap == Some(0) {
        checks.push(Validation::new(
            "array_error_cap",
            ValidationStatus::Error,
            "array_error_cap: 0 (must be at least 1)".into(),
        ));
    }

    if let Some(dir) = &config.schema_dir {
        if dir.is_dir() {
            checks.push(Validation::new(
                "schema_dir",
                ValidationStatus::Ok,
                format!("schema_dir: {} (exists)", dir.display()),
            ));
        } else {
            checks.push(Validation::new(
                "schema_dir",
                ValidationStatus::Error,
                format!("schema_dir: {} (not found)", dir.display()),
            ));
        }
    }

    if config.headers.is_empty() {
        checks.push(Validation::new(
            "headers",
            ValidationStatus::Ok,
            "headers: none configured".into(),
        ));
    } else {
        let mut header_issues = Vec::new();
        for (key, value) in &config.headers {
            if value.chars().any(|c| c.is_control()) {
                header_issues.push((
                    ValidationStatus::Error,
                    format!("{key}: contains control characters"),
                ));
                continue;
            }
            if value.contains('<') && value.contains('>') {
                header_issues.push((
                    ValidationStatus::Warning,
                    format!("{key}: contains '<...>' placeholder"),
                ));
            }
            if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| value.contains(*p)) {
                header_issues.push((
                    ValidationStatus::Warning,
                    format!("{key}: contains '{pattern}', may be a placeholder"),
                ));
            }
        }

        if header_issues.is_empty() {
            checks.push(Validation::new(
                "headers",
                ValidationStatus::Ok,
                format!("headers: {} configured", config.headers.len()),
            ));
        } else {
            for (status, issue) in header_issues {
                checks.push(Validation::new("headers", status, issue));
            }
        }
    }

    checks
}

// ── Display helpers ──

impl SuitePlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        let serial = self.scenarios.iter().filter(|s| s.serial).count();
        lines.push(format!(
            "{} scenarios ({} serial)\n",
            self.scenarios.len(),
            serial
        ));

        let mut current_feature: Option<&str> = None;
        for s in &self.scenarios {
            if current_feature != Some(s.feature.as_str()) {
                lines.push(format!("{}:", s.feature));
                current_feature = Some(&s.feature);
            }
            let marker = if s.serial { " [serial]" } else { "" };
            lines.push(format!("  {}{marker}", s.title));
            if !s.fixtures.is_empty() {
                lines.push(format!("    fixtures: {}", s.fixtures.join(", ")));
            }
        }
        lines.push(String::new());

        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdRange;
    use std::collections::BTreeMap;

    fn config_with_headers(headers: BTreeMap<String, String>) -> Config {
        Config {
            headers,
            ..Config::default()
        }
    }

    fn find<'a>(checks: &'a [Validation], name: &str) -> &'a Validation {
        checks.iter().find(|c| c.check == name).unwrap()
    }

    #[test]
    fn default_config_is_clean() {
        let checks = validate_config(&Config::default());
        assert!(checks.iter().all(|c| c.status == ValidationStatus::Ok));
    }

    #[test]
    fn validate_placeholder_angle_brackets() {
        let h = BTreeMap::from([("Authorization".into(), "Bearer <your-token-here>".into())]);
        let checks = validate_config(&config_with_headers(h));
        assert!(
            checks
                .iter()
                .filter(|c| c.check == "headers")
                .any(|c| c.status == ValidationStatus::Warning),
            "Should warn about angle-bracket placeholder"
        );
    }

    #[test]
    fn validate_real_key_no_warning() {
        let h = BTreeMap::from([("api_key".into(), "special-key".into())]);
        let checks = validate_config(&config_with_headers(h));
        let header_checks: Vec<_> = checks.iter().filter(|c| c.check == "headers").collect();
        assert_eq!(header_checks.len(), 1);
        assert_eq!(header_checks[0].status, ValidationStatus::Ok);
    }

    #[test]
    fn validate_header_control_chars() {
        let h = BTreeMap::from([("X-Trace".into(), "abc\r\ninjected: 1".into())]);
        let checks = validate_config(&config_with_headers(h));
        assert_eq!(find(&checks, "headers").status, ValidationStatus::Error);
    }

    #[test]
    fn validate_bad_base_url() {
        let cfg = Config {
            base_url: "localhost:8080".into(),
            ..Config::default()
        };
        let checks = validate_config(&cfg);
        assert_eq!(find(&checks, "base_url").status, ValidationStatus::Error);
    }

    #[test]
    fn validate_zero_timeout_and_parallelism() {
        let cfg = Config {
            timeout_secs: 0,
            parallelism: 0,
            ..Config::default()
        };
        let checks = validate_config(&cfg);
        assert_eq!(find(&checks, "timeout").status, ValidationStatus::Error);
        assert_eq!(find(&checks, "parallelism").status, ValidationStatus::Error);
    }

    #[test]
    fn validate_id_range() {
        let empty = Config {
            fixture_ids: IdRange { start: 10, end: 10 },
            ..Config::default()
        };
        assert_eq!(
            find(&validate_config(&empty), "fixture_ids").status,
            ValidationStatus::Error
        );

        let negative = Config {
            fixture_ids: IdRange { start: -50, end: 0 },
            ..Config::default()
        };
        assert_eq!(
            find(&validate_config(&negative), "fixture_ids").status,
            ValidationStatus::Warning
        );
    }

    #[test]
    fn id_range_covering_well_known_ids_is_rejected() {
        for (start, end, listed) in [(0, 50, "1"), (1, 20_000, "1, 9999"), (5_000, 10_000, "9999")] {
            let cfg = Config {
                fixture_ids: IdRange { start, end },
                ..Config::default()
            };
            let check = find(&validate_config(&cfg), "fixture_ids").clone();
            assert_eq!(check.status, ValidationStatus::Error, "[{start}, {end})");
            assert!(check.message.ends_with(&format!("well-known ids {listed}")), "{}", check.message);
        }

        let clear = Config {
            fixture_ids: IdRange { start: 10_000, end: 20_000 },
            ..Config::default()
        };
        assert_eq!(
            find(&validate_config(&clear), "fixture_ids").status,
            ValidationStatus::Ok
        );
    }

    #[test]
    fn zero_array_error_cap_is_rejected() {
        let cfg = Config {
            array_error_cap: Some(0),
            ..Config::default()
        };
        assert_eq!(find(&validate_config(&cfg), "array_error_cap").status, ValidationStatus::Error);

        let capped = Config {
            array_error_cap: Some(3),
            ..Config::default()
        };
        assert!(validate_config(&capped).iter().all(|c| c.check != "array_error_cap"));
    }

    #[test]
    fn validate_missing_schema_dir() {
        let cfg = Config {
            schema_dir: Some("does/not/exist".into()),
            ..Config::default()
        };
        let checks = validate_config(&cfg);
        assert_eq!(find(&checks, "schema_dir").status, ValidationStatus::Error);
    }

    #[test]
    fn plan_terminal_output() {
        let plan = SuitePlan {
            scenarios: vec![
                ScenarioListing {
                    feature: "Pet".into(),
                    title: "Get pet by id".into(),
                    serial: false,
                    fixtures: vec!["pet (pet)".into()],
                },
                ScenarioListing {
                    feature: "Store".into(),
                    title: "Place order".into(),
                    serial: true,
                    fixtures: vec![],
                },
            ],
            validations: vec![Validation::new(
                "base_url",
                ValidationStatus::Ok,
                "base_url: http://localhost:8080/api/v3".into(),
            )],
        };

        let text = plan.to_terminal();
        assert!(text.contains("2 scenarios (1 serial)"));
        assert!(text.contains("Pet:\n  Get pet by id\n    fixtures: pet (pet)"));
        assert!(text.contains("  Place order [serial]"));
        assert!(text.contains("[OK] base_url: http://localhost:8080/api/v3"));
        assert!(!plan.has_errors());
        assert!(!plan.has_warnings());
    }
}
