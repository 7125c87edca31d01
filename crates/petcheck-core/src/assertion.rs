//! Field-by-field comparison of expected vs actual JSON documents
//!
//! Every requested path is evaluated before anything is reported, so one
//! scenario run shows all of its mismatches.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::HarnessError;

/// Extract a value by dot-notation path (`tags.0.name`).
///
/// Numeric segments index arrays. An empty path (or `$`) is the document.
#[must_use]
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() || path == "$" {
        return Some(document);
    }
    path.split('.')
        .try_fold(document, |current, segment| match current {
            Value::Object(obj) => obj.get(segment),
            Value::Array(arr) => segment.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        })
}

/// Equality used by the engine.
///
/// Primitives compare exactly, arrays element-wise in order, objects by the
/// expected side's keys only (extra actual keys are ignored).
#[must_use]
pub fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => e
            .iter()
            .all(|(key, ev)| a.get(key).is_some_and(|av| values_match(ev, av))),
        (Value::Array(e), Value::Array(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(x, y)| values_match(x, y))
        }
        _ => expected == actual,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    Mismatch,
    /// Path absent on the expected side, the actual side, or both.
    MissingField,
}

/// Result of comparing one field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldCheck {
    pub path: String,
    pub expected: Option<Value>,
    pub actual: Option<Value>,
    pub outcome: CheckOutcome,
}

impl FieldCheck {
    #[must_use]
    pub fn evaluate(path: impl Into<String>, expected: Option<&Value>, actual: Option<&Value>) -> Self {
        let outcome = match (expected, actual) {
            (Some(e), Some(a)) if values_match(e, a) => CheckOutcome::Passed,
            (Some(_), Some(_)) => CheckOutcome::Mismatch,
            _ => CheckOutcome::MissingField,
        };
        Self {
            path: path.into(),
            expected: expected.cloned(),
            actual: actual.cloned(),
            outcome,
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == CheckOutcome::Passed
    }
}

impl fmt::Display for FieldCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| v.as_ref().map_or_else(|| "<missing>".to_string(), Value::to_string);
        match self.outcome {
            CheckOutcome::Passed => write!(f, "{}: ok", self.path),
            CheckOutcome::Mismatch => write!(
                f,
                "{}: expected {}, got {}",
                self.path,
                show(&self.expected),
                show(&self.actual)
            ),
            CheckOutcome::MissingField => {
                let side = match (&self.expected, &self.actual) {
                    (None, None) => "both documents",
                    (None, Some(_)) => "expected document",
                    _ => "actual document",
                };
                write!(f, "{}: missing in {side}", self.path)
            }
        }
    }
}

/// Ordered batch of field checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AssertionResult {
    pub checks: Vec<FieldCheck>,
}

impl AssertionResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `paths` between two documents.
    pub fn compare<I, S>(&mut self, expected: &Value, actual: &Value, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            let path = path.as_ref();
            self.checks.push(FieldCheck::evaluate(
                path,
                lookup(expected, path),
                lookup(actual, path),
            ));
        }
        self
    }

    /// Check a literal expectation against an already extracted value.
    pub fn check_value(
        &mut self,
        label: impl Into<String>,
        expected: impl Into<Value>,
        actual: Option<&Value>,
    ) -> &mut Self {
        let expected = expected.into();
        self.checks
            .push(FieldCheck::evaluate(label, Some(&expected), actual));
        self
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(FieldCheck::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FieldCheck> {
        self.checks.iter().filter(|c| !c.passed())
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Collapse into a result carrying every failing check.
    ///
    /// # Errors
    ///
    /// Returns `AssertionMismatch` if any check failed.
    pub fn into_result(self) -> Result<(), HarnessError> {
        let failures: Vec<FieldCheck> = self.checks.into_iter().filter(|c| !c.passed()).collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::AssertionMismatch(failures))
        }
    }
}

/// Compare `paths` between `expected` and `actual`.
#[must_use]
pub fn compare_fields<I, S>(expected: &Value, actual: &Value, paths: I) -> AssertionResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = AssertionResult::new();
    result.compare(expected, actual, paths);
    result
}
