//! Report model: scenario states, step events, findings and the suite verdict
//!
//! The runner emits [`StepEvent`]s while a scenario runs and one
//! [`ScenarioReport`] when it reaches a terminal state. Sinks decide where
//! they go; the CLI renders the final [`SuiteReport`].

mod dump;
mod generator;

pub use dump::JsonlSink;
pub use generator::{mask_headers, to_http_file};

use std::fmt;
use std::sync::{Mutex, PoisonError};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// Per-scenario lifecycle state.
///
/// `Executing` and `Validating` may alternate when a scenario sends several
/// requests. The three terminal states are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    Pending,
    Arranging,
    Executing,
    Validating,
    Reporting,
    Passed,
    Failed,
    Errored,
}

impl ScenarioState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Errored)
    }

    /// Whether `next` may follow `self`.
    ///
    /// Any non-terminal state may jump to `Errored`.
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        use ScenarioState::{
            Arranging, Errored, Executing, Failed, Passed, Pending, Reporting, Validating,
        };
        match (self, next) {
            (Pending, Arranging)
            | (Arranging, Executing)
            | (Executing, Validating)
            | (Validating, Executing)
            | (Executing | Validating, Reporting)
            | (Reporting, Passed | Failed) => true,
            (from, Errored) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Terminal outcome of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Errored,
}

impl Outcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Errored => "ERROR",
        }
    }

    #[must_use]
    pub const fn state(self) -> ScenarioState {
        match self {
            Self::Passed => ScenarioState::Passed,
            Self::Failed => ScenarioState::Failed,
            Self::Errored => ScenarioState::Errored,
        }
    }

    /// Exit code contribution (0 pass, 1 fail, 2 error)
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
            Self::Errored => 2,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical phase a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Prepare,
    Send,
    Validate,
    Assert,
}

impl StepKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Send => "send",
            Self::Validate => "validate",
            Self::Assert => "assert",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Errored,
}

/// One step-level event as seen by a reporting sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StepEvent {
    pub scenario: String,
    pub step: String,
    pub kind: StepKind,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    UnexpectedStatus,
    SchemaValidation,
    AssertionMismatch,
}

/// A recorded Failed-level problem; the scenario continued past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    pub step: String,
    pub kind: FindingKind,
    pub message: String,
    /// One line per violation or failed field check
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl Finding {
    /// Build a finding from a failure-class error; `None` for anything else.
    #[must_use]
    pub fn from_error(step: &str, error: &HarnessError) -> Option<Self> {
        let (kind, details) = match error {
            HarnessError::UnexpectedStatus { body, .. } => {
                let details = if body.is_empty() {
                    vec![]
                } else {
                    vec![format!("body: {body}")]
                };
                (FindingKind::UnexpectedStatus, details)
            }
            HarnessError::SchemaValidation { violations, .. } => (
                FindingKind::SchemaValidation,
                violations.iter().map(ToString::to_string).collect(),
            ),
            HarnessError::AssertionMismatch(checks) => (
                FindingKind::AssertionMismatch,
                checks.iter().map(ToString::to_string).collect(),
            ),
            _ => return None,
        };
        Some(Self {
            step: step.to_string(),
            kind,
            message: error.to_string(),
            details,
        })
    }
}

/// Request/response pair captured for reproduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Exchange {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<serde_json::Value>,
    /// Absent when the request never got a response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    pub elapsed_ms: u64,
}

/// Final record of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioReport {
    pub title: String,
    pub feature: String,
    pub outcome: Outcome,
    /// Transition trail from `pending` to the terminal state
    pub states: Vec<ScenarioState>,
    pub steps: Vec<StepEvent>,
    pub findings: Vec<Finding>,
    /// Error that ended the scenario early (Errored only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Fixture teardown problems; never affect the outcome
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exchanges: Vec<Exchange>,
    pub duration_ms: u64,
}

impl ScenarioReport {
    /// Steps that did not pass, in order.
    pub fn failing_steps(&self) -> impl Iterator<Item = &StepEvent> {
        self.steps.iter().filter(|s| s.status != StepStatus::Passed)
    }
}

/// Scenario counts by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SuiteCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub status: Outcome,
    pub exit_code: i32,
    pub reason: String,
}

/// All scenario reports of one run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
    pub duration_ms: u64,
}

impl SuiteReport {
    #[must_use]
    pub fn counts(&self) -> SuiteCounts {
        let mut counts = SuiteCounts {
            total: self.scenarios.len(),
            ..SuiteCounts::default()
        };
        for s in &self.scenarios {
            match s.outcome {
                Outcome::Passed => counts.passed += 1,
                Outcome::Failed => counts.failed += 1,
                Outcome::Errored => counts.errored += 1,
            }
        }
        counts
    }

    /// PASS requires at least one scenario and all of them Passed.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        let counts = self.counts();
        let status = self
            .scenarios
            .iter()
            .map(|s| s.outcome)
            .max()
            .unwrap_or(Outcome::Failed);

        if counts.total == 0 {
            return Verdict {
                status,
                exit_code: 1,
                reason: "No scenarios were run".into(),
            };
        }

        let reason = if status == Outcome::Passed {
            format!("All {} scenarios passed", counts.total)
        } else {
            let mut parts = Vec::new();
            if counts.failed > 0 {
                parts.push(format!("{} failed", counts.failed));
            }
            if counts.errored > 0 {
                parts.push(format!("{} errored", counts.errored));
            }
            format!("{} of {} scenarios: {}", counts.failed + counts.errored, counts.total, parts.join(", "))
        };

        Verdict {
            status,
            exit_code: status.exit_code(),
            reason,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.verdict().exit_code
    }

    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        for s in &self.scenarios {
            lines.push(format!(
                "{:<5} {} / {} ({}ms)",
                s.outcome.as_str(),
                s.feature,
                s.title,
                s.duration_ms
            ));
            for finding in &s.findings {
                lines.push(format!("      [{}] {}", finding.step, finding.message));
                for detail in &finding.details {
                    lines.push(format!("        - {detail}"));
                }
            }
            if let Some(error) = &s.error {
                lines.push(format!("      error: {error}"));
            }
            for warning in &s.warnings {
                lines.push(format!("      warning: {warning}"));
            }
        }

        let counts = self.counts();
        let verdict = self.verdict();
        lines.push(String::new());
        lines.push(format!(
            "{}: {} ({} passed, {} failed, {} errored in {}ms)",
            verdict.status,
            verdict.reason,
            counts.passed,
            counts.failed,
            counts.errored,
            self.duration_ms
        ));
        lines.push(format!("  Exit code: {}", verdict.exit_code));

        lines.join("\n")
    }
}

/// Generate JSON Schema for the suite report format.
///
/// # Errors
///
/// Returns error if the schema cannot be serialized
pub fn generate_schema() -> serde_json::Result<String> {
    let schema = schemars::schema_for!(SuiteReport);
    serde_json::to_string_pretty(&schema)
}

// ── Sinks ──

/// Receives step events and final scenario reports.
///
/// Called concurrently from worker threads.
pub trait ReportSink: Send + Sync {
    fn on_step(&self, event: &StepEvent);
    fn on_scenario(&self, report: &ScenarioReport);
}

/// Emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn on_step(&self, event: &StepEvent) {
        match event.status {
            StepStatus::Passed => tracing::debug!(
                scenario = %event.scenario,
                step = %event.step,
                kind = %event.kind,
                elapsed_ms = event.elapsed_ms,
                "step passed"
            ),
            StepStatus::Failed | StepStatus::Errored => tracing::info!(
                scenario = %event.scenario,
                step = %event.step,
                kind = %event.kind,
                status = ?event.status,
                message = event.message.as_deref().unwrap_or(""),
                "step did not pass"
            ),
        }
    }

    fn on_scenario(&self, report: &ScenarioReport) {
        tracing::info!(
            feature = %report.feature,
            scenario = %report.title,
            outcome = %report.outcome,
            findings = report.findings.len(),
            warnings = report.warnings.len(),
            duration_ms = report.duration_ms,
            "scenario finished"
        );
    }
}

/// Collects everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    steps: Mutex<Vec<StepEvent>>,
    scenarios: Mutex<Vec<ScenarioReport>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn steps(&self) -> Vec<StepEvent> {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn scenarios(&self) -> Vec<ScenarioReport> {
        self.scenarios
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReportSink for MemorySink {
    fn on_step(&self, event: &StepEvent) {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }

    fn on_scenario(&self, report: &ScenarioReport) {
        self.scenarios
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
    }
}

/// Forwards every event to each inner sink in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl FanoutSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for FanoutSink {
    fn on_step(&self, event: &StepEvent) {
        for sink in &self.sinks {
            sink.on_step(event);
        }
    }

    fn on_scenario(&self, report: &ScenarioReport) {
        for sink in &self.sinks {
            sink.on_scenario(report);
        }
    }
}

impl<S: ReportSink + ?Sized> ReportSink for std::sync::Arc<S> {
    fn on_step(&self, event: &StepEvent) {
        (**self).on_step(event);
    }

    fn on_scenario(&self, report: &ScenarioReport) {
        (**self).on_scenario(report);
    }
}
