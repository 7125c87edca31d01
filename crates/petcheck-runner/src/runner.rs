//! Scenario Runner: drives one scenario through its lifecycle
//!
//! ```text
//! Pending → Arranging → Executing ⇄ Validating → Reporting → Passed | Failed
//!              └──────────────┴───────────┴──────────→ Errored
//! ```
//!
//! Status, schema and assertion problems are recorded as findings and the
//! body keeps going. Transport and fixture errors end the body early.
//! Fixtures are torn down on every path, panics included.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use petcheck_core::report::TracingSink;
use petcheck_core::schema::ValidationResult;
use petcheck_core::{
    AssertionResult, Config, EndpointDescriptor, Exchange, Finding, HarnessError, Outcome,
    ReportSink, RequestSpec, ResponseEnvelope, ScenarioReport, ScenarioState, SchemaError,
    SchemaRegistry, StepEvent, StepKind, StepStatus, Violation, ViolationReason, compare_fields,
};
use serde_json::Value;

use crate::SetupError;
use crate::executor::{HttpExecutor, RequestExecutor};
use crate::fixture::{FixtureGuard, FixtureProvider, IdAllocator, ResourceKind};
use crate::scenario::{Fixtures, Scenario};

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// URL as sent, query string included (display only, not encoded).
fn display_url(endpoint: &EndpointDescriptor, request: &RequestSpec) -> String {
    let mut url = endpoint
        .url(request)
        .unwrap_or_else(|_| format!("{}{}", endpoint.base_url(), endpoint.path_template()));
    if !request.query.is_empty() {
        let query: Vec<String> = request.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        url.push('?');
        url.push_str(&query.join("&"));
    }
    url
}

/// Handle a scenario body uses to send requests and record checks.
pub struct ScenarioContext<'a> {
    title: &'a str,
    executor: &'a dyn RequestExecutor,
    schemas: &'a SchemaRegistry,
    provider: &'a FixtureProvider,
    ids: &'a IdAllocator,
    sink: &'a dyn ReportSink,
    states: Vec<ScenarioState>,
    steps: Vec<StepEvent>,
    findings: Vec<Finding>,
    exchanges: Vec<Exchange>,
    adopted: Vec<FixtureGuard>,
}

impl ScenarioContext<'_> {
    #[must_use]
    pub fn title(&self) -> &str {
        self.title
    }

    /// Unique identifiers for resources the scenario creates itself.
    #[must_use]
    pub fn ids(&self) -> &IdAllocator {
        self.ids
    }

    #[must_use]
    pub fn state(&self) -> ScenarioState {
        self.states.last().copied().unwrap_or(ScenarioState::Pending)
    }

    fn enter(&mut self, next: ScenarioState) {
        let current = self.state();
        if current == next {
            return;
        }
        debug_assert!(
            current.can_transition(next),
            "illegal transition {current:?} -> {next:?}"
        );
        tracing::trace!(scenario = self.title, from = ?current, to = ?next, "transition");
        self.states.push(next);
    }

    fn emit(
        &mut self,
        kind: StepKind,
        step: String,
        status: StepStatus,
        message: Option<String>,
        start: Instant,
    ) {
        let event = StepEvent {
            scenario: self.title.to_string(),
            step,
            kind,
            status,
            message,
            elapsed_ms: elapsed_ms(start),
        };
        self.sink.on_step(&event);
        self.steps.push(event);
    }

    fn record_finding(&mut self, step: &str, error: &HarnessError) {
        if let Some(finding) = Finding::from_error(step, error) {
            self.findings.push(finding);
        }
    }

    /// Run one named step.
    ///
    /// Returns `Ok(Some(v))` on success and `Ok(None)` when the step produced
    /// a finding (recorded, the body may continue).
    ///
    /// # Errors
    ///
    /// Any non-finding error is recorded and returned so the body can stop with `?`.
    pub fn step<T, F>(
        &mut self,
        kind: StepKind,
        label: impl Into<String>,
        f: F,
    ) -> Result<Option<T>, HarnessError>
    where
        F: FnOnce(&mut Self) -> Result<T, HarnessError>,
    {
        let label = label.into();
        match kind {
            StepKind::Send => self.enter(ScenarioState::Executing),
            StepKind::Validate | StepKind::Assert => self.enter(ScenarioState::Validating),
            StepKind::Prepare => {}
        }

        let start = Instant::now();
        match f(self) {
            Ok(value) => {
                self.emit(kind, label, StepStatus::Passed, None, start);
                Ok(Some(value))
            }
            Err(e) if e.is_failure() => {
                self.record_finding(&label, &e);
                self.emit(kind, label, StepStatus::Failed, Some(e.to_string()), start);
                Ok(None)
            }
            Err(e) => {
                self.emit(kind, label, StepStatus::Errored, Some(e.to_string()), start);
                Err(e)
            }
        }
    }

    /// Send one request and capture the exchange for the report.
    ///
    /// # Errors
    ///
    /// Returns `Transport`/`InvalidRequest` from the executor.
    pub fn send(
        &mut self,
        endpoint: &EndpointDescriptor,
        request: RequestSpec,
    ) -> Result<ResponseEnvelope, HarnessError> {
        self.enter(ScenarioState::Executing);
        let url = display_url(endpoint, &request);
        let request_body = request.body.clone();

        let start = Instant::now();
        let result = self.executor.execute(endpoint, request);

        self.exchanges.push(Exchange {
            method: endpoint.method().to_string(),
            url,
            request_body,
            status: result.as_ref().ok().map(ResponseEnvelope::status),
            response_body: result.as_ref().ok().map(|r| r.text().to_string()),
            elapsed_ms: result
                .as_ref()
                .map_or_else(|_| elapsed_ms(start), ResponseEnvelope::elapsed_ms),
        });

        match &result {
            Ok(resp) => self.emit(
                StepKind::Send,
                endpoint.label(),
                StepStatus::Passed,
                Some(format!("{}", resp.status())),
                start,
            ),
            Err(e) => self.emit(
                StepKind::Send,
                endpoint.label(),
                StepStatus::Errored,
                Some(e.to_string()),
                start,
            ),
        }
        result
    }

    /// Record whether the status is one of `expected`.
    pub fn expect_status(&mut self, response: &ResponseEnvelope, expected: &[u16]) -> bool {
        let label = format!(
            "status is {}",
            expected
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or ")
        );
        self.step(StepKind::Assert, label, |_| {
            response.expect_status(expected).map(|_| ())
        })
        .is_ok_and(|passed| passed.is_some())
    }

    /// Validate the response body against a registered schema.
    ///
    /// A missing or non-JSON body is a violation at `$`.
    ///
    /// # Errors
    ///
    /// Returns `Schema` if `schema` is not registered.
    pub fn validate_schema(&mut self, response: &ResponseEnvelope, schema: &str) -> Result<bool, HarnessError> {
        let schemas = self.schemas;
        let passed = self.step(StepKind::Validate, format!("{schema} schema"), |_| {
            let definition = schemas
                .get(schema)
                .ok_or_else(|| SchemaError::Unknown(schema.to_string()))?;
            let violations = match response.json() {
                None => vec![Violation {
                    field_path: "$".into(),
                    reason: ViolationReason::TypeMismatch {
                        expected: definition.root.field_type,
                        actual: "non-JSON body".into(),
                    },
                }],
                Some(doc) => match schemas.validate(doc, schema)? {
                    ValidationResult::Valid => return Ok(()),
                    ValidationResult::Invalid(violations) => violations,
                },
            };
            Err(HarnessError::SchemaValidation {
                schema: schema.to_string(),
                violations,
            })
        })?;
        Ok(passed.is_some())
    }

    /// Compare `paths` of `expected` against the actual document.
    ///
    /// An absent actual document makes every path a missing field.
    pub fn assert_fields(
        &mut self,
        label: impl Into<String>,
        expected: &Value,
        actual: Option<&Value>,
        paths: &[&str],
    ) -> bool {
        let null = Value::Null;
        let actual = actual.unwrap_or(&null);
        self.step(StepKind::Assert, label, |_| {
            compare_fields(expected, actual, paths).into_result()
        })
        .is_ok_and(|passed| passed.is_some())
    }

    /// Evaluate an ad-hoc batch of checks as one step.
    pub fn check<F>(&mut self, label: impl Into<String>, build: F) -> bool
    where
        F: FnOnce(&mut AssertionResult),
    {
        self.step(StepKind::Assert, label, |_| {
            let mut result = AssertionResult::new();
            build(&mut result);
            result.into_result()
        })
        .is_ok_and(|passed| passed.is_some())
    }

    /// Delete `id` when the scenario ends, like a declared fixture.
    ///
    /// For resources the body creates itself; register before creating.
    pub fn adopt(&mut self, kind: &ResourceKind, id: i64) {
        self.adopted.push(self.provider.adopt(kind, id));
    }

    fn release_adopted(&mut self) {
        while let Some(guard) = self.adopted.pop() {
            drop(guard);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs scenarios against one service with shared, read-only collaborators.
pub struct ScenarioRunner {
    executor: Arc<dyn RequestExecutor>,
    schemas: Arc<SchemaRegistry>,
    ids: Arc<IdAllocator>,
    sink: Arc<dyn ReportSink>,
}

impl ScenarioRunner {
    #[must_use]
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        schemas: Arc<SchemaRegistry>,
        ids: Arc<IdAllocator>,
    ) -> Self {
        Self {
            executor,
            schemas,
            ids,
            sink: Arc::new(TracingSink),
        }
    }

    /// HTTP executor, built-in schemas (plus `schema_dir`) and the fixture id range.
    ///
    /// # Errors
    ///
    /// Returns error if the schema directory cannot be loaded or the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let mut schemas = SchemaRegistry::builtin().with_array_error_cap(config.array_error_cap);
        if let Some(dir) = &config.schema_dir {
            let loaded = schemas.load_dir(dir)?;
            tracing::info!(dir = %dir.display(), schemas = ?loaded, "loaded schema overrides");
        }
        let executor = HttpExecutor::from_config(config)?;
        Ok(Self::new(
            Arc::new(executor),
            Arc::new(schemas),
            Arc::new(IdAllocator::new(config.fixture_ids)),
        ))
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    fn arrange(
        ctx: &mut ScenarioContext<'_>,
        provider: &FixtureProvider,
        scenario: &Scenario,
    ) -> Result<Fixtures, HarnessError> {
        let mut fixtures = Fixtures::default();
        for decl in &scenario.fixtures {
            let label = format!("create {} ({})", decl.alias, decl.kind.name);
            let guard = ctx.step(StepKind::Prepare, label, |ctx| {
                let allocated = ctx.ids().next_id()?;
                let payload = (*decl.payload)(allocated);
                let id = payload.get("id").and_then(Value::as_i64).unwrap_or(allocated);
                provider.provision(&decl.kind, id, payload)
            })?;
            if let Some(guard) = guard {
                fixtures.push(decl.alias.clone(), guard);
            }
        }
        Ok(fixtures)
    }

    /// Run one scenario to a terminal state and emit its report.
    #[must_use]
    pub fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let started = Instant::now();
        let provider = FixtureProvider::new(Arc::clone(&self.executor));
        let mut ctx = ScenarioContext {
            title: scenario.title(),
            executor: &*self.executor,
            schemas: &self.schemas,
            provider: &provider,
            ids: &self.ids,
            sink: &*self.sink,
            states: vec![ScenarioState::Pending],
            steps: Vec::new(),
            findings: Vec::new(),
            exchanges: Vec::new(),
            adopted: Vec::new(),
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            ctx.enter(ScenarioState::Arranging);
            let fixtures = Self::arrange(&mut ctx, &provider, scenario)?;
            ctx.enter(ScenarioState::Executing);
            (*scenario.body)(&mut ctx, &fixtures)
        }));
        ctx.release_adopted();

        let (outcome, error) = match result {
            Ok(Ok(())) if ctx.findings.is_empty() => (Outcome::Passed, None),
            Ok(Ok(())) => (Outcome::Failed, None),
            Ok(Err(e)) if e.is_failure() => {
                ctx.record_finding("body", &e);
                (Outcome::Failed, None)
            }
            Ok(Err(e)) => (Outcome::Errored, Some(e.to_string())),
            Err(payload) => (
                Outcome::Errored,
                Some(format!("scenario panicked: {}", panic_message(payload.as_ref()))),
            ),
        };

        if outcome == Outcome::Errored {
            ctx.enter(ScenarioState::Errored);
        } else {
            ctx.enter(ScenarioState::Reporting);
            ctx.enter(outcome.state());
        }

        let report = ScenarioReport {
            title: scenario.title().to_string(),
            feature: scenario.feature().to_string(),
            outcome,
            states: ctx.states,
            steps: ctx.steps,
            findings: ctx.findings,
            error,
            warnings: provider.take_warnings(),
            exchanges: ctx.exchanges,
            duration_ms: elapsed_ms(started),
        };
        self.sink.on_scenario(&report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedExecutor, json_response, text_response};
    use petcheck_core::report::MemorySink;
    use petcheck_core::{FindingKind, IdRange, Method};
    use serde_json::json;

    const BASE: &str = "http://petstore/api/v3";

    fn get_pet() -> EndpointDescriptor {
        EndpointDescriptor::new(BASE, Method::Get, "/pet/{petId}")
    }

    fn pet_kind() -> ResourceKind {
        ResourceKind::new(
            "pet",
            EndpointDescriptor::new(BASE, Method::Post, "/pet"),
            EndpointDescriptor::new(BASE, Method::Delete, "/pet/{petId}"),
            "petId",
        )
    }

    /// Pet service stub: create echoes, get answers `get_status`, delete 200.
    fn pet_service(get_status: u16) -> Arc<ScriptedExecutor> {
        Arc::new(ScriptedExecutor::new(move |label, req| match label {
            "POST /pet" => Ok(json_response(200, req.body.clone().unwrap_or_default())),
            "GET /pet/{petId}" if get_status == 200 => {
                let id: i64 = req.path_params["petId"].parse().unwrap();
                Ok(json_response(200, json!({"id": id, "name": "Buddy", "status": "available"})))
            }
            "GET /pet/{petId}" => Ok(text_response(get_status, "Pet not found")),
            _ => Ok(text_response(200, "Pet deleted")),
        }))
    }

    fn runner(executor: Arc<ScriptedExecutor>, sink: Arc<MemorySink>) -> ScenarioRunner {
        ScenarioRunner::new(
            executor,
            Arc::new(SchemaRegistry::builtin()),
            Arc::new(IdAllocator::seeded(IdRange { start: 500, end: 600 }, 7)),
        )
        .with_sink(sink)
    }

    fn get_pet_scenario() -> Scenario {
        Scenario::new("Pet", "Get pet by id", |ctx, fixtures| {
            let pet = fixtures.get("pet")?;
            let resp = ctx.send(&get_pet(), RequestSpec::new().path_param("petId", pet.id()))?;
            if ctx.expect_status(&resp, &[200]) {
                ctx.validate_schema(&resp, "Pet")?;
                ctx.assert_fields("pet fields", pet.document(), resp.json(), &["id", "name"]);
            }
            Ok(())
        })
        .fixture("pet", pet_kind(), |id| json!({"id": id, "name": "Buddy"}))
    }

    #[test]
    fn passing_scenario_walks_full_state_trail() {
        let sink = Arc::new(MemorySink::new());
        let executor = pet_service(200);
        let report = runner(executor.clone(), sink.clone()).run(&get_pet_scenario());

        assert_eq!(report.outcome, Outcome::Passed, "{report:?}");
        assert_eq!(
            report.states,
            vec![
                ScenarioState::Pending,
                ScenarioState::Arranging,
                ScenarioState::Executing,
                ScenarioState::Validating,
                ScenarioState::Reporting,
                ScenarioState::Passed,
            ]
        );
        let kinds: Vec<_> = report.steps.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Prepare,
                StepKind::Send,
                StepKind::Assert,
                StepKind::Validate,
                StepKind::Assert
            ]
        );
        assert_eq!(sink.steps().len(), 5);
        assert_eq!(sink.scenarios().len(), 1);

        let calls = executor.calls();
        let created = &calls[0].1.body.as_ref().unwrap()["id"];
        let (label, deleted) = calls.last().unwrap();
        assert_eq!(label, "DELETE /pet/{petId}");
        assert_eq!(created.to_string(), deleted.path_params["petId"]);
    }

    #[test]
    fn status_finding_fails_without_validating() {
        let report = runner(pet_service(404), Arc::new(MemorySink::new())).run(&get_pet_scenario());

        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, FindingKind::UnexpectedStatus);
        assert!(report.steps.iter().all(|s| s.kind != StepKind::Validate));
        assert_eq!(report.states.last(), Some(&ScenarioState::Failed));
        assert_eq!(report.exchanges[0].status, Some(404));
        assert_eq!(report.exchanges[0].elapsed_ms, 1, "timing measured by the executor");
    }

    #[test]
    fn findings_are_collected_and_body_continues() {
        let scenario = Scenario::new("Pet", "Two mismatches", |ctx, _| {
            let resp = ctx.send(&get_pet(), RequestSpec::new().path_param("petId", 1))?;
            ctx.assert_fields("first", &json!({"name": "Max"}), resp.json(), &["name"]);
            ctx.check("second", |r| {
                r.check_value("status", "sold", resp.json().and_then(|d| d.get("status")));
            });
            Ok(())
        });
        let report = runner(pet_service(200), Arc::new(MemorySink::new())).run(&scenario);

        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.findings.len(), 2);
        assert!(report.findings.iter().all(|f| f.kind == FindingKind::AssertionMismatch));
    }

    #[test]
    fn transport_error_is_errored_and_still_tears_down() {
        let executor = Arc::new(ScriptedExecutor::new(|label, req| match label {
            "POST /pet" => Ok(json_response(200, req.body.clone().unwrap_or_default())),
            "GET /pet/{petId}" => Err(HarnessError::Transport("timed out".into())),
            _ => Ok(text_response(200, "Pet deleted")),
        }));
        let report = runner(executor.clone(), Arc::new(MemorySink::new())).run(&get_pet_scenario());

        assert_eq!(report.outcome, Outcome::Errored);
        assert_eq!(report.error.as_deref(), Some("Transport error: timed out"));
        assert_eq!(
            report.states,
            vec![
                ScenarioState::Pending,
                ScenarioState::Arranging,
                ScenarioState::Executing,
                ScenarioState::Errored,
            ]
        );
        assert_eq!(report.exchanges[0].status, None);
        assert_eq!(executor.calls().last().unwrap().0, "DELETE /pet/{petId}");
    }

    #[test]
    fn fixture_failure_never_reaches_body() {
        let executor = Arc::new(ScriptedExecutor::new(|_, _| Ok(text_response(503, "busy"))));
        let scenario = Scenario::new("Pet", "Needs a pet", |_, _| panic!("body must not run"))
            .fixture("pet", pet_kind(), |id| json!({"id": id}));
        let report = runner(executor.clone(), Arc::new(MemorySink::new())).run(&scenario);

        assert_eq!(report.outcome, Outcome::Errored);
        assert!(report.error.unwrap().contains("Fixture creation failed for pet"));
        assert_eq!(report.steps[0].kind, StepKind::Prepare);
        assert_eq!(report.steps[0].status, StepStatus::Errored);
        let labels: Vec<_> = executor.calls().into_iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["POST /pet", "DELETE /pet/{petId}"]);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn fixture_accepted_without_json_is_removed() {
        let executor = Arc::new(ScriptedExecutor::new(|label, _| match label {
            "POST /pet" => Ok(text_response(200, "OK")),
            _ => Ok(text_response(200, "Pet deleted")),
        }));
        let scenario = Scenario::new("Pet", "Needs a pet", |_, _| panic!("body must not run"))
            .fixture("pet", pet_kind(), |id| json!({"id": id}));
        let report = runner(executor.clone(), Arc::new(MemorySink::new())).run(&scenario);

        assert_eq!(report.outcome, Outcome::Errored);
        assert!(report.error.unwrap().contains("not JSON"));
        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        let sent = calls[0].1.body.as_ref().unwrap()["id"].to_string();
        assert_eq!(calls[1].0, "DELETE /pet/{petId}");
        assert_eq!(calls[1].1.path_params["petId"], sent);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn failed_fixture_with_fixed_id_is_removed_by_that_id() {
        let executor = Arc::new(ScriptedExecutor::new(|label, _| match label {
            "POST /pet" => Err(HarnessError::Transport("read timed out".into())),
            _ => Ok(text_response(200, "Pet deleted")),
        }));
        let scenario = Scenario::new("Pet", "Fixed id", |_, _| Ok(()))
            .fixture("pet", pet_kind(), |_| json!({"id": 1}));
        let report = runner(executor.clone(), Arc::new(MemorySink::new())).run(&scenario);

        assert_eq!(report.outcome, Outcome::Errored);
        let calls = executor.calls();
        assert_eq!(calls.last().unwrap().0, "DELETE /pet/{petId}");
        assert_eq!(calls.last().unwrap().1.path_params["petId"], "1");
    }

    #[test]
    fn panicking_body_is_errored_and_tears_down() {
        let executor = pet_service(200);
        let scenario = Scenario::new("Pet", "Explodes", |_, _| panic!("kaboom"))
            .fixture("pet", pet_kind(), |id| json!({"id": id}));
        let report = runner(executor.clone(), Arc::new(MemorySink::new())).run(&scenario);

        assert_eq!(report.outcome, Outcome::Errored);
        assert_eq!(report.error.as_deref(), Some("scenario panicked: kaboom"));
        assert_eq!(executor.calls().last().unwrap().0, "DELETE /pet/{petId}");
    }

    #[test]
    fn failure_returned_from_body_is_a_finding() {
        let scenario = Scenario::new("Pet", "Early return", |ctx, _| {
            let resp = ctx.send(&get_pet(), RequestSpec::new().path_param("petId", 1))?;
            resp.expect_status(&[201])?;
            Ok(())
        });
        let report = runner(pet_service(200), Arc::new(MemorySink::new())).run(&scenario);

        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.findings[0].step, "body");
        assert!(report.error.is_none());
    }

    #[test]
    fn non_json_body_is_schema_violation() {
        let scenario = Scenario::new("Pet", "Plaintext", |ctx, _| {
            let resp = ctx.send(&get_pet(), RequestSpec::new().path_param("petId", 1))?;
            ctx.validate_schema(&resp, "Pet")?;
            Ok(())
        });
        let report = runner(pet_service(404), Arc::new(MemorySink::new())).run(&scenario);

        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.findings[0].kind, FindingKind::SchemaValidation);
        assert_eq!(report.findings[0].details, vec!["$: expected object, got non-JSON body"]);
    }

    #[test]
    fn unknown_schema_is_errored() {
        let scenario = Scenario::new("Pet", "Bad schema name", |ctx, _| {
            let resp = ctx.send(&get_pet(), RequestSpec::new().path_param("petId", 1))?;
            ctx.validate_schema(&resp, "Dragon")?;
            Ok(())
        });
        let report = runner(pet_service(200), Arc::new(MemorySink::new())).run(&scenario);

        assert_eq!(report.outcome, Outcome::Errored);
        assert_eq!(report.error.as_deref(), Some("Unknown schema: Dragon"));
    }

    #[test]
    fn adopted_resource_deleted_after_body() {
        let executor = pet_service(200);
        let scenario = Scenario::new("Pet", "Creates its own pet", |ctx, _| {
            let id = ctx.ids().next_id()?;
            ctx.adopt(&pet_kind(), id);
            ctx.send(
                &EndpointDescriptor::new(BASE, Method::Post, "/pet"),
                RequestSpec::new().with_body(json!({"id": id, "name": "Buddy"})),
            )?;
            Ok(())
        });
        let report = runner(executor.clone(), Arc::new(MemorySink::new())).run(&scenario);

        assert_eq!(report.outcome, Outcome::Passed);
        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "DELETE /pet/{petId}");
    }

    #[test]
    fn teardown_warning_does_not_change_outcome() {
        let executor = Arc::new(ScriptedExecutor::new(|label, req| match label {
            "POST /pet" => Ok(json_response(200, req.body.clone().unwrap_or_default())),
            "GET /pet/{petId}" => {
                let id: i64 = req.path_params["petId"].parse().unwrap();
                Ok(json_response(200, json!({"id": id, "name": "Buddy"})))
            }
            _ => Ok(text_response(500, "db down")),
        }));
        let report = runner(executor, Arc::new(MemorySink::new())).run(&get_pet_scenario());

        assert_eq!(report.outcome, Outcome::Passed);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("status 500"));
    }

    #[test]
    fn display_url_appends_query() {
        let endpoint = EndpointDescriptor::new(BASE, Method::Get, "/pet/findByStatus");
        let request = RequestSpec::new().query("status", "sold");
        assert_eq!(
            display_url(&endpoint, &request),
            "http://petstore/api/v3/pet/findByStatus?status=sold"
        );
    }
}
