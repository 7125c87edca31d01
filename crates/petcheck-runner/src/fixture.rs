//! Fixture Provider: scoped remote resources with guaranteed teardown
//!
//! A [`FixtureGuard`] owns one resource created on the service. Dropping the
//! guard deletes it with the same identifier the service assigned, on every
//! exit path including failed assertions, errors and panics.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use petcheck_core::{EndpointDescriptor, HarnessError, IdRange, RequestSpec};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::executor::RequestExecutor;

/// How to create and delete one kind of resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    pub name: String,
    /// Takes the payload as JSON body, answers with the created document
    pub create: EndpointDescriptor,
    /// Path template containing `{id_param}`
    pub delete: EndpointDescriptor,
    pub id_param: String,
}

impl ResourceKind {
    pub fn new(
        name: impl Into<String>,
        create: EndpointDescriptor,
        delete: EndpointDescriptor,
        id_param: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            create,
            delete,
            id_param: id_param.into(),
        }
    }
}

type Warnings = Arc<Mutex<Vec<String>>>;

/// Creates fixtures for one scenario run and collects teardown warnings.
pub struct FixtureProvider {
    executor: Arc<dyn RequestExecutor>,
    warnings: Warnings,
}

impl FixtureProvider {
    #[must_use]
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        Self {
            executor,
            warnings: Arc::default(),
        }
    }

    /// Create a resource whose payload carries `id`; one attempt, no retry.
    ///
    /// The guard for `id` exists before the create is sent, so a failed
    /// creation still issues the DELETE.
    ///
    /// # Errors
    ///
    /// Returns `FixtureCreation` on transport failure, a non-2xx answer, a
    /// non-JSON body, or a body without an integer `id`.
    pub fn provision(
        &self,
        kind: &ResourceKind,
        id: i64,
        payload: Value,
    ) -> Result<FixtureGuard, HarnessError> {
        let creation_error = |reason: String| HarnessError::FixtureCreation {
            kind: kind.name.clone(),
            reason,
        };
        let mut guard = self.adopt(kind, id);

        let response = self
            .executor
            .execute(&kind.create, RequestSpec::new().with_body(payload))
            .map_err(|e| creation_error(e.to_string()))?;

        if !response.is_success() {
            return Err(creation_error(format!(
                "{} answered {}: {}",
                kind.create.label(),
                response.status(),
                response.text()
            )));
        }
        let document = response
            .json()
            .cloned()
            .ok_or_else(|| creation_error("response body is not JSON".into()))?;
        let assigned = document
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| creation_error("response has no integer id".into()))?;

        if assigned != id {
            tracing::debug!(kind = %kind.name, requested = id, assigned, "service assigned another id");
        }
        tracing::debug!(kind = %kind.name, id = assigned, "fixture created");
        guard.id = assigned;
        guard.document = document;
        Ok(guard)
    }

    /// Take ownership of a resource the scenario creates itself.
    ///
    /// Teardown treats a 404 as "never created" or "already removed".
    #[must_use]
    pub fn adopt(&self, kind: &ResourceKind, id: i64) -> FixtureGuard {
        self.guard(kind, id, Value::Null)
    }

    fn guard(&self, kind: &ResourceKind, id: i64, document: Value) -> FixtureGuard {
        FixtureGuard {
            kind: kind.clone(),
            id,
            document,
            executor: Arc::clone(&self.executor),
            warnings: Arc::clone(&self.warnings),
        }
    }

    /// Drain the teardown warnings collected so far.
    #[must_use]
    pub fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.warnings.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Scoped handle to one remote resource.
pub struct FixtureGuard {
    kind: ResourceKind,
    id: i64,
    document: Value,
    executor: Arc<dyn RequestExecutor>,
    warnings: Warnings,
}

impl FixtureGuard {
    /// Identifier assigned by the service; also used for teardown.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn id_value(&self) -> Value {
        Value::from(self.id)
    }

    /// Document returned by the create call (`null` for adopted resources).
    #[must_use]
    pub const fn document(&self) -> &Value {
        &self.document
    }

    fn warn(&self, message: String) {
        tracing::warn!(kind = %self.kind.name, id = self.id, "{message}");
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

impl std::fmt::Debug for FixtureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureGuard")
            .field("kind", &self.kind.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Drop for FixtureGuard {
    fn drop(&mut self) {
        let request = RequestSpec::new().path_param(self.kind.id_param.as_str(), self.id);
        match self.executor.execute(&self.kind.delete, request) {
            Ok(resp) if resp.is_success() => {
                tracing::debug!(kind = %self.kind.name, id = self.id, "fixture removed");
            }
            Ok(resp) if resp.status() == 404 => {
                tracing::debug!(kind = %self.kind.name, id = self.id, "fixture already removed");
            }
            Ok(resp) => self.warn(format!(
                "teardown of {} {} failed: status {}",
                self.kind.name,
                self.id,
                resp.status()
            )),
            Err(e) => self.warn(format!(
                "teardown of {} {} failed: {e}",
                self.kind.name, self.id
            )),
        }
    }
}

/// Hands out unique identifiers from a configured range.
///
/// Shared by all scenarios of a run so parallel fixtures never collide.
#[derive(Debug)]
pub struct IdAllocator {
    range: IdRange,
    state: Mutex<AllocatorState>,
}

#[derive(Debug)]
struct AllocatorState {
    rng: SmallRng,
    issued: HashSet<i64>,
}

/// Random draws before falling back to a linear scan.
const RANDOM_ATTEMPTS: usize = 64;

impl IdAllocator {
    #[must_use]
    pub fn new(range: IdRange) -> Self {
        Self::with_rng(range, SmallRng::from_entropy())
    }

    /// Deterministic allocator for tests.
    #[must_use]
    pub fn seeded(range: IdRange, seed: u64) -> Self {
        Self::with_rng(range, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(range: IdRange, rng: SmallRng) -> Self {
        Self {
            range,
            state: Mutex::new(AllocatorState {
                rng,
                issued: HashSet::new(),
            }),
        }
    }

    #[must_use]
    pub const fn range(&self) -> IdRange {
        self.range
    }

    /// Next identifier never handed out before by this allocator.
    ///
    /// # Errors
    ///
    /// Returns `FixtureCreation` once the range is exhausted.
    pub fn next_id(&self) -> Result<i64, HarnessError> {
        let exhausted = || HarnessError::FixtureCreation {
            kind: "id".into(),
            reason: format!(
                "identifier range [{}, {}) exhausted",
                self.range.start, self.range.end
            ),
        };
        if self.range.is_empty() {
            return Err(exhausted());
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for _ in 0..RANDOM_ATTEMPTS {
            let candidate = state.rng.gen_range(self.range.start..self.range.end);
            if state.issued.insert(candidate) {
                return Ok(candidate);
            }
        }
        let free = (self.range.start..self.range.end).find(|id| !state.issued.contains(id));
        let id = free.ok_or_else(exhausted)?;
        state.issued.insert(id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedExecutor, json_response, text_response};
    use petcheck_core::Method;
    use proptest::prelude::*;
    use serde_json::json;

    fn pet_kind() -> ResourceKind {
        ResourceKind::new(
            "pet",
            EndpointDescriptor::new("http://petstore", Method::Post, "/pet"),
            EndpointDescriptor::new("http://petstore", Method::Delete, "/pet/{petId}"),
            "petId",
        )
    }

    #[test]
    fn provision_then_drop_deletes_same_id() {
        let executor = Arc::new(ScriptedExecutor::new(|label, req| match label {
            "POST /pet" => Ok(json_response(200, req.body.clone().unwrap())),
            "DELETE /pet/{petId}" => Ok(text_response(200, "Pet deleted")),
            other => panic!("unexpected call {other}"),
        }));
        let provider = FixtureProvider::new(executor.clone());

        let guard = provider
            .provision(&pet_kind(), 4242, json!({"id": 4242, "name": "Buddy"}))
            .unwrap();
        assert_eq!(guard.id(), 4242);
        assert_eq!(guard.document()["name"], "Buddy");
        drop(guard);

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "DELETE /pet/{petId}");
        assert_eq!(calls[1].1.path_params["petId"], "4242");
        assert!(provider.take_warnings().is_empty());
    }

    #[test]
    fn non_success_create_is_fixture_error() {
        let executor = Arc::new(ScriptedExecutor::new(|label, _| match label {
            "POST /pet" => Ok(text_response(500, "boom")),
            _ => Ok(text_response(404, "Pet not found")),
        }));
        let provider = FixtureProvider::new(executor.clone());
        let err = provider.provision(&pet_kind(), 5, json!({"id": 5})).unwrap_err();

        assert!(matches!(err, HarnessError::FixtureCreation { ref kind, .. } if kind == "pet"));
        assert!(err.to_string().contains("answered 500"));
        let labels: Vec<_> = executor.calls().into_iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["POST /pet", "DELETE /pet/{petId}"], "no retry");
        assert!(provider.take_warnings().is_empty());
    }

    #[test]
    fn create_without_id_is_fixture_error() {
        let executor = Arc::new(ScriptedExecutor::new(|label, _| match label {
            "POST /pet" => Ok(json_response(200, json!({"name": "Buddy"}))),
            _ => Ok(text_response(200, "Pet deleted")),
        }));
        let provider = FixtureProvider::new(executor);
        let err = provider.provision(&pet_kind(), 6, json!({"id": 6})).unwrap_err();
        assert!(err.to_string().contains("no integer id"));
    }

    #[test]
    fn create_transport_failure_is_fixture_error() {
        let executor = Arc::new(ScriptedExecutor::new(|_, _| {
            Err(HarnessError::Transport("connection refused".into()))
        }));
        let provider = FixtureProvider::new(executor);
        let err = provider.provision(&pet_kind(), 7, json!({"id": 7})).unwrap_err();
        assert!(matches!(err, HarnessError::FixtureCreation { .. }));
        assert_eq!(
            provider.take_warnings(),
            vec!["teardown of pet 7 failed: Transport error: connection refused".to_string()]
        );
    }

    #[test]
    fn accepted_create_with_unreadable_body_is_still_removed() {
        let executor = Arc::new(ScriptedExecutor::new(|label, _| match label {
            "POST /pet" => Ok(text_response(200, "OK")),
            _ => Ok(text_response(200, "Pet deleted")),
        }));
        let provider = FixtureProvider::new(executor.clone());
        let err = provider.provision(&pet_kind(), 4243, json!({"id": 4243})).unwrap_err();
        assert!(err.to_string().contains("not JSON"));

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "DELETE /pet/{petId}");
        assert_eq!(calls[1].1.path_params["petId"], "4243");
        assert!(provider.take_warnings().is_empty());
    }

    #[test]
    fn teardown_uses_the_id_the_service_assigned() {
        let executor = Arc::new(ScriptedExecutor::new(|label, _| match label {
            "POST /pet" => Ok(json_response(200, json!({"id": 77, "name": "Buddy"}))),
            _ => Ok(text_response(200, "Pet deleted")),
        }));
        let provider = FixtureProvider::new(executor.clone());
        let guard = provider.provision(&pet_kind(), 12, json!({"id": 12})).unwrap();
        assert_eq!(guard.id(), 77);
        drop(guard);
        assert_eq!(executor.calls()[1].1.path_params["petId"], "77");
    }

    #[test]
    fn teardown_404_is_silent() {
        let executor = Arc::new(ScriptedExecutor::new(|_, _| {
            Ok(text_response(404, "Pet not found"))
        }));
        let provider = FixtureProvider::new(executor);
        drop(provider.adopt(&pet_kind(), 7));
        assert!(provider.take_warnings().is_empty());
    }

    #[test]
    fn teardown_failure_becomes_warning() {
        let executor = Arc::new(ScriptedExecutor::new(|label, req| match label {
            "POST /pet" => Ok(json_response(200, req.body.clone().unwrap())),
            _ => Ok(text_response(500, "db down")),
        }));
        let provider = FixtureProvider::new(executor);
        let guard = provider.provision(&pet_kind(), 9, json!({"id": 9})).unwrap();
        drop(guard);

        let warnings = provider.take_warnings();
        assert_eq!(warnings, vec!["teardown of pet 9 failed: status 500".to_string()]);
        assert!(provider.take_warnings().is_empty());
    }

    #[test]
    fn teardown_runs_during_panic() {
        let executor = Arc::new(ScriptedExecutor::new(|label, req| match label {
            "POST /pet" => Ok(json_response(200, req.body.clone().unwrap())),
            _ => Ok(text_response(200, "Pet deleted")),
        }));
        let provider = FixtureProvider::new(executor.clone());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = provider.provision(&pet_kind(), 11, json!({"id": 11})).unwrap();
            panic!("scenario body blew up");
        }));
        assert!(result.is_err());
        assert_eq!(executor.calls().last().unwrap().0, "DELETE /pet/{petId}");
    }

    #[test]
    fn allocator_exhausts_small_range() {
        let ids = IdAllocator::seeded(IdRange { start: 10, end: 13 }, 1);
        let mut got: Vec<i64> = (0..3).map(|_| ids.next_id().unwrap()).collect();
        got.sort_unstable();
        assert_eq!(got, vec![10, 11, 12]);
        assert!(matches!(ids.next_id(), Err(HarnessError::FixtureCreation { .. })));
    }

    #[test]
    fn allocator_rejects_empty_range() {
        let ids = IdAllocator::new(IdRange { start: 5, end: 5 });
        assert!(ids.next_id().is_err());
    }

    proptest! {
        #[test]
        fn allocated_ids_are_unique_and_in_range(seed in any::<u64>(), count in 1usize..200) {
            let range = IdRange { start: 1_000, end: 1_200 };
            let ids = IdAllocator::seeded(range, seed);
            let mut seen = HashSet::new();
            for _ in 0..count {
                let id = ids.next_id().unwrap();
                prop_assert!(range.contains(id));
                prop_assert!(seen.insert(id));
            }
        }
    }
}
