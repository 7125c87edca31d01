//! Declarative scenario definitions

use std::sync::Arc;

use petcheck_core::HarnessError;
use petcheck_core::plan::ScenarioListing;
use serde_json::Value;

use crate::fixture::{FixtureGuard, ResourceKind};
use crate::runner::ScenarioContext;

/// Scenario body: drives requests through the context.
pub type ScenarioBody =
    dyn Fn(&mut ScenarioContext<'_>, &Fixtures) -> Result<(), HarnessError> + Send + Sync;

/// Builds a fixture payload from a freshly allocated identifier.
pub type PayloadFn = dyn Fn(i64) -> Value + Send + Sync;

pub(crate) struct FixtureDecl {
    pub(crate) alias: String,
    pub(crate) kind: ResourceKind,
    pub(crate) payload: Arc<PayloadFn>,
}

/// One independently reported test case.
pub struct Scenario {
    feature: String,
    title: String,
    serial: bool,
    pub(crate) fixtures: Vec<FixtureDecl>,
    pub(crate) body: Arc<ScenarioBody>,
}

impl Scenario {
    pub fn new<F>(feature: impl Into<String>, title: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut ScenarioContext<'_>, &Fixtures) -> Result<(), HarnessError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            feature: feature.into(),
            title: title.into(),
            serial: false,
            fixtures: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Run alone, after the parallel batch (shared well-known ids).
    #[must_use]
    pub fn serial(mut self) -> Self {
        self.serial = true;
        self
    }

    /// Declare a fixture created before the body and deleted after it.
    #[must_use]
    pub fn fixture<P>(mut self, alias: impl Into<String>, kind: ResourceKind, payload: P) -> Self
    where
        P: Fn(i64) -> Value + Send + Sync + 'static,
    {
        self.fixtures.push(FixtureDecl {
            alias: alias.into(),
            kind,
            payload: Arc::new(payload),
        });
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn feature(&self) -> &str {
        &self.feature
    }

    #[must_use]
    pub const fn is_serial(&self) -> bool {
        self.serial
    }

    #[must_use]
    pub fn listing(&self) -> ScenarioListing {
        ScenarioListing {
            feature: self.feature.clone(),
            title: self.title.clone(),
            serial: self.serial,
            fixtures: self
                .fixtures
                .iter()
                .map(|f| format!("{} ({})", f.alias, f.kind.name))
                .collect(),
        }
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("feature", &self.feature)
            .field("title", &self.title)
            .field("serial", &self.serial)
            .field("fixtures", &self.fixtures.len())
            .finish_non_exhaustive()
    }
}

/// Expand a data table into one scenario per row, titled `"title [label]"`.
pub fn table<R, L, I, F>(feature: &str, title: &str, rows: I, body: F) -> Vec<Scenario>
where
    I: IntoIterator<Item = (L, R)>,
    L: std::fmt::Display,
    R: Send + Sync + 'static,
    F: Fn(&mut ScenarioContext<'_>, &Fixtures, &R) -> Result<(), HarnessError>
        + Send
        + Sync
        + 'static,
{
    let body = Arc::new(body);
    rows.into_iter()
        .map(|(label, row)| {
            let body = Arc::clone(&body);
            Scenario::new(feature, format!("{title} [{label}]"), move |ctx, fixtures| {
                (*body)(ctx, fixtures, &row)
            })
        })
        .collect()
}

/// Fixtures provisioned for one scenario run, by alias.
///
/// Dropped in reverse creation order, each guard deleting its resource.
#[derive(Debug, Default)]
pub struct Fixtures {
    guards: Vec<(String, FixtureGuard)>,
}

impl Fixtures {
    pub(crate) fn push(&mut self, alias: String, guard: FixtureGuard) {
        self.guards.push((alias, guard));
    }

    /// # Errors
    ///
    /// Returns `InvalidRequest` if no fixture was declared under `alias`.
    pub fn get(&self, alias: &str) -> Result<&FixtureGuard, HarnessError> {
        self.guards
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, g)| g)
            .ok_or_else(|| HarnessError::InvalidRequest(format!("no fixture named '{alias}'")))
    }

    /// # Errors
    ///
    /// See [`Fixtures::get`].
    pub fn id(&self, alias: &str) -> Result<i64, HarnessError> {
        self.get(alias).map(FixtureGuard::id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl Drop for Fixtures {
    fn drop(&mut self) {
        while let Some((_, guard)) = self.guards.pop() {
            drop(guard);
        }
    }
}
