//! Suite Orchestrator: ordered scenario collection and its run
//!
//! Scenarios that share nothing run on a bounded rayon pool. Scenarios
//! marked serial (well-known identifiers) run one at a time afterwards.
//! Reports always come back in declaration order.

use std::time::Instant;

use petcheck_core::plan::SuitePlan;
use petcheck_core::{Config, ScenarioReport, SuiteReport, validate_config};
use rayon::prelude::*;

use crate::runner::ScenarioRunner;
use crate::scenario::Scenario;

#[derive(Debug, Default)]
pub struct Suite {
    scenarios: Vec<Scenario>,
}

impl Suite {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    #[must_use]
    pub fn extend(mut self, scenarios: impl IntoIterator<Item = Scenario>) -> Self {
        self.scenarios.extend(scenarios);
        self
    }

    /// Keep scenarios whose feature equals `feature` and whose title
    /// contains `title` (both case-insensitive).
    #[must_use]
    pub fn filter(mut self, feature: Option<&str>, title: Option<&str>) -> Self {
        let title = title.map(str::to_lowercase);
        self.scenarios.retain(|s| {
            feature.is_none_or(|f| s.feature().eq_ignore_ascii_case(f))
                && title
                    .as_deref()
                    .is_none_or(|t| s.title().to_lowercase().contains(t))
        });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// What `run` would do with `config`, without sending anything.
    #[must_use]
    pub fn plan(&self, config: &Config) -> SuitePlan {
        SuitePlan {
            scenarios: self.scenarios.iter().map(Scenario::listing).collect(),
            validations: validate_config(config),
        }
    }

    /// Run every scenario, at most `parallelism` at a time.
    #[must_use]
    pub fn run(&self, runner: &ScenarioRunner, parallelism: usize) -> SuiteReport {
        let started = Instant::now();
        let (serial, parallel): (Vec<_>, Vec<_>) = self
            .scenarios
            .iter()
            .enumerate()
            .partition(|(_, s)| s.is_serial());

        tracing::info!(
            scenarios = self.scenarios.len(),
            serial = serial.len(),
            parallelism,
            "running suite"
        );

        let mut reports: Vec<(usize, ScenarioReport)> = if parallelism > 1 && parallel.len() > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(parallelism)
                .thread_name(|i| format!("petcheck-{i}"))
                .build()
            {
                Ok(pool) => pool.install(|| {
                    parallel
                        .par_iter()
                        .map(|(i, s)| (*i, runner.run(s)))
                        .collect()
                }),
                Err(e) => {
                    tracing::warn!("thread pool unavailable, running sequentially: {e}");
                    parallel.iter().map(|(i, s)| (*i, runner.run(s))).collect()
                }
            }
        } else {
            parallel.iter().map(|(i, s)| (*i, runner.run(s))).collect()
        };
        reports.extend(serial.iter().map(|(i, s)| (*i, runner.run(s))));
        reports.sort_by_key(|(i, _)| *i);

        SuiteReport {
            scenarios: reports.into_iter().map(|(_, r)| r).collect(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}
