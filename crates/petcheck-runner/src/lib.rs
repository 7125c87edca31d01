//! petcheck-runner: scenario execution against a live Pet Store service
//!
//! The [`executor`] sends requests, [`fixture`] provisions and tears down
//! remote resources, [`runner`] drives one scenario through its lifecycle
//! and [`suite`] orders and parallelizes a whole catalogue. The built-in
//! Pet Store catalogue lives in [`petstore`].

pub mod executor;
pub mod fixture;
pub mod petstore;
pub mod runner;
pub mod scenario;
pub mod suite;

#[cfg(test)]
mod testing;

pub use executor::{HttpExecutor, RequestExecutor};
pub use fixture::{FixtureGuard, FixtureProvider, IdAllocator, ResourceKind};
pub use petstore::PetStoreApi;
pub use runner::{ScenarioContext, ScenarioRunner};
pub use scenario::{Fixtures, Scenario, table};
pub use suite::Suite;

use petcheck_core::SchemaError;

/// Errors raised while wiring up a run, before any scenario starts.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Invalid header {0}: {1}")]
    Header(String, String),

    #[error("Cannot build HTTP client: {0}")]
    Client(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
