//! Error taxonomy shared by the executor, fixtures and scenario runner

use crate::assertion::FieldCheck;
use crate::schema::{SchemaError, Violation};

/// Everything that can go wrong while running a scenario.
///
/// The first three variants are *findings*: the service answered, but not
/// the way the scenario expected. The rest mean the scenario could not be
/// carried out at all.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Network-level failure: timeout, refused connection, DNS, broken body.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status {actual} (expected one of {expected:?})")]
    UnexpectedStatus {
        expected: Vec<u16>,
        actual: u16,
        body: String,
    },

    #[error("Schema validation failed for {schema}: {} violation(s)", .violations.len())]
    SchemaValidation {
        schema: String,
        violations: Vec<Violation>,
    },

    #[error("{} field assertion(s) failed", .0.len())]
    AssertionMismatch(Vec<FieldCheck>),

    #[error("Fixture creation failed for {kind}: {reason}")]
    FixtureCreation { kind: String, reason: String },

    /// The request could not be built (missing path parameter, bad body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl HarnessError {
    /// Findings mark a scenario Failed; anything else marks it Errored.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedStatus { .. } | Self::SchemaValidation { .. } | Self::AssertionMismatch(_)
        )
    }
}
