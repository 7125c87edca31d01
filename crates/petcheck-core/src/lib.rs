//! petcheck-core: Core types for HTTP contract testing
//!
//! This crate holds everything that does not touch the network: endpoint and
//! response descriptors, schema definitions and the structural validator, the
//! field assertion engine, the error taxonomy, and the report model that the
//! runner emits and the CLI renders.

pub mod assertion;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod plan;
pub mod report;
pub mod schema;

pub use assertion::{AssertionResult, CheckOutcome, FieldCheck, compare_fields, lookup};
pub use config::{Config, ConfigError, IdRange, MISSING_ID, RESERVED_IDS, WELL_KNOWN_ORDER_ID};
pub use endpoint::{EndpointDescriptor, Method, RequestSpec};
pub use envelope::ResponseEnvelope;
pub use error::HarnessError;
pub use plan::{Validation, ValidationStatus, validate_config};
pub use report::{
    Exchange, Finding, FindingKind, Outcome, ReportSink, ScenarioReport, ScenarioState,
    StepEvent, StepKind, StepStatus, SuiteReport, Verdict,
};
pub use schema::{
    FieldSchema, FieldType, SchemaDefinition, SchemaError, SchemaRegistry, ValidationResult,
    Violation, ViolationReason,
};
