//! Deterministic rating calculation engine.
//!
//! Turns an ordered sequence of configurable rating steps plus a scenario's
//! input values into a premium and a step-by-step execution trace suitable
//! for regulatory filing. Evaluation is a pure function of its inputs: the
//! same steps and scenario always yield the same premium and the same result
//! hash, with no I/O and no shared mutable state.

pub mod aggregator;
pub mod cache;
pub(crate) mod conditions;
pub mod domain;
pub mod expression;
pub mod fingerprint;
pub mod resolver;
pub(crate) mod rounding;
pub(crate) mod scope;
pub mod validation;

mod executor;

#[cfg(test)]
mod tests;

pub use aggregator::{
    rate_package, CoverageOutcome, CoverageProgram, PackageRatingError, PackageRequest,
    PackageResult,
};
pub use cache::ResultCache;
pub use domain::{
    Condition, ConditionOperator, ConditionValue, EvaluationContext, EvaluationResult, FactorStep,
    FieldValue, Operator, RatingProgram, RatingStep, RatingTable, RoundingMode, StepId, StepKind,
    StepScope, StepTraceEntry, TableRow, ValueType,
};
pub use executor::{evaluate, evaluate_coverage, StructuralError};
pub use fingerprint::{audit_document, result_hash, scenario_fingerprint};
pub use resolver::ResolutionError;
pub use validation::{validate, Severity, ValidationIssue};
