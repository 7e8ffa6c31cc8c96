use serde::{Deserialize, Serialize};

use super::domain::{RatingStep, StepId, StepKind};

/// Advisory severity: validation never blocks evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One static finding over a step list, independent of any scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<StepId>,
}

pub const EMPTY_ALGORITHM: &str = "EMPTY_ALGORITHM";
pub const MISSING_NAME: &str = "MISSING_NAME";
pub const MISSING_VALUE: &str = "MISSING_VALUE";
pub const INVALID_CAPS: &str = "INVALID_CAPS";

/// Pre-flight analysis of a step sequence: pure, context-free, and advisory.
/// Suitable as a publish gate for authoring tools; it never mutates the steps
/// or prevents an evaluation from running.
pub fn validate(steps: &[RatingStep]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let factor_count = steps
        .iter()
        .filter(|step| matches!(step.kind, StepKind::Factor(_)))
        .count();
    if factor_count == 0 {
        issues.push(ValidationIssue {
            severity: Severity::Warning,
            code: EMPTY_ALGORITHM,
            message: "rating program has no factor steps".to_string(),
            step_id: None,
        });
    }

    for step in steps {
        let StepKind::Factor(factor) = &step.kind else {
            continue;
        };

        if factor.name.trim().is_empty() {
            issues.push(ValidationIssue {
                severity: Severity::Error,
                code: MISSING_NAME,
                message: "factor step has a blank name".to_string(),
                step_id: Some(step.id.clone()),
            });
        }

        if factor.raw_value.is_none() && factor.table_ref.is_none() && factor.expression.is_none() {
            issues.push(ValidationIssue {
                severity: Severity::Warning,
                code: MISSING_VALUE,
                message: format!(
                    "factor step '{}' has no raw value, table reference, or expression",
                    factor.name
                ),
                step_id: Some(step.id.clone()),
            });
        }

        if let (Some(min), Some(max)) = (factor.min_cap, factor.max_cap) {
            if min > max {
                issues.push(ValidationIssue {
                    severity: Severity::Error,
                    code: INVALID_CAPS,
                    message: format!(
                        "factor step '{}' has min cap {min} above max cap {max}",
                        factor.name
                    ),
                    step_id: Some(step.id.clone()),
                });
            }
        }
    }

    issues
}
