use std::collections::BTreeMap;

use super::domain::{Condition, ConditionOperator, ConditionValue, FieldValue};

/// Evaluate a step's applicability conditions against the scenario inputs.
///
/// An empty list is satisfied. All conditions are ANDed. A condition whose
/// referenced field is absent from `inputs` evaluates to false: unknown input
/// must never silently satisfy a coverage condition.
pub fn conditions_met(conditions: &[Condition], inputs: &BTreeMap<String, FieldValue>) -> bool {
    conditions
        .iter()
        .all(|condition| condition_met(condition, inputs))
}

fn condition_met(condition: &Condition, inputs: &BTreeMap<String, FieldValue>) -> bool {
    let Some(actual) = inputs.get(&condition.field) else {
        return false;
    };

    match (condition.operator, &condition.value) {
        (ConditionOperator::Equals, ConditionValue::Scalar(expected)) => {
            values_equal(actual, expected)
        }
        (ConditionOperator::GreaterThan, ConditionValue::Scalar(expected)) => {
            match (actual.as_number(), expected.as_number()) {
                (Some(lhs), Some(rhs)) => lhs > rhs,
                _ => false,
            }
        }
        (ConditionOperator::LessThan, ConditionValue::Scalar(expected)) => {
            match (actual.as_number(), expected.as_number()) {
                (Some(lhs), Some(rhs)) => lhs < rhs,
                _ => false,
            }
        }
        (ConditionOperator::Contains, ConditionValue::Scalar(expected)) => {
            match (actual, expected) {
                (FieldValue::Text(haystack), FieldValue::Text(needle)) => {
                    haystack.contains(needle.as_str())
                }
                _ => false,
            }
        }
        (ConditionOperator::Between, ConditionValue::Range(low, high)) => actual
            .as_number()
            .map(|value| value >= *low && value <= *high)
            .unwrap_or(false),
        // Operator/value shape mismatch is a misconfigured condition; stay
        // fail-closed rather than guessing intent.
        _ => false,
    }
}

fn values_equal(actual: &FieldValue, expected: &FieldValue) -> bool {
    match (actual, expected) {
        (FieldValue::Number(lhs), FieldValue::Number(rhs)) => lhs == rhs,
        (FieldValue::Text(lhs), FieldValue::Text(rhs)) => lhs == rhs,
        (FieldValue::Bool(lhs), FieldValue::Bool(rhs)) => lhs == rhs,
        _ => false,
    }
}
