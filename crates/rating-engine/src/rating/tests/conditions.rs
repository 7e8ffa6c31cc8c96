use std::collections::BTreeMap;

use crate::rating::conditions::conditions_met;
use crate::rating::domain::{Condition, ConditionOperator, ConditionValue, FieldValue};

fn inputs(pairs: &[(&str, FieldValue)]) -> BTreeMap<String, FieldValue> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn condition(field: &str, operator: ConditionOperator, value: ConditionValue) -> Condition {
    Condition {
        field: field.to_string(),
        operator,
        value,
    }
}

#[test]
fn empty_condition_list_is_satisfied() {
    assert!(conditions_met(&[], &inputs(&[])));
}

#[test]
fn equals_matches_each_value_type() {
    let fields = inputs(&[
        ("units", FieldValue::Number(4.0)),
        ("construction", FieldValue::Text("frame".to_string())),
        ("sprinklered", FieldValue::Bool(true)),
    ]);

    assert!(conditions_met(
        &[condition(
            "units",
            ConditionOperator::Equals,
            ConditionValue::Scalar(FieldValue::Number(4.0)),
        )],
        &fields
    ));
    assert!(conditions_met(
        &[condition(
            "construction",
            ConditionOperator::Equals,
            ConditionValue::Scalar(FieldValue::Text("frame".to_string())),
        )],
        &fields
    ));
    assert!(!conditions_met(
        &[condition(
            "sprinklered",
            ConditionOperator::Equals,
            ConditionValue::Scalar(FieldValue::Bool(false)),
        )],
        &fields
    ));
}

#[test]
fn numeric_comparisons() {
    let fields = inputs(&[("year_built", FieldValue::Number(1998.0))]);

    assert!(conditions_met(
        &[condition(
            "year_built",
            ConditionOperator::GreaterThan,
            ConditionValue::Scalar(FieldValue::Number(1990.0)),
        )],
        &fields
    ));
    assert!(conditions_met(
        &[condition(
            "year_built",
            ConditionOperator::LessThan,
            ConditionValue::Scalar(FieldValue::Number(2000.0)),
        )],
        &fields
    ));
    assert!(!conditions_met(
        &[condition(
            "year_built",
            ConditionOperator::GreaterThan,
            ConditionValue::Scalar(FieldValue::Number(1998.0)),
        )],
        &fields
    ));
}

#[test]
fn contains_is_substring_match_on_text() {
    let fields = inputs(&[(
        "occupancy",
        FieldValue::Text("office / retail".to_string()),
    )]);

    assert!(conditions_met(
        &[condition(
            "occupancy",
            ConditionOperator::Contains,
            ConditionValue::Scalar(FieldValue::Text("retail".to_string())),
        )],
        &fields
    ));
    assert!(!conditions_met(
        &[condition(
            "occupancy",
            ConditionOperator::Contains,
            ConditionValue::Scalar(FieldValue::Number(1.0)),
        )],
        &fields
    ));
}

#[test]
fn between_is_inclusive() {
    let fields = inputs(&[("protection_class", FieldValue::Number(5.0))]);
    let between = |low, high| {
        conditions_met(
            &[condition(
                "protection_class",
                ConditionOperator::Between,
                ConditionValue::Range(low, high),
            )],
            &fields,
        )
    };

    assert!(between(1.0, 5.0));
    assert!(between(5.0, 10.0));
    assert!(!between(6.0, 10.0));
}

#[test]
fn missing_field_fails_closed() {
    assert!(!conditions_met(
        &[condition(
            "never_supplied",
            ConditionOperator::Equals,
            ConditionValue::Scalar(FieldValue::Bool(true)),
        )],
        &inputs(&[])
    ));
}

#[test]
fn type_mismatch_fails_closed() {
    let fields = inputs(&[("construction", FieldValue::Text("frame".to_string()))]);
    assert!(!conditions_met(
        &[condition(
            "construction",
            ConditionOperator::GreaterThan,
            ConditionValue::Scalar(FieldValue::Number(3.0)),
        )],
        &fields
    ));
}

#[test]
fn operator_value_shape_mismatch_fails_closed() {
    let fields = inputs(&[("units", FieldValue::Number(4.0))]);
    assert!(!conditions_met(
        &[condition(
            "units",
            ConditionOperator::Between,
            ConditionValue::Scalar(FieldValue::Number(4.0)),
        )],
        &fields
    ));
}

#[test]
fn all_conditions_are_anded() {
    let fields = inputs(&[
        ("units", FieldValue::Number(4.0)),
        ("sprinklered", FieldValue::Bool(true)),
    ]);
    let both = [
        condition(
            "units",
            ConditionOperator::LessThan,
            ConditionValue::Scalar(FieldValue::Number(10.0)),
        ),
        condition(
            "sprinklered",
            ConditionOperator::Equals,
            ConditionValue::Scalar(FieldValue::Bool(false)),
        ),
    ];

    assert!(!conditions_met(&both, &fields));
}
