use super::common::*;
use crate::rating::domain::{Operator, ValueType};
use crate::rating::validation::{
    validate, Severity, EMPTY_ALGORITHM, INVALID_CAPS, MISSING_NAME, MISSING_VALUE,
};

#[test]
fn empty_step_list_warns_about_empty_algorithm() {
    let issues = validate(&[]);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].code, EMPTY_ALGORITHM);
    assert_eq!(issues[0].severity, Severity::Warning);
}

#[test]
fn operand_only_list_is_still_an_empty_algorithm() {
    let steps = vec![operand("op-1", 1, Operator::Multiply)];
    let issues = validate(&steps);
    assert!(issues.iter().any(|issue| issue.code == EMPTY_ALGORITHM));
}

#[test]
fn blank_name_is_an_error() {
    let steps = vec![flat("base", 1, "  ", 500.0)];
    let issues = validate(&steps);
    let issue = issues
        .iter()
        .find(|issue| issue.code == MISSING_NAME)
        .expect("missing name reported");
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.step_id.as_ref().map(|id| id.0.as_str()), Some("base"));
}

#[test]
fn factor_without_any_value_source_warns() {
    let steps = vec![factor("unset", 1, factor_fields("Unset", ValueType::Flat))];
    let issues = validate(&steps);
    let issue = issues
        .iter()
        .find(|issue| issue.code == MISSING_VALUE)
        .expect("missing value reported");
    assert_eq!(issue.severity, Severity::Warning);
}

#[test]
fn inverted_caps_are_an_error() {
    let mut fields = factor_fields("Capped", ValueType::Flat);
    fields.raw_value = Some(10.0);
    fields.min_cap = Some(5.0);
    fields.max_cap = Some(1.0);
    let steps = vec![factor("capped", 1, fields)];

    let issues = validate(&steps);

    let issue = issues
        .iter()
        .find(|issue| issue.code == INVALID_CAPS)
        .expect("invalid caps reported");
    assert_eq!(issue.severity, Severity::Error);
}

#[test]
fn well_formed_program_yields_no_issues() {
    let steps = vec![
        flat("base", 1, "Base", 500.0),
        operand("op-1", 2, Operator::Multiply),
        multiplier("territory", 3, "Territory Factor", 1.1),
    ];
    assert!(validate(&steps).is_empty());
}
