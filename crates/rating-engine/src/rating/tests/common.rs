use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::rating::domain::{
    EvaluationContext, FactorStep, FieldValue, Operator, RatingProgram, RatingStep, RatingTable,
    RoundingMode, StepId, StepKind, StepScope, TableRow, ValueType,
};

pub(super) fn context() -> EvaluationContext {
    EvaluationContext {
        inputs: BTreeMap::new(),
        state: Some("IA".to_string()),
        effective_date: NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date"),
        tables: BTreeMap::new(),
    }
}

pub(super) fn context_with_inputs(pairs: &[(&str, FieldValue)]) -> EvaluationContext {
    let mut ctx = context();
    for (field, value) in pairs {
        ctx.inputs.insert(field.to_string(), value.clone());
    }
    ctx
}

pub(super) fn factor_fields(name: &str, value_type: ValueType) -> FactorStep {
    FactorStep {
        name: name.to_string(),
        value_type,
        raw_value: None,
        table_ref: None,
        expression: None,
        scope: StepScope::Coverage,
        coverages: BTreeSet::new(),
        states: BTreeSet::new(),
        conditions: Vec::new(),
        enabled: true,
        min_cap: None,
        max_cap: None,
        rounding: RoundingMode::None,
    }
}

pub(super) fn factor(id: &str, order: u32, fields: FactorStep) -> RatingStep {
    RatingStep {
        id: StepId(id.to_string()),
        order,
        kind: StepKind::Factor(fields),
    }
}

pub(super) fn flat(id: &str, order: u32, name: &str, value: f64) -> RatingStep {
    factor(
        id,
        order,
        FactorStep {
            raw_value: Some(value),
            ..factor_fields(name, ValueType::Flat)
        },
    )
}

pub(super) fn multiplier(id: &str, order: u32, name: &str, value: f64) -> RatingStep {
    factor(
        id,
        order,
        FactorStep {
            raw_value: Some(value),
            ..factor_fields(name, ValueType::Multiplier)
        },
    )
}

pub(super) fn percentage(id: &str, order: u32, name: &str, value: f64) -> RatingStep {
    factor(
        id,
        order,
        FactorStep {
            raw_value: Some(value),
            ..factor_fields(name, ValueType::Percentage)
        },
    )
}

pub(super) fn operand(id: &str, order: u32, operator: Operator) -> RatingStep {
    RatingStep {
        id: StepId(id.to_string()),
        order,
        kind: StepKind::Operand { operator },
    }
}

pub(super) fn program(steps: Vec<RatingStep>) -> RatingProgram {
    RatingProgram {
        steps,
        minimum_premium: None,
        final_rounding: RoundingMode::None,
    }
}

/// Territory x protection class base-rate table used across tests.
pub(super) fn territory_table() -> RatingTable {
    RatingTable {
        dimensions: vec!["territory".to_string(), "protection_class".to_string()],
        rows: vec![
            TableRow {
                key: vec!["T1".to_string(), "1-4".to_string()],
                value: 500.0,
            },
            TableRow {
                key: vec!["T1".to_string(), "5-10".to_string()],
                value: 650.0,
            },
            TableRow {
                key: vec!["T2".to_string(), "*".to_string()],
                value: 800.0,
            },
        ],
        default: None,
    }
}

pub(super) fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}
