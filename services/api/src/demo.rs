use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use clap::Args;
use rating_engine::rating::{
    self, Condition, ConditionOperator, ConditionValue, EvaluationContext, FactorStep, FieldValue,
    Operator, RatingProgram, RatingStep, RatingTable, RoundingMode, StepId, StepKind, StepScope,
    TableRow, ValueType,
};

use crate::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pretty-print the audit document instead of compact JSON
    #[arg(long)]
    pub(crate) pretty: bool,
}

/// Rate the built-in sample program and print the filing-ready audit
/// document, so stakeholders can see a premium and its trace without
/// standing up the HTTP service.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let program = sample_program();
    let context = sample_context();

    let issues = rating::validate(&program.steps);
    if !issues.is_empty() {
        println!("validation issues: {}", issues.len());
    }

    let result = rating::evaluate(&program, &context)?;
    println!(
        "final premium: {:.2} (hash {})",
        result.final_premium, result.result_hash
    );

    let document = rating::audit_document(&program, &result);
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .expect("audit document serializes");
    println!("{rendered}");

    Ok(())
}

fn factor(id: &str, order: u32, fields: FactorStep) -> RatingStep {
    RatingStep {
        id: StepId(id.to_string()),
        order,
        kind: StepKind::Factor(fields),
    }
}

fn operand(id: &str, order: u32, operator: Operator) -> RatingStep {
    RatingStep {
        id: StepId(id.to_string()),
        order,
        kind: StepKind::Operand { operator },
    }
}

fn fields(name: &str, value_type: ValueType) -> FactorStep {
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

/// Small commercial-property program used by the demo and handler tests.
pub(crate) fn sample_program() -> RatingProgram {
    let mut base = fields("Base Rate", ValueType::Table);
    base.table_ref = Some("base_rates".to_string());

    let mut territory = fields("Territory Factor", ValueType::Multiplier);
    territory.raw_value = Some(1.12);
    territory.rounding = RoundingMode::Nearest;

    let mut alarm_credit = fields("Alarm Credit", ValueType::Percentage);
    alarm_credit.raw_value = Some(5.0);
    alarm_credit.rounding = RoundingMode::Nearest;
    alarm_credit.conditions = vec![Condition {
        field: "central_alarm".to_string(),
        operator: ConditionOperator::Equals,
        value: ConditionValue::Scalar(FieldValue::Bool(true)),
    }];

    let mut fee = fields("Policy Fee", ValueType::Flat);
    fee.raw_value = Some(35.0);

    RatingProgram {
        steps: vec![
            factor("base", 10, base),
            operand("op-1", 20, Operator::Multiply),
            factor("territory", 30, territory),
            operand("op-2", 40, Operator::Subtract),
            factor("alarm", 50, alarm_credit),
            operand("op-3", 60, Operator::Add),
            factor("fee", 70, fee),
        ],
        minimum_premium: Some(200.0),
        final_rounding: RoundingMode::Nearest,
    }
}

pub(crate) fn sample_context() -> EvaluationContext {
    let mut inputs = BTreeMap::new();
    inputs.insert("territory".to_string(), FieldValue::Text("T2".to_string()));
    inputs.insert("protection_class".to_string(), FieldValue::Number(4.0));
    inputs.insert("central_alarm".to_string(), FieldValue::Bool(true));

    let mut tables = BTreeMap::new();
    tables.insert(
        "base_rates".to_string(),
        RatingTable {
            dimensions: vec!["territory".to_string(), "protection_class".to_string()],
            rows: vec![
                TableRow {
                    key: vec!["T1".to_string(), "*".to_string()],
                    value: 420.0,
                },
                TableRow {
                    key: vec!["T2".to_string(), "1-5".to_string()],
                    value: 560.0,
                },
                TableRow {
                    key: vec!["T2".to_string(), "6-10".to_string()],
                    value: 610.0,
                },
            ],
            default: Some(500.0),
        },
    );

    EvaluationContext {
        inputs,
        state: Some("IA".to_string()),
        effective_date: NaiveDate::from_ymd_opt(2026, 4, 1).expect("valid date"),
        tables,
    }
}
