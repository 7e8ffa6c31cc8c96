use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for rating steps so traces can reference them stably.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(pub String);

/// One item in the ordered step sequence of a rating program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingStep {
    pub id: StepId,
    /// Execution position; must be unique within a program.
    pub order: u32,
    #[serde(flatten)]
    pub kind: StepKind,
}

/// Factor and operand steps carry mutually exclusive field sets, so the
/// distinction lives in the type rather than in optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Factor(FactorStep),
    Operand { operator: Operator },
}

/// A step contributing a numeric value to the premium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorStep {
    pub name: String,
    pub value_type: ValueType,
    /// Used when `value_type` is `Multiplier`, `Percentage`, or `Flat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<f64>,
    /// Used when `value_type` is `Table`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_ref: Option<String>,
    /// Used when `value_type` is `Expression`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub scope: StepScope,
    /// Coverage codes this step applies to; empty means every coverage.
    #[serde(default)]
    pub coverages: BTreeSet<String>,
    /// Jurisdiction codes this step applies to; empty means every state.
    #[serde(default)]
    pub states: BTreeSet<String>,
    /// Applicability conditions, ANDed together; empty means always.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub enabled: bool,
    /// Lower bound on this step's contribution, applied after rounding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cap: Option<f64>,
    /// Upper bound on this step's contribution, applied after rounding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cap: Option<f64>,
    #[serde(default)]
    pub rounding: RoundingMode,
}

/// How a factor step's raw numeric value is sourced.
///
/// `Percentage` is whole-number percent: a raw value of 10 means 10%. The
/// executor converts to a fraction only where the operator context calls for
/// one (see the step chain executor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Multiplier,
    Percentage,
    Flat,
    Table,
    Expression,
}

impl ValueType {
    pub const fn label(self) -> &'static str {
        match self {
            ValueType::Multiplier => "multiplier",
            ValueType::Percentage => "percentage",
            ValueType::Flat => "flat",
            ValueType::Table => "table",
            ValueType::Expression => "expression",
        }
    }
}

/// Arithmetic joining the running total with the next factor's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Assign,
}

impl Operator {
    pub const fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Assign => "=",
        }
    }
}

/// Level at which a step's effect is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepScope {
    Policy,
    Coverage,
    Location,
    Item,
}

/// Rounding applied to a step contribution (currency scale, two decimals).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    #[default]
    None,
    /// Away from zero to the next cent, regardless of sign.
    Up,
    /// Toward zero to the previous cent, regardless of sign.
    Down,
    /// Half away from zero.
    Nearest,
    /// Half to even.
    Bankers,
}

/// A single applicability check against the scenario inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: ConditionValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    GreaterThan,
    LessThan,
    Contains,
    Between,
}

/// Comparison operand: a scalar, or an inclusive numeric range for `Between`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Range(f64, f64),
    Scalar(FieldValue),
}

/// Scenario input value as supplied by the caller's data dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Stable text rendering used for table lookup keys.
    pub fn lookup_key(&self) -> String {
        match self {
            FieldValue::Bool(value) => value.to_string(),
            FieldValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            }
            FieldValue::Text(value) => value.clone(),
        }
    }
}

/// One scenario to evaluate a program against. Immutable for the duration of
/// a call; the engine holds no state between evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    #[serde(default)]
    pub inputs: BTreeMap<String, FieldValue>,
    /// Jurisdiction code used for scope filtering and table lookup keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Date the caller used to resolve effective table/program versions.
    pub effective_date: NaiveDate,
    /// Read-only lookup tables keyed by table reference.
    #[serde(default)]
    pub tables: BTreeMap<String, RatingTable>,
}

/// Immutable keyed lookup table: ordered dimension tuple -> numeric value.
///
/// A row key component matches its dimension value exactly, or when it is
/// `"*"`, or when it is a numeric band `"lo-hi"` and the dimension value is a
/// number inside the inclusive band. The reserved dimension name `state`
/// resolves from the context's jurisdiction rather than from `inputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    pub dimensions: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Value returned when no row matches; absent means lookup failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: Vec<String>,
    pub value: f64,
}

/// Ordered steps plus the policy-level post-passes that finish a premium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingProgram {
    pub steps: Vec<RatingStep>,
    /// Floor below which the computed total may not fall.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_premium: Option<f64>,
    /// Overall rounding pass applied to the finished total.
    #[serde(default)]
    pub final_rounding: RoundingMode,
}

/// One record per executed step, factor and operand alike, so the trace can
/// explain both what a number is and why a step did not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTraceEntry {
    pub step_id: StepId,
    pub name: String,
    /// Symbol actually applied: an operator symbol, or `"Initial"` when the
    /// first applied factor seeds the chain.
    pub operation: String,
    /// Contribution before rounding (for percentages, after conversion into
    /// the amount the operator consumes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_value: Option<f64>,
    /// Contribution after rounding but before caps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounded_value: Option<f64>,
    /// Contribution actually applied to the running total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution: Option<f64>,
    pub was_capped: bool,
    pub running_total: f64,
    /// Running total after this step minus the total before it.
    pub impact: f64,
    /// Impact relative to the total before this step, in percent; zero when
    /// the prior total was zero.
    pub impact_percent: f64,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Complete outcome of one evaluation: the premium, the audit trace, and the
/// determinism fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub final_premium: f64,
    /// Total before the final overall rounding pass.
    pub pre_rounded_premium: f64,
    pub minimum_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_premium_value: Option<f64>,
    pub trace: Vec<StepTraceEntry>,
    pub result_hash: String,
    pub evaluated_at: DateTime<Utc>,
    pub execution_time_ms: f64,
}
