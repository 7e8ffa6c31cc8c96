use std::collections::BTreeMap;

use super::domain::{EvaluationContext, FactorStep, FieldValue, RatingTable, ValueType};
use super::expression::{self, ExpressionError};

/// Why a factor step's value could not be resolved. Every variant is
/// recoverable: the executor skips the step with the reason and continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    #[error("no raw value configured for {0} step")]
    MissingValue(&'static str),
    #[error("no table reference configured for table step")]
    MissingTableRef,
    #[error("no expression configured for expression step")]
    MissingExpression,
    #[error("no row in table '{table}' matches key [{key}] and the table has no default")]
    TableKeyNotFound { table: String, key: String },
    #[error("table dimension '{dimension}' has no value in the scenario inputs")]
    MissingDimension { dimension: String },
    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

/// Resolved raw value plus any warnings tolerated during resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: f64,
    pub warnings: Vec<String>,
}

impl Resolved {
    fn plain(value: f64) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }
}

/// Resolve a factor step's raw numeric value: a literal, a table lookup, or
/// an evaluated expression. `prior_outputs` maps earlier applied factor names
/// to their contributions so expressions can reference them.
pub fn resolve(
    step: &FactorStep,
    context: &EvaluationContext,
    prior_outputs: &BTreeMap<String, f64>,
) -> Result<Resolved, ResolutionError> {
    match step.value_type {
        ValueType::Multiplier | ValueType::Percentage | ValueType::Flat => step
            .raw_value
            .map(Resolved::plain)
            .ok_or(ResolutionError::MissingValue(step.value_type.label())),
        ValueType::Table => {
            let table_ref = step
                .table_ref
                .as_deref()
                .ok_or(ResolutionError::MissingTableRef)?;
            // Table presence was checked structurally before execution began.
            let table = context
                .tables
                .get(table_ref)
                .ok_or_else(|| ResolutionError::TableKeyNotFound {
                    table: table_ref.to_string(),
                    key: String::new(),
                })?;
            lookup(table_ref, table, context).map(Resolved::plain)
        }
        ValueType::Expression => {
            let source = step
                .expression
                .as_deref()
                .ok_or(ResolutionError::MissingExpression)?;
            let evaluated = expression::evaluate(source, &context.inputs, prior_outputs)?;
            Ok(Resolved {
                value: evaluated.value,
                warnings: evaluated.warnings,
            })
        }
    }
}

fn lookup(
    table_ref: &str,
    table: &RatingTable,
    context: &EvaluationContext,
) -> Result<f64, ResolutionError> {
    let key = build_key(table, context)?;

    for row in &table.rows {
        if row.key.len() == key.len()
            && row
                .key
                .iter()
                .zip(&key)
                .all(|(component, value)| component_matches(component, value))
        {
            return Ok(row.value);
        }
    }

    table
        .default
        .ok_or_else(|| ResolutionError::TableKeyNotFound {
            table: table_ref.to_string(),
            key: key.join(", "),
        })
}

fn build_key(
    table: &RatingTable,
    context: &EvaluationContext,
) -> Result<Vec<String>, ResolutionError> {
    table
        .dimensions
        .iter()
        .map(|dimension| {
            if dimension == "state" {
                return context
                    .state
                    .clone()
                    .ok_or_else(|| ResolutionError::MissingDimension {
                        dimension: dimension.clone(),
                    });
            }
            context
                .inputs
                .get(dimension)
                .map(FieldValue::lookup_key)
                .ok_or_else(|| ResolutionError::MissingDimension {
                    dimension: dimension.clone(),
                })
        })
        .collect()
}

/// Match one key component: exact, wildcard, or inclusive numeric band
/// written `lo-hi`.
fn component_matches(component: &str, value: &str) -> bool {
    if component == "*" || component == value {
        return true;
    }

    if let Some((low, high)) = component.split_once('-') {
        if let (Ok(low), Ok(high), Ok(actual)) = (
            low.trim().parse::<f64>(),
            high.trim().parse::<f64>(),
            value.parse::<f64>(),
        ) {
            return actual >= low && actual <= high;
        }
    }

    false
}
