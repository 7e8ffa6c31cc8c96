use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

use super::conditions;
use super::domain::{
    EvaluationContext, EvaluationResult, FactorStep, Operator, RatingProgram, RatingStep, StepKind,
    StepTraceEntry, ValueType,
};
use super::fingerprint;
use super::resolver;
use super::rounding;
use super::scope;

/// Structurally invalid input detected before any step runs. A partially
/// executed audit trail for a broken request is worse than no trail, so these
/// abort with no result at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    #[error("duplicate step order {order}: execution order must be a total order")]
    DuplicateOrder { order: u32 },
    #[error("step '{step_id}' references table '{table}' absent from the scenario tables")]
    UnknownTable { step_id: String, table: String },
}

/// Evaluate a rating program at policy level (no coverage selected).
pub fn evaluate(
    program: &RatingProgram,
    context: &EvaluationContext,
) -> Result<EvaluationResult, StructuralError> {
    run(program, context, None)
}

/// Evaluate a rating program for one coverage of a package.
pub fn evaluate_coverage(
    program: &RatingProgram,
    context: &EvaluationContext,
    coverage_id: &str,
) -> Result<EvaluationResult, StructuralError> {
    run(program, context, Some(coverage_id))
}

fn run(
    program: &RatingProgram,
    context: &EvaluationContext,
    coverage: Option<&str>,
) -> Result<EvaluationResult, StructuralError> {
    structural_check(&program.steps, context)?;

    let started = Instant::now();
    let mut ordered: Vec<&RatingStep> = program.steps.iter().collect();
    ordered.sort_by_key(|step| step.order);

    let mut chain = Chain::default();
    for step in ordered {
        match &step.kind {
            StepKind::Operand { operator } => chain.on_operand(step, *operator),
            StepKind::Factor(factor) => chain.on_factor(step, factor, context, coverage),
        }
    }

    let Chain {
        mut total, trace, ..
    } = chain;

    let mut minimum_applied = false;
    if let Some(minimum) = program.minimum_premium {
        if total < minimum {
            total = minimum;
            minimum_applied = true;
        }
    }

    let pre_rounded_premium = total;
    let final_premium = rounding::round_currency(total, program.final_rounding);

    let outputs = json!({
        "final_premium": final_premium,
        "pre_rounded_premium": pre_rounded_premium,
        "minimum_applied": minimum_applied,
        "trace": trace,
    });
    let result_hash = fingerprint::result_hash(&program.steps, context, &outputs);

    Ok(EvaluationResult {
        final_premium,
        pre_rounded_premium,
        minimum_applied,
        minimum_premium_value: program.minimum_premium.filter(|_| minimum_applied),
        trace,
        result_hash,
        evaluated_at: Utc::now(),
        execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    })
}

fn structural_check(
    steps: &[RatingStep],
    context: &EvaluationContext,
) -> Result<(), StructuralError> {
    let mut seen = BTreeSet::new();
    for step in steps {
        if !seen.insert(step.order) {
            return Err(StructuralError::DuplicateOrder { order: step.order });
        }

        if let StepKind::Factor(factor) = &step.kind {
            if factor.enabled && factor.value_type == ValueType::Table {
                if let Some(table_ref) = factor.table_ref.as_deref() {
                    if !context.tables.contains_key(table_ref) {
                        return Err(StructuralError::UnknownTable {
                            step_id: step.id.0.clone(),
                            table: table_ref.to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Running state of the step chain: `ExpectingFactor` with `pending = None`,
/// `OperatorPending` otherwise. Skipped factors leave the pending operator in
/// place for the next applied factor.
#[derive(Default)]
struct Chain {
    total: f64,
    seeded: bool,
    pending: Option<Operator>,
    outputs: BTreeMap<String, f64>,
    trace: Vec<StepTraceEntry>,
}

impl Chain {
    fn on_operand(&mut self, step: &RatingStep, operator: Operator) {
        let warning = self.pending.map(|previous| {
            warn!(
                step_id = %step.id.0,
                previous = previous.symbol(),
                operator = operator.symbol(),
                "consecutive operand steps; later operator overrides the pending one"
            );
            format!(
                "operator '{}' overrides pending '{}' with no factor between",
                operator.symbol(),
                previous.symbol()
            )
        });
        self.pending = Some(operator);

        self.trace.push(StepTraceEntry {
            step_id: step.id.clone(),
            name: format!("operand {}", operator.symbol()),
            operation: operator.symbol().to_string(),
            resolved_value: None,
            rounded_value: None,
            contribution: None,
            was_capped: false,
            running_total: self.total,
            impact: 0.0,
            impact_percent: 0.0,
            applied: true,
            skip_reason: None,
            warning,
        });
    }

    fn on_factor(
        &mut self,
        step: &RatingStep,
        factor: &FactorStep,
        context: &EvaluationContext,
        coverage: Option<&str>,
    ) {
        if !factor.enabled {
            self.push_skip(step, factor, "disabled".to_string());
            return;
        }

        if let Some(reason) = scope::skip_reason(factor, context, coverage) {
            self.push_skip(step, factor, reason);
            return;
        }

        if !conditions::conditions_met(&factor.conditions, &context.inputs) {
            self.push_skip(step, factor, "condition not met".to_string());
            return;
        }

        let resolved = match resolver::resolve(factor, context, &self.outputs) {
            Ok(resolved) => resolved,
            Err(error) => {
                self.push_skip(step, factor, error.to_string());
                return;
            }
        };
        let mut warnings = resolved.warnings;

        let operator = self.pending.take();
        let seeding = !self.seeded && operator.is_none();

        // Percentage steps store whole-number percent; convert to the amount
        // the operator consumes. Added/subtracted percentages act on the
        // running total; multiplied/divided percentages become plain
        // fractions; an assigned or seeding percentage is taken at face value.
        let effective = if factor.value_type == ValueType::Percentage {
            match operator {
                Some(Operator::Add) | Some(Operator::Subtract) => {
                    self.total * resolved.value / 100.0
                }
                Some(Operator::Multiply) | Some(Operator::Divide) => resolved.value / 100.0,
                Some(Operator::Assign) | None => resolved.value,
            }
        } else {
            resolved.value
        };

        let capped = rounding::apply(effective, factor.rounding, factor.min_cap, factor.max_cap);

        let before = self.total;
        let operation = if seeding {
            self.total = capped.value;
            self.seeded = true;
            "Initial".to_string()
        } else {
            let operator = operator.unwrap_or_else(|| {
                warnings.push(
                    "no pending operator before factor; defaulting to multiply".to_string(),
                );
                Operator::Multiply
            });
            match operator {
                Operator::Add => self.total = before + capped.value,
                Operator::Subtract => self.total = before - capped.value,
                Operator::Multiply => self.total = before * capped.value,
                Operator::Divide => {
                    if capped.value == 0.0 {
                        warn!(step_id = %step.id.0, "division by zero; running total unchanged");
                        warnings
                            .push("division by zero; running total unchanged".to_string());
                    } else {
                        self.total = before / capped.value;
                    }
                }
                Operator::Assign => self.total = capped.value,
            }
            self.seeded = true;
            operator.symbol().to_string()
        };

        self.outputs.insert(factor.name.clone(), capped.value);

        let impact = self.total - before;
        let impact_percent = if before != 0.0 {
            impact / before * 100.0
        } else {
            0.0
        };

        self.trace.push(StepTraceEntry {
            step_id: step.id.clone(),
            name: factor.name.clone(),
            operation,
            resolved_value: Some(effective),
            rounded_value: Some(capped.rounded),
            contribution: Some(capped.value),
            was_capped: capped.was_capped,
            running_total: self.total,
            impact,
            impact_percent,
            applied: true,
            skip_reason: None,
            warning: join_warnings(warnings),
        });
    }

    fn push_skip(&mut self, step: &RatingStep, factor: &FactorStep, reason: String) {
        debug!(step_id = %step.id.0, reason = %reason, "step skipped");
        self.trace.push(StepTraceEntry {
            step_id: step.id.clone(),
            name: factor.name.clone(),
            operation: "Skipped".to_string(),
            resolved_value: None,
            rounded_value: None,
            contribution: None,
            was_capped: false,
            running_total: self.total,
            impact: 0.0,
            impact_percent: 0.0,
            applied: false,
            skip_reason: Some(reason),
            warning: None,
        });
    }
}

fn join_warnings(warnings: Vec<String>) -> Option<String> {
    if warnings.is_empty() {
        None
    } else {
        Some(warnings.join("; "))
    }
}
