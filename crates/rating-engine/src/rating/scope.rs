use super::domain::{EvaluationContext, FactorStep};

/// Decide whether a step applies to the coverage and jurisdiction being
/// rated, returning the skip reason when it does not.
///
/// An empty `coverages` or `states` set means the step applies everywhere.
/// The executor never deletes a filtered step; it records the reason and
/// advances, so the trace shows why the step had no effect.
pub fn skip_reason(
    step: &FactorStep,
    context: &EvaluationContext,
    coverage: Option<&str>,
) -> Option<String> {
    if !step.coverages.is_empty() {
        match coverage {
            Some(code) if step.coverages.contains(code) => {}
            Some(code) => {
                return Some(format!(
                    "scope mismatch: coverage {code} not in [{}]",
                    join(&step.coverages)
                ));
            }
            None => {
                return Some(format!(
                    "scope mismatch: no coverage selected for step limited to [{}]",
                    join(&step.coverages)
                ));
            }
        }
    }

    if !step.states.is_empty() {
        match context.state.as_deref() {
            Some(state) if step.states.contains(state) => {}
            Some(state) => {
                return Some(format!(
                    "scope mismatch: state {state} not in [{}]",
                    join(&step.states)
                ));
            }
            None => {
                return Some(format!(
                    "scope mismatch: no state on scenario for step limited to [{}]",
                    join(&step.states)
                ));
            }
        }
    }

    None
}

fn join(codes: &std::collections::BTreeSet<String>) -> String {
    codes
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
