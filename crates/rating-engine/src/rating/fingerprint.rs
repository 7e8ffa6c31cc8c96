use serde::Serialize;
use serde_json::json;

use super::domain::{EvaluationContext, EvaluationResult, RatingProgram, RatingStep};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic fingerprint over the step snapshot, the canonicalized
/// scenario, and the outputs. Two evaluations with identical steps and inputs
/// must produce identical hashes; this is the engine's primary
/// reproducibility invariant.
///
/// Canonicalization goes through `serde_json::Value`, whose object map is a
/// `BTreeMap`: key insertion order never reaches the serialized bytes. The
/// hash is FNV-1a, a content-integrity fingerprint rather than a security
/// primitive.
pub fn result_hash(
    steps: &[RatingStep],
    context: &EvaluationContext,
    outputs: &serde_json::Value,
) -> String {
    let mut sorted: Vec<&RatingStep> = steps.iter().collect();
    sorted.sort_by_key(|step| step.order);

    let document = json!({
        "steps": sorted,
        "inputs": {
            "fields": context.inputs,
            "state": context.state,
            "effective_date": context.effective_date,
        },
        "outputs": outputs,
    });

    hash_value(&document)
}

/// Fingerprint of everything that feeds an evaluation, including table data.
/// This is the response-cache key: any input that could change the result
/// hash must change this fingerprint too.
pub fn scenario_fingerprint(program: &RatingProgram, context: &EvaluationContext) -> String {
    let document = json!({
        "program": program,
        "context": context,
    });
    hash_value(&document)
}

/// Canonical JSON audit document for filing packages: stable key order and
/// number formatting across runs.
pub fn audit_document(program: &RatingProgram, result: &EvaluationResult) -> serde_json::Value {
    json!({
        "final_premium": result.final_premium,
        "pre_rounded_premium": result.pre_rounded_premium,
        "minimum_applied": result.minimum_applied,
        "minimum_premium_value": result.minimum_premium_value,
        "result_hash": result.result_hash,
        "evaluated_at": result.evaluated_at.to_rfc3339(),
        "step_count": program.steps.len(),
        "trace": result.trace,
    })
}

fn hash_value<T: Serialize>(value: &T) -> String {
    // to_value cannot fail for these types; fall back to Null rather than
    // panicking inside a pure function.
    let canonical = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
    let bytes = canonical.to_string();
    format!("{:016x}", fnv1a(bytes.as_bytes()))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
