use serde::{Deserialize, Serialize};

use super::domain::{EvaluationContext, EvaluationResult, RatingProgram, RoundingMode};
use super::executor::{self, StructuralError};
use super::rounding::round_currency;

/// Package of coverage-level programs rated together with a bundle discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRequest {
    pub coverages: Vec<CoverageProgram>,
    /// Whole-number percent discount applied to the package subtotal.
    #[serde(default)]
    pub discount_percent: f64,
    /// When set, any coverage failure fails the whole package.
    #[serde(default)]
    pub all_or_nothing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageProgram {
    pub coverage_id: String,
    pub program: RatingProgram,
}

/// Per-coverage outcome: a failed coverage never silently zeroes the package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CoverageOutcome {
    Rated {
        coverage_id: String,
        result: EvaluationResult,
    },
    Failed {
        coverage_id: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageResult {
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub per_coverage: Vec<CoverageOutcome>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PackageRatingError {
    #[error("coverage '{coverage_id}' failed to rate: {source}")]
    Coverage {
        coverage_id: String,
        source: StructuralError,
    },
}

/// Rate every coverage in the package, sum the totals, and apply the bundle
/// discount. Coverage-level structural failures are reported per coverage
/// while the remaining coverages still rate, unless the caller asked for
/// all-or-nothing semantics.
pub fn rate_package(
    request: &PackageRequest,
    context: &EvaluationContext,
) -> Result<PackageResult, PackageRatingError> {
    let mut per_coverage = Vec::with_capacity(request.coverages.len());
    let mut subtotal = 0.0;

    for coverage in &request.coverages {
        match executor::evaluate_coverage(&coverage.program, context, &coverage.coverage_id) {
            Ok(result) => {
                subtotal += result.final_premium;
                per_coverage.push(CoverageOutcome::Rated {
                    coverage_id: coverage.coverage_id.clone(),
                    result,
                });
            }
            Err(error) if request.all_or_nothing => {
                return Err(PackageRatingError::Coverage {
                    coverage_id: coverage.coverage_id.clone(),
                    source: error,
                });
            }
            Err(error) => {
                per_coverage.push(CoverageOutcome::Failed {
                    coverage_id: coverage.coverage_id.clone(),
                    error: error.to_string(),
                });
            }
        }
    }

    let discount = round_currency(subtotal * request.discount_percent / 100.0, RoundingMode::Nearest);

    Ok(PackageResult {
        subtotal,
        discount,
        total: subtotal - discount,
        per_coverage,
    })
}
