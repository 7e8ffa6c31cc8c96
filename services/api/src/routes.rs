use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use rating_engine::rating::{
    rate_package, validate, EvaluationContext, EvaluationResult, PackageRequest, PackageResult,
    RatingProgram, RatingStep, ValidationIssue,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::infra::{AppState, RatingService};

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateRequest {
    pub(crate) program: RatingProgram,
    pub(crate) context: EvaluationContext,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateRequest {
    pub(crate) steps: Vec<RatingStep>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ValidateResponse {
    pub(crate) issues: Vec<ValidationIssue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PackageRateRequest {
    pub(crate) package: PackageRequest,
    pub(crate) context: EvaluationContext,
}

pub(crate) fn rating_routes(service: Arc<RatingService>) -> axum::Router {
    axum::Router::new()
        .route(
            "/api/v1/rating/evaluate",
            axum::routing::post(evaluate_endpoint),
        )
        .route(
            "/api/v1/rating/validate",
            axum::routing::post(validate_endpoint),
        )
        .route(
            "/api/v1/rating/package",
            axum::routing::post(package_endpoint),
        )
        .with_state(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn evaluate_endpoint(
    State(service): State<Arc<RatingService>>,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<EvaluationResult>, AppError> {
    let result = service.evaluate(&payload.program, &payload.context)?;
    Ok(Json(result))
}

pub(crate) async fn validate_endpoint(
    Json(payload): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        issues: validate(&payload.steps),
    })
}

pub(crate) async fn package_endpoint(
    Json(payload): Json<PackageRateRequest>,
) -> Result<Json<PackageResult>, AppError> {
    let result = rate_package(&payload.package, &payload.context)?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{sample_context, sample_program};
    use rating_engine::rating::{CoverageProgram, ResultCache};
    use std::time::Duration;

    fn service() -> Arc<RatingService> {
        Arc::new(RatingService::new(ResultCache::new(
            8,
            Duration::from_secs(60),
        )))
    }

    #[tokio::test]
    async fn evaluate_endpoint_returns_a_premium_with_trace() {
        let request = EvaluateRequest {
            program: sample_program(),
            context: sample_context(),
        };

        let Json(result) = evaluate_endpoint(State(service()), Json(request))
            .await
            .expect("rates");

        assert!(result.final_premium > 0.0);
        assert!(!result.trace.is_empty());
        assert_eq!(result.result_hash.len(), 16);
    }

    #[tokio::test]
    async fn evaluate_endpoint_serves_cached_results_for_identical_scenarios() {
        let service = service();
        let request = || EvaluateRequest {
            program: sample_program(),
            context: sample_context(),
        };

        let Json(first) = evaluate_endpoint(State(service.clone()), Json(request()))
            .await
            .expect("rates");
        let Json(second) = evaluate_endpoint(State(service), Json(request()))
            .await
            .expect("rates");

        // The cached response is returned verbatim, timestamp included.
        assert_eq!(first.evaluated_at, second.evaluated_at);
        assert_eq!(first.result_hash, second.result_hash);
    }

    #[tokio::test]
    async fn evaluate_endpoint_rejects_structural_errors() {
        let mut program = sample_program();
        let duplicated = program.steps[0].clone();
        program.steps.push(duplicated);

        let error = evaluate_endpoint(
            State(service()),
            Json(EvaluateRequest {
                program,
                context: sample_context(),
            }),
        )
        .await
        .expect_err("duplicate order rejected");

        assert!(matches!(error, AppError::Structural(_)));
    }

    #[tokio::test]
    async fn validate_endpoint_reports_issues() {
        let Json(response) = validate_endpoint(Json(ValidateRequest { steps: Vec::new() })).await;
        assert_eq!(response.issues.len(), 1);
        assert_eq!(response.issues[0].code, "EMPTY_ALGORITHM");
    }

    #[tokio::test]
    async fn package_endpoint_applies_the_bundle_discount() {
        let request = PackageRateRequest {
            package: PackageRequest {
                coverages: vec![
                    CoverageProgram {
                        coverage_id: "GL".to_string(),
                        program: sample_program(),
                    },
                    CoverageProgram {
                        coverage_id: "PROP".to_string(),
                        program: sample_program(),
                    },
                ],
                discount_percent: 10.0,
                all_or_nothing: false,
            },
            context: sample_context(),
        };

        let Json(result) = package_endpoint(Json(request)).await.expect("rates");

        assert_eq!(result.per_coverage.len(), 2);
        // The discount is rounded to a cent before it is taken off.
        assert!((result.discount - result.subtotal * 0.1).abs() < 0.005);
        assert!((result.total - (result.subtotal - result.discount)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn health_endpoint_answers_over_the_router() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::util::ServiceExt;

        let app = rating_routes(service());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
