use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use rating_engine::rating::{
    self, EvaluationContext, EvaluationResult, RatingProgram, ResultCache, StructuralError,
};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Evaluation front door owning the injected scenario-response cache. The
/// cache key is the scenario fingerprint, which covers every input feeding
/// the result hash, so a hit can never serve a result the scenario would not
/// reproduce.
pub(crate) struct RatingService {
    cache: ResultCache,
}

impl RatingService {
    pub(crate) fn new(cache: ResultCache) -> Self {
        Self { cache }
    }

    pub(crate) fn evaluate(
        &self,
        program: &RatingProgram,
        context: &EvaluationContext,
    ) -> Result<EvaluationResult, StructuralError> {
        let fingerprint = rating::scenario_fingerprint(program, context);
        if let Some(hit) = self.cache.get(&fingerprint) {
            debug!(%fingerprint, "serving cached evaluation");
            return Ok(hit);
        }

        let result = rating::evaluate(program, context)?;
        self.cache.insert(fingerprint, result.clone());
        Ok(result)
    }
}
