use crate::cli::ServeArgs;
use crate::error::AppError;
use crate::infra::{AppState, RatingService};
use crate::routes::rating_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rating_engine::config::AppConfig;
use rating_engine::rating::ResultCache;
use rating_engine::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(RatingService::new(ResultCache::new(
        config.cache.capacity,
        config.cache.ttl,
    )));

    let app = rating_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "rating service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
