use crate::cli::ServeArgs;
use crate::infra::{build_matchboard, seed_postings, AppState};
use crate::routes::with_matchboard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use resume_match::config::AppConfig;
use resume_match::error::AppError;
use resume_match::telemetry;
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

    let service = Arc::new(build_matchboard(None));
    if config.seed_catalog {
        for posting in seed_postings() {
            service.add_or_replace_posting(posting);
        }
    }

    let app = with_matchboard_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "resume matchboard ready");

    axum::serve(listener, app).await?;
    Ok(())
}
