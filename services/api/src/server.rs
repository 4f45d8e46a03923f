use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryPostingRepository, LoopbackGateway,
};
use crate::routes::with_lifecycle_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use worklink::config::AppConfig;
use worklink::error::AppError;
use worklink::lifecycle::LifecycleEngine;
use worklink::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if let Some(base_url) = &config.backend.base_url {
        // A remote backend of record is configured but this build ships the
        // loopback gateway only; the URL is surfaced so operators notice.
        info!(%base_url, "APP_BACKEND_URL set; serving with the in-process gateway");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let postings = Arc::new(InMemoryPostingRepository::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let gateway = Arc::new(LoopbackGateway::default());
    let engine = Arc::new(LifecycleEngine::new(postings, applications, gateway));

    let app = with_lifecycle_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lifecycle service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
