use crate::cli::ServeArgs;
use crate::infra::{load_query_service, AppState};
use crate::routes::with_housing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use housing_lens::config::AppConfig;
use housing_lens::error::AppError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut config: AppConfig, mut args: ServeArgs) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let query_service = Arc::new(load_query_service(&config)?);
    let map_available = query_service.map_available();

    let app = with_housing_routes(query_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, map_available, "housing dashboard service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
