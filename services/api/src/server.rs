use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use conduct_score::config::AppConfig;
use conduct_score::error::AppError;
use conduct_score::scoring::MonthKey;
use conduct_score::sync::{ConductService, HttpSheetGateway};
use conduct_score::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let gateway = HttpSheetGateway::from_config(&config.sheet)?;
    let service = Arc::new(ConductService::new(
        Arc::from(gateway),
        config.admin_credentials.clone(),
    ));

    // Start from whatever the sheet holds; an unreachable sheet leaves the service
    // running offline on an empty ledger.
    if let Err(err) = service.refresh(&MonthKey::current_local()).await {
        warn!(error = %err, "initial sheet fetch failed; starting offline");
    }

    let app = with_service_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        sheet_configured = config.sheet.endpoint.is_some(),
        "conduct score service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
