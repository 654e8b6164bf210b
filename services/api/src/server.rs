use crate::cli::ServeArgs;
use crate::infra::{bot_scorer, build_services, mailing_list, open_stores, AppState, MediaRoot};
use crate::routes::with_site_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use gotham_stem::config::AppConfig;
use gotham_stem::error::AppError;
use gotham_stem::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let stores = open_stores(&config).await?;
    let services = build_services(
        &config,
        &stores,
        bot_scorer(&config)?,
        mailing_list(&config)?,
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        database: stores.database.clone(),
    };

    let app = with_site_routes(&services)
        .layer(Extension(app_state))
        .layer(Extension(MediaRoot(config.media.media_root.clone())))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "gotham stem site ready");

    axum::serve(listener, app).await?;
    Ok(())
}
