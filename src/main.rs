use std::{net::SocketAddr, sync::Arc, time::Duration};

use http::HeaderValue;
use tokio::{signal, sync::mpsc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing::{error, info};

use consignment_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db_arc = Arc::new(db_pool);

    // Domain events feed email notifications
    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = Arc::new(api::events::EventSender::new(event_tx));
    let email = api::notifications::email_sender_from_config(&cfg)?;
    tokio::spawn(api::events::process_events(
        event_rx,
        api::events::EventHandler::new(db_arc.clone(), email),
    ));

    let auth_service = Arc::new(api::auth::AuthService::new(api::auth::AuthConfig::from(
        &cfg,
    )));
    let app_state = api::AppState::new(
        db_arc.clone(),
        cfg.clone(),
        auth_service,
        event_sender,
    );

    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let cors_layer = if origins.is_empty() {
        info!("No CORS origins configured; using permissive CORS");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = api::app_router(app_state)
        .route("/", axum::routing::get(|| async { "consignment-api up" }))
        .merge(api::openapi::swagger_ui())
        .layer(api::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_secs)))
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        // Outermost so every span and error body sees the request id
        .layer(axum::middleware::from_fn(
            api::tracing::request_id_middleware,
        ));

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!("consignment-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
