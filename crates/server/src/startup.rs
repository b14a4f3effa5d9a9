use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::http::{HeaderValue, Method};
use axum::Router;
use configs::{AppConfig, FrontendConfig};
use dotenvy::dotenv;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, ServerState};
use service::{
    runtime,
    todo::{
        repo::{DocumentTodoStore, SeaOrmTodoStore},
        TodoService,
    },
};

/// CORS for the configured frontend origin, or permissive when none is set.
pub fn build_cors(frontend: &FrontendConfig) -> Result<CorsLayer, StartupError> {
    let Some(address) = frontend.address.as_deref() else {
        return Ok(CorsLayer::very_permissive());
    };
    if address.trim() == "*" {
        return Err(StartupError::InvalidConfig("frontend.address must be a concrete origin when credentials are allowed".into()));
    }
    let origin = HeaderValue::from_str(address.trim())
        .map_err(|e| StartupError::InvalidConfig(format!("frontend.address: {e}")))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Open both stores and wire them into the reconciliation service.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<ServerState> {
    runtime::ensure_document_dir(&cfg.document_store.path).await?;

    let db = models::db::connect_and_migrate(&cfg.database).await?;
    let primary = Arc::new(SeaOrmTodoStore::new(db));
    let secondary = Arc::new(DocumentTodoStore::open(&cfg.document_store.path).await?);
    info!(document_store = %cfg.document_store.path, "todo stores ready");

    Ok(ServerState::new(TodoService::new(primary, secondary)))
}

/// Build the router for a loaded config.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    let cors = build_cors(&cfg.frontend)?;
    Ok(routes::build_router(state, cors))
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received Ctrl+C, shutting down");
    }
}

/// Public entry: build the app and run the HTTP server until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    run_with_shutdown(ctrl_c()).await
}

/// Run the HTTP server until `shutdown` resolves, then drain in-flight requests.
pub async fn run_with_shutdown<F>(shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    dotenv().ok();
    let cfg = AppConfig::load()?;
    let app = build_app(&cfg).await?;

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting todo server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("todo server stopped");
    Ok(())
}
