use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::Method,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::AlertStore;
use crate::processor::{AlertHandler, AlertRequest, AlertResponse};

#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    pub id: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// HTTP trigger for the alerts function. Every method lands here; the
/// handler decides what is allowed.
pub async fn invoke<S: AlertStore>(
    State(handler): State<Arc<AlertHandler<S>>>,
    method: Method,
    query: Result<Query<AlertQuery>, QueryRejection>,
    body: Bytes,
) -> AlertResponse {
    let mut request = AlertRequest::new(method.as_str());
    match query {
        Ok(Query(AlertQuery { id: Some(id) })) => request = request.with_id(id),
        Ok(Query(AlertQuery { id: None })) => {}
        Err(rejection) => request = request.with_query_error(rejection.body_text()),
    }
    // Empty or non-JSON bodies are treated as no body at all.
    if let Ok(body) = serde_json::from_slice::<Value>(&body) {
        request = request.with_body(body);
    }

    let span = info_span!("invocation", id = %Uuid::new_v4(), method = %method);
    handler.handle(request).instrument(span).await
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Alert handler panicked: {}", detail);
    AlertResponse::internal_error().into_response()
}

pub fn build_router<S: AlertStore>(handler: Arc<AlertHandler<S>>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/alerts", any(invoke::<S>))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

pub async fn run_server<S: AlertStore>(config: &AppConfig, store: S) -> anyhow::Result<()> {
    let handler = Arc::new(AlertHandler::new(store));
    let app = build_router(handler);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening for alert requests on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Alerts function stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
