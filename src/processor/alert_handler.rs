use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::db::{AlertSession, AlertStore, StoreError};
use crate::models::AlertDraft;

/// HTTP verbs the function understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertMethod {
    Get,
    Post,
    Delete,
    Other(String),
}

impl From<&str> for AlertMethod {
    fn from(method: &str) -> Self {
        match method.to_uppercase().as_str() {
            "GET" => AlertMethod::Get,
            "POST" => AlertMethod::Post,
            "DELETE" => AlertMethod::Delete,
            other => AlertMethod::Other(other.to_string()),
        }
    }
}

/// Host-independent view of one inbound request.
#[derive(Debug, Clone)]
pub struct AlertRequest {
    pub method: AlertMethod,
    pub id: Option<String>,
    pub body: Option<Value>,
    /// Set when the query string could not be read. An unreadable query never
    /// counts as "no id".
    pub query_error: Option<String>,
}

impl AlertRequest {
    pub fn new(method: impl Into<AlertMethod>) -> Self {
        Self {
            method: method.into(),
            id: None,
            body: None,
            query_error: None,
        }
    }

    /// An empty id is the same as no id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.id = (!id.is_empty()).then_some(id);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query_error(mut self, reason: impl Into<String>) -> Self {
        self.query_error = Some(reason.into());
        self
    }

    fn alert_id(&self) -> Result<Option<i32>, HandlerError> {
        if let Some(reason) = &self.query_error {
            return Err(HandlerError::InvalidQuery(reason.clone()));
        }
        self.id
            .as_deref()
            .map(|raw| {
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| HandlerError::InvalidId(raw.to_string()))
            })
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl AlertResponse {
    fn ok(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    fn status(status: StatusCode, message: String) -> Self {
        Self {
            status,
            body: json!({ "status": message }),
        }
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    pub fn internal_error() -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for AlertResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid alert id {0:?}")]
    InvalidId(String),
    #[error("unreadable query string: {0}")]
    InvalidQuery(String),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Maps each request onto a single statement against the alerts table.
pub struct AlertHandler<S> {
    store: S,
}

impl<S: AlertStore> AlertHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Always produces a response. Failures below this point are logged and
    /// reported as a generic 500.
    pub async fn handle(&self, request: AlertRequest) -> AlertResponse {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error handling alert request: {}", e);
                AlertResponse::internal_error()
            }
        }
    }

    async fn dispatch(&self, request: AlertRequest) -> Result<AlertResponse, HandlerError> {
        match &request.method {
            AlertMethod::Get => {
                let id = request.alert_id()?;
                let mut session = self.store.open().await?;
                self.get(&mut session, id).await
            }
            AlertMethod::Post => {
                let Some(alert) = AlertDraft::from_body(request.body.as_ref()).validate() else {
                    warn!("Rejected alert with missing fields");
                    return Ok(AlertResponse::error(
                        StatusCode::BAD_REQUEST,
                        "Missing required fields",
                    ));
                };
                let mut session = self.store.open().await?;
                let id = session.insert_alert(&alert).await?;
                info!("Inserted alert {} with priority {}", id, alert.priority);
                Ok(AlertResponse::status(
                    StatusCode::CREATED,
                    format!("Successfully inserted alert with id={}", id),
                ))
            }
            AlertMethod::Delete => {
                let id = request.alert_id()?;
                let mut session = self.store.open().await?;
                // The status message echoes the id as the caller sent it.
                let raw = request.id.as_deref().unwrap_or_default();
                self.delete(&mut session, id.map(|id| (id, raw))).await
            }
            AlertMethod::Other(method) => {
                warn!("Method not allowed: {}", method);
                Ok(AlertResponse::error(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "Method not allowed",
                ))
            }
        }
    }

    async fn get(
        &self,
        session: &mut S::Session,
        id: Option<i32>,
    ) -> Result<AlertResponse, HandlerError> {
        match id {
            Some(id) => match session.fetch_alert(id).await? {
                Some(alert) => Ok(AlertResponse::ok(StatusCode::OK, serde_json::to_value(alert)?)),
                None => Ok(AlertResponse::error(StatusCode::NOT_FOUND, "Alert not found")),
            },
            None => {
                let alerts = session.list_alerts().await?;
                Ok(AlertResponse::ok(StatusCode::OK, serde_json::to_value(alerts)?))
            }
        }
    }

    async fn delete(
        &self,
        session: &mut S::Session,
        id: Option<(i32, &str)>,
    ) -> Result<AlertResponse, HandlerError> {
        match id {
            // Deleting an id that does not exist still reports success.
            Some((id, raw)) => {
                let removed = session.delete_alert(id).await?;
                info!("Deleted alert {} ({} rows)", id, removed);
                Ok(AlertResponse::status(
                    StatusCode::OK,
                    format!("Successfully deleted alert with id={}", raw),
                ))
            }
            None => {
                let removed = session.delete_all_alerts().await?;
                info!("Deleted all alerts ({} rows)", removed);
                Ok(AlertResponse::status(
                    StatusCode::OK,
                    "Successfully deleted all alerts".to_string(),
                ))
            }
        }
    }
}
