//! HTTP prediction service built on axum.
//!
//! The server pins one loaded [`ModelArtifact`] snapshot and serves every
//! request against it until `/reload` swaps it. If no artifact can be loaded
//! at startup the server still comes up and loads on the first request.

use crate::artifact::ModelArtifact;
use crate::config::ServeConfig;
use crate::error::{CarPriceError, SchemaError};
use crate::pipeline::price_rows;
use crate::schema::{RawRow, Schema};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Shared server reference for axum handlers.
pub type SharedServer = Arc<PriceServer>;

/// Serving state: where the artifact lives and the currently pinned snapshot.
#[derive(Debug)]
pub struct PriceServer {
    artifact_path: PathBuf,
    schema: Schema,
    max_batch: usize,
    snapshot: RwLock<Option<Arc<ModelArtifact>>>,
    started_at: DateTime<Utc>,
}

impl PriceServer {
    pub fn new(artifact_path: impl Into<PathBuf>, config: &ServeConfig) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            schema: Schema::current(),
            max_batch: config.max_batch,
            snapshot: RwLock::new(None),
            started_at: Utc::now(),
        }
    }

    /// Start with an already loaded artifact pinned.
    pub fn with_artifact(mut self, artifact: ModelArtifact) -> Self {
        self.snapshot = RwLock::new(Some(Arc::new(artifact)));
        self
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    /// The pinned snapshot, loading it first if none is pinned yet.
    pub async fn snapshot(&self) -> Result<Arc<ModelArtifact>, CarPriceError> {
        if let Some(artifact) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(artifact));
        }
        let mut slot = self.snapshot.write().await;
        if let Some(artifact) = slot.as_ref() {
            return Ok(Arc::clone(artifact));
        }
        let artifact = Arc::new(self.load().await?);
        *slot = Some(Arc::clone(&artifact));
        Ok(artifact)
    }

    /// Load the artifact from disk and pin it. On failure the previous
    /// snapshot stays in place.
    pub async fn reload(&self) -> Result<Arc<ModelArtifact>, CarPriceError> {
        let artifact = Arc::new(self.load().await?);
        *self.snapshot.write().await = Some(Arc::clone(&artifact));
        tracing::info!(id = %artifact.metadata().id, "Reloaded model artifact");
        Ok(artifact)
    }

    async fn load(&self) -> Result<ModelArtifact, CarPriceError> {
        let path = self.artifact_path.clone();
        let schema = self.schema.clone();
        tokio::task::spawn_blocking(move || ModelArtifact::load_expecting(&path, &schema))
            .await
            .map_err(|e| CarPriceError::Io(std::io::Error::other(e)))?
    }

    fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// A library error rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub CarPriceError);

impl From<CarPriceError> for ApiError {
    fn from(err: CarPriceError) -> Self {
        Self(err)
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CarPriceError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CarPriceError::Artifact(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::warn!(error = %self.0, code = self.0.code(), "Request failed");
        }
        let body = json!({
            "error": {
                "code": self.0.code(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

/// Build the prediction router.
pub fn router(server: SharedServer) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .route("/reload", post(reload_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "Car Price Prediction API is running" }))
}

async fn health_handler(State(server): State<SharedServer>) -> impl IntoResponse {
    let snapshot = server.snapshot.read().await.clone();
    Json(json!({
        "status": "ok",
        "model_loaded": snapshot.is_some(),
        "schema_version": snapshot.as_ref().map(|a| a.schema_version().to_string()),
        "artifact_id": snapshot.as_ref().map(|a| a.metadata().id.to_string()),
        "uptime_secs": server.uptime_secs(),
    }))
}

/// Single object in, single object out; array in, array out.
async fn predict_handler(
    State(server): State<SharedServer>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let payload: Value = serde_json::from_slice(&body).map_err(|e| SchemaError::InvalidPayload {
        message: format!("request body is not valid JSON: {e}"),
    })?;

    let (rows, single) = match payload {
        Value::Object(row) => (vec![row], true),
        Value::Array(items) => (into_rows(items)?, false),
        _ => {
            return Err(SchemaError::InvalidPayload {
                message: "expected a JSON object or an array of objects".to_string(),
            }
            .into());
        }
    };
    if rows.len() > server.max_batch {
        return Err(SchemaError::InvalidPayload {
            message: format!(
                "batch of {} records exceeds the limit of {}",
                rows.len(),
                server.max_batch
            ),
        }
        .into());
    }

    let artifact = server.snapshot().await?;
    let priced = price_rows(artifact.as_ref(), &server.schema, &rows)?;
    tracing::debug!(rows = priced.len(), "Priced request batch");

    let mut priced: Vec<Value> = priced.into_iter().map(Value::Object).collect();
    if single {
        Ok(Json(priced.pop().unwrap_or(Value::Null)))
    } else {
        Ok(Json(Value::Array(priced)))
    }
}

fn into_rows(items: Vec<Value>) -> Result<Vec<RawRow>, SchemaError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            _ => Err(SchemaError::InvalidPayload {
                message: format!("array element {i} is not an object"),
            }),
        })
        .collect()
}

async fn reload_handler(State(server): State<SharedServer>) -> Result<Json<Value>, ApiError> {
    let artifact = server.reload().await?;
    Ok(Json(json!({
        "status": "reloaded",
        "artifact_id": artifact.metadata().id.to_string(),
        "created_at": artifact.metadata().created_at,
        "schema_version": artifact.schema_version(),
    })))
}

/// Serve until Ctrl-C.
pub async fn run(server: SharedServer, config: &ServeConfig) -> std::io::Result<()> {
    let addr = config
        .socket_addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    match server.snapshot().await {
        Ok(artifact) => tracing::info!(id = %artifact.metadata().id, "Model artifact pinned"),
        Err(e) => tracing::warn!(error = %e, "No model artifact loaded yet; will retry on first request"),
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Prediction server listening");
    axum::serve(listener, router(server))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
