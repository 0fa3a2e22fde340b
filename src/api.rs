use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::ingest::types::{Source, SourceAdapter, StoredIdea};
use crate::ingest::{IngestReport, Ingestor};

#[derive(Clone)]
pub struct AppState {
    ingestor: Ingestor,
    adapters: Arc<HashMap<Source, Arc<dyn SourceAdapter>>>,
}

impl AppState {
    pub fn new(ingestor: Ingestor, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        let adapters = adapters.into_iter().map(|a| (a.source(), a)).collect();
        Self {
            ingestor,
            adapters: Arc::new(adapters),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/ideas", get(list_ideas))
        .route("/ideas/{source}", get(list_ideas_by_source));

    // One trigger route per source: GET /reddit, /hackernews, ...
    for source in Source::ALL {
        app = app.route(
            &format!("/{}", source.as_str()),
            get(move |State(state): State<AppState>| trigger(state, source)),
        );
    }

    app.layer(CorsLayer::very_permissive()).with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Idea Inbox API is running!" }))
}

enum ApiError {
    UnknownSource(String),
    NoAdapter(Source),
    Store(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::UnknownSource(s) => (StatusCode::NOT_FOUND, format!("unknown source '{s}'")),
            ApiError::NoAdapter(s) => (
                StatusCode::NOT_FOUND,
                format!("no adapter configured for {s}"),
            ),
            ApiError::Store(e) => {
                tracing::warn!(error = %format!("{e:#}"), "idea listing failed");
                (StatusCode::SERVICE_UNAVAILABLE, "idea store unavailable".to_string())
            }
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

async fn list_ideas(State(state): State<AppState>) -> Result<Json<Vec<StoredIdea>>, ApiError> {
    let rows = state
        .ingestor
        .store()
        .list(None)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(rows))
}

async fn list_ideas_by_source(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<StoredIdea>>, ApiError> {
    let source: Source = raw.parse().map_err(|_| ApiError::UnknownSource(raw))?;
    let rows = state
        .ingestor
        .store()
        .list(Some(source))
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(rows))
}

/// Runs ingestion synchronously. Fetch and store failures still answer 200;
/// they are reported inside the summary.
async fn trigger(state: AppState, source: Source) -> Result<Json<IngestReport>, ApiError> {
    let adapter = state
        .adapters
        .get(&source)
        .cloned()
        .ok_or(ApiError::NoAdapter(source))?;
    Ok(Json(state.ingestor.run(adapter.as_ref()).await))
}
