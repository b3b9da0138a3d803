//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for research queries and document ingestion.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    preflight::check(&settings, Operation::Research)?;
    let orchestrator = Orchestrator::new(settings)?;

    let app = router(Arc::new(AppState { orchestrator }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Sleuth API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Research", "POST /query");
    Output::kv("Ingest", "POST /ingest");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .route("/ingest", post(ingest))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Serialize)]
struct QueryResponse {
    query: String,
    answer: String,
}

#[derive(Deserialize)]
struct IngestRequest {
    /// Local file path, readable by the server process
    path: String,
}

#[derive(Serialize)]
struct IngestResponse {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Research failures are carried in the report, so this always answers.
async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    if req.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query must not be empty".to_string());
    }

    let run = state.orchestrator.research(&req.query).await;
    Json(QueryResponse {
        query: req.query,
        answer: run.report,
    })
    .into_response()
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> impl IntoResponse {
    match state.orchestrator.ingest_path(Path::new(&req.path)).await {
        Ok(outcome) => Json(IngestResponse {
            status: format!("Ingested {} ({} chunks)", outcome.source, outcome.chunks),
        })
        .into_response(),
        Err(e) => {
            warn!("Ingest of {} failed: {}", req.path, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::orchestrator::build_memory_store;
    use crate::testing::{FakeEmbedder, FakeFetcher, FakeSearch, Reply, ScriptedModel};
    use axum::body::to_bytes;
    use axum::response::Response;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::io::Write;

    fn state(replies: Vec<Reply>) -> Arc<AppState> {
        let mut settings = Settings::default();
        settings.memory.persist = false;
        let store = Arc::new(build_memory_store(&settings, Arc::new(FakeEmbedder::new())).unwrap());
        let orchestrator = Orchestrator::with_components(
            settings,
            Prompts::builtin(),
            Arc::new(ScriptedModel::new(replies)),
            store,
            Arc::new(FakeSearch { urls: vec![] }),
            Arc::new(FakeFetcher {
                pages: HashMap::new(),
            }),
        );
        Arc::new(AppState { orchestrator })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_query_returns_report() {
        let state = state(vec![Reply::text("CONVERSATION"), Reply::text("Hi!")]);
        let response = query(
            State(state),
            Json(QueryRequest {
                query: "hello".to_string(),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["query"], "hello");
        assert_eq!(body["answer"], "Hi!");
    }

    #[tokio::test]
    async fn test_empty_query_is_bad_request() {
        let state = state(vec![]);
        let response = query(
            State(state),
            Json(QueryRequest {
                query: "   ".to_string(),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Query must not be empty");
    }

    #[tokio::test]
    async fn test_ingest_reports_status() {
        let state = state(vec![]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "ownership and borrowing").unwrap();

        let response = ingest(
            State(state.clone()),
            Json(IngestRequest {
                path: path.display().to_string(),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "Ingested notes.txt (1 chunks)");
        assert_eq!(state.orchestrator.store().len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ingest_missing_file_is_500() {
        let response = ingest(
            State(state(vec![])),
            Json(IngestRequest {
                path: "/definitely/not/here.txt".to_string(),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("File not found"));
    }
}
