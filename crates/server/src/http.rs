//! HTTP Endpoints
//!
//! REST API over the shared orchestrator. Typed utterances go through the
//! same classification, alert and chat path as spoken ones.

use std::time::Duration;

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post, put},
    Router,
};
use dwani_core::StructuredReply;
use dwani_tools::ToolExecutor;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::ServerError;

/// Covers a full turn: classification, one tool round and a follow-up call
const REQUEST_TIMEOUT_SECS: u64 = 180;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_origins);

    Router::new()
        .route("/api/utterance", post(utterance))
        .route("/api/conversation", get(conversation).delete(reset_conversation))
        .route("/api/location", put(set_location))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(call_tool))
        .route("/api/scene", get(scene))
        .route("/api/safe-places", get(safe_places))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(cors_layer)
        .with_state(state)
}

/// Empty origin list allows any origin
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    tracing::info!("CORS configured with {} origins", parsed.len());
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(methods)
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
struct UtteranceRequest {
    text: String,
}

async fn utterance(
    State(state): State<AppState>,
    Json(request): Json<UtteranceRequest>,
) -> Result<Json<StructuredReply>, ServerError> {
    let mut agent = state.orchestrator.lock().await;
    let reply = agent.handle_utterance(&request.text).await?;
    Ok(Json(reply))
}

async fn conversation(State(state): State<AppState>) -> Json<Value> {
    let agent = state.orchestrator.lock().await;
    Json(json!({
        "state": agent.state(),
        "session": agent.session(),
        "summary": agent.summary(),
    }))
}

async fn reset_conversation(State(state): State<AppState>) -> StatusCode {
    state.orchestrator.lock().await.reset_conversation();
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct LocationRequest {
    location: String,
}

async fn set_location(
    State(state): State<AppState>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<Value>, ServerError> {
    let location = request.location.trim();
    if location.is_empty() {
        return Err(ServerError::InvalidRequest("location must not be empty".to_string()));
    }

    state.orchestrator.lock().await.set_location(location);
    Ok(Json(json!({ "current_location": location })))
}

async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "tools": state.tools.list_specs() }))
}

#[derive(Debug, Deserialize)]
struct ToolCallRequest {
    #[serde(default = "empty_arguments")]
    arguments: Value,
}

fn empty_arguments() -> Value {
    json!({})
}

/// Run a tool directly, outside of any conversation
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<ToolCallRequest>,
) -> Result<Json<Value>, StatusCode> {
    if state.tools.get_tool(&name).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    match state.tools.execute(&name, request.arguments).await {
        Ok(output) => Ok(Json(json!({
            "result": output.to_value(),
            "is_error": output.is_error,
        }))),
        Err(e) => {
            tracing::warn!(tool = %name, error = %e, "Tool call failed");
            Ok(Json(json!({
                "result": { "error": e.message },
                "code": e.code.code(),
                "is_error": true,
            })))
        }
    }
}

async fn scene(State(state): State<AppState>) -> Json<Value> {
    let latest = state.scene.latest();
    Json(json!({ "scene": latest.as_deref() }))
}

async fn safe_places(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "places": state.catalog.places.values().collect::<Vec<_>>(),
        "priorities": state.catalog.priorities,
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let settings = &state.settings;
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "tools": { "count": state.tools.len() },
            "llm": { "model": settings.llm.model },
            "vision": {
                "enabled": settings.vision.enabled,
                "last_scene": state.scene.latest().map(|s| s.timestamp),
            },
            "routing": { "configured": !settings.navigation.router_api_key.is_empty() },
        }
    }))
}
