use std::sync::Arc;

use axum::{
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use scheduling_cell::router::scheduling_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Scheduling API is running!" }))
        .route("/health", get(health))
        .nest("/appointments", scheduling_routes(state.clone()))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "up",
        "service": "scheduling-api",
        "timestamp": Utc::now().to_rfc3339()
    }))
}
