//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub knowledge_configured: bool,
    pub llm_configured: bool,
}

/// `GET /api/health`: liveness plus which upstreams are configured.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        knowledge_configured: ctx.core.knowledge_configured(),
        llm_configured: ctx.core.chat_model().is_some(),
    })
}
