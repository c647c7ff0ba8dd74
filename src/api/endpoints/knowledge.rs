//! Knowledge endpoint: `POST /api/knowledge` with an `action` of
//! `index` or `query`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::knowledge::{clamp_limit, KnowledgeEntry, KnowledgeMatch, SearchMode};

#[derive(Deserialize)]
pub struct KnowledgeRequest {
    pub action: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Deserialize)]
struct IndexData {
    text: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
struct QueryData {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    mode: SearchMode,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum KnowledgeResponse {
    Indexed { message: &'static str, id: String },
    Results { results: Vec<KnowledgeMatch> },
}

fn parse_data<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(|e| ApiError::BadRequest(format!("Invalid data: {e}")))
}

/// `POST /api/knowledge`
pub async fn handle(
    State(ctx): State<ApiContext>,
    payload: Result<Json<KnowledgeRequest>, JsonRejection>,
) -> Result<Json<KnowledgeResponse>, ApiError> {
    let Json(request) = payload?;
    let store = ctx.core.knowledge();

    match request.action.as_str() {
        "index" => {
            let data: IndexData = parse_data(request.data)?;
            let entry = KnowledgeEntry::new(data.text, data.title);
            if entry.text.trim().is_empty() {
                return Err(ApiError::BadRequest("text must not be empty".into()));
            }
            store.ensure_schema().await?;
            let id = store.index(&entry).await?;
            tracing::info!(id = %id, label = %entry.label(), "Knowledge indexed");
            Ok(Json(KnowledgeResponse::Indexed {
                message: "Text indexed successfully",
                id,
            }))
        }
        "query" => {
            let data: QueryData = parse_data(request.data)?;
            if data.query.trim().is_empty() {
                return Ok(Json(KnowledgeResponse::Results {
                    results: Vec::new(),
                }));
            }
            store.ensure_schema().await?;
            let results = store
                .search(data.query.trim(), clamp_limit(data.limit), data.mode)
                .await?;
            Ok(Json(KnowledgeResponse::Results { results }))
        }
        _ => Err(ApiError::BadRequest("Invalid action".into())),
    }
}
