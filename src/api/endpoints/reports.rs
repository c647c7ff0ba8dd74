//! Report endpoints.
//!
//! - `POST /api/reports`: generate and store a diagnostic report
//! - `GET /api/patients/:id/reports`: stored reports, newest first

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patients::parse_patient_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::StoredReport;
use crate::pipeline::knowledge::KnowledgeMatch;
use crate::pipeline::report::ReportPipeline;

#[derive(Deserialize)]
pub struct ReportRequest {
    #[serde(alias = "patientId")]
    pub patient_id: String,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub report: String,
    pub patient_id: Uuid,
    pub model: String,
    pub knowledge: Vec<KnowledgeMatch>,
    pub generated_at: DateTime<Utc>,
    pub report_id: Uuid,
}

/// `POST /api/reports`
pub async fn generate(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Json(request) = payload?;
    let patient_id = parse_patient_id(&request.patient_id)?;

    let model = ctx
        .core
        .chat_model()
        .ok_or_else(|| ApiError::NotConfigured("DeepSeek API key".into()))?;

    // Connection is not held across the upstream calls.
    let patient = {
        let conn = ctx.core.open_db()?;
        db::get_patient(&conn, &patient_id)?
            .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?
    };

    tracing::info!(patient_id = %patient_id, "Generating report");
    let report = ReportPipeline::new(ctx.core.knowledge(), model, ctx.core.report_settings())
        .generate(&patient)
        .await?;

    let stored = StoredReport {
        id: Uuid::new_v4(),
        patient_id,
        content: report.content,
        model: report.model,
        knowledge_titles: report.knowledge.iter().map(KnowledgeMatch::label).collect(),
        created_at: Utc::now(),
    };
    let conn = ctx.core.open_db()?;
    db::insert_report(&conn, &stored)?;

    Ok(Json(ReportResponse {
        report: stored.content,
        patient_id,
        model: stored.model,
        knowledge: report.knowledge,
        generated_at: stored.created_at,
        report_id: stored.id,
    }))
}

/// `GET /api/patients/:id/reports`
pub async fn list_for_patient(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<StoredReport>>, ApiError> {
    let id = parse_patient_id(&patient_id)?;
    let conn = ctx.core.open_db()?;
    if db::get_patient(&conn, &id)?.is_none() {
        return Err(ApiError::NotFound("Patient not found".into()));
    }
    Ok(Json(db::list_reports_for_patient(&conn, &id)?))
}
