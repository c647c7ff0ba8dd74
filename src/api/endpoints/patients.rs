//! Patient endpoints.
//!
//! - `GET /api/patients`: paginated list with search
//! - `POST /api/patients`: create
//! - `GET|PUT|DELETE /api/patients/:id`

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{NewPatient, Patient, PatientFilter, PatientPage, PatientUpdate};

#[derive(Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub(crate) fn parse_patient_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid patient ID: {e}")))
}

/// `GET /api/patients`: newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<PatientListQuery>, QueryRejection>,
) -> Result<Json<PatientPage>, ApiError> {
    let Query(query) = query?;
    let filter = PatientFilter::new(query.search, query.page, query.page_size);

    let conn = ctx.core.open_db()?;
    let patients = db::list_patients(&conn, &filter)?;
    let total = db::count_patients(&conn, &filter)?;

    Ok(Json(PatientPage {
        patients,
        total,
        page: filter.page,
        page_size: filter.page_size,
    }))
}

/// `POST /api/patients`: 201 with the stored record.
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(new_patient) = payload?;
    let now = Utc::now();
    new_patient.validate(now.date_naive())?;

    let patient = new_patient.into_patient(Uuid::new_v4(), now);
    let conn = ctx.core.open_db()?;
    db::insert_patient(&conn, &patient)?;

    tracing::info!(patient_id = %patient.id, "Patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_patient_id(&patient_id)?;
    let conn = ctx.core.open_db()?;
    let patient = db::get_patient(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;
    Ok(Json(patient))
}

/// `PUT /api/patients/:id`: partial update; absent fields are unchanged.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
    payload: Result<Json<PatientUpdate>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_patient_id(&patient_id)?;
    let Json(changes) = payload?;
    let now = Utc::now();
    changes.validate(now.date_naive())?;

    let conn = ctx.core.open_db()?;
    let patient = db::update_patient(&conn, &id, changes, now)?;

    tracing::info!(patient_id = %id, "Patient updated");
    Ok(Json(patient))
}

/// `DELETE /api/patients/:id`: also removes the patient's reports.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_patient_id(&patient_id)?;
    let conn = ctx.core.open_db()?;
    db::delete_patient(&conn, &id)?;

    tracing::info!(patient_id = %id, "Patient deleted");
    Ok(StatusCode::NO_CONTENT)
}
