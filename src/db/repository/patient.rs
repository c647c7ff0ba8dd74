use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::Gender;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, name, dob, gender, chief_complaint, complaint_duration,
     tongue_color, tcm_inspection, tcm_auscultation, tcm_inquiry, tcm_palpation,
     emotional_state, lifestyle_factors, medical_history, created_at, updated_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, dob, gender, chief_complaint, complaint_duration,
         tongue_color, tcm_inspection, tcm_auscultation, tcm_inquiry, tcm_palpation,
         emotional_state, lifestyle_factors, medical_history, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.dob.to_string(),
            patient.gender.as_str(),
            patient.chief_complaint,
            patient.complaint_duration,
            patient.tongue_color,
            section_to_json("tcm_inspection", &patient.tcm_inspection)?,
            section_to_json("tcm_auscultation", &patient.tcm_auscultation)?,
            section_to_json("tcm_inquiry", &patient.tcm_inquiry)?,
            section_to_json("tcm_palpation", &patient.tcm_palpation)?,
            patient.emotional_state,
            patient.lifestyle_factors,
            patient.medical_history,
            format_timestamp(&patient.created_at),
            format_timestamp(&patient.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;

    let row = stmt
        .query_row(params![id.to_string()], read_patient_row)
        .optional()?;

    row.map(patient_from_row).transpose()
}

/// Newest first. Search matches name or chief complaint, case-insensitively.
pub fn list_patients(
    conn: &Connection,
    filter: &PatientFilter,
) -> Result<Vec<Patient>, DatabaseError> {
    let pattern = filter.search.as_deref().map(like_pattern);
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         WHERE ?1 IS NULL
            OR fold_case(name) LIKE ?1 ESCAPE '\\'
            OR fold_case(chief_complaint) LIKE ?1 ESCAPE '\\'
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3"
    ))?;

    let rows = stmt.query_map(
        params![pattern, filter.page_size, filter.offset()],
        read_patient_row,
    )?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

/// Number of patients matching the filter's search, ignoring paging.
pub fn count_patients(conn: &Connection, filter: &PatientFilter) -> Result<u32, DatabaseError> {
    let pattern = filter.search.as_deref().map(like_pattern);
    let count = conn.query_row(
        "SELECT COUNT(*) FROM patients
         WHERE ?1 IS NULL
            OR fold_case(name) LIKE ?1 ESCAPE '\\'
            OR fold_case(chief_complaint) LIKE ?1 ESCAPE '\\'",
        params![pattern],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(count)
}

/// Merge `update` into the stored patient and return the new row.
pub fn update_patient(
    conn: &Connection,
    id: &Uuid,
    update: PatientUpdate,
    now: DateTime<Utc>,
) -> Result<Patient, DatabaseError> {
    let mut patient = get_patient(conn, id)?.ok_or_else(|| not_found(id))?;
    patient.apply(update, now);

    let changed = conn.execute(
        "UPDATE patients SET name = ?2, dob = ?3, gender = ?4, chief_complaint = ?5,
         complaint_duration = ?6, tongue_color = ?7, tcm_inspection = ?8,
         tcm_auscultation = ?9, tcm_inquiry = ?10, tcm_palpation = ?11,
         emotional_state = ?12, lifestyle_factors = ?13, medical_history = ?14,
         updated_at = ?15
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.name,
            patient.dob.to_string(),
            patient.gender.as_str(),
            patient.chief_complaint,
            patient.complaint_duration,
            patient.tongue_color,
            section_to_json("tcm_inspection", &patient.tcm_inspection)?,
            section_to_json("tcm_auscultation", &patient.tcm_auscultation)?,
            section_to_json("tcm_inquiry", &patient.tcm_inquiry)?,
            section_to_json("tcm_palpation", &patient.tcm_palpation)?,
            patient.emotional_state,
            patient.lifestyle_factors,
            patient.medical_history,
            format_timestamp(&patient.updated_at),
        ],
    )?;
    if changed == 0 {
        return Err(not_found(id));
    }

    Ok(patient)
}

/// Delete a patient and, through the foreign key, their reports.
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // Fixed-width so lexical order equals chronological order.
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {value}: {e}")))
}

fn not_found(id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "patient".into(),
        id: id.to_string(),
    }
}

/// Pattern for `fold_case(column) LIKE ?`. Folds with the same
/// `to_lowercase` the SQL function uses.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn section_to_json<T: Serialize>(
    column: &'static str,
    section: &Option<T>,
) -> Result<Option<String>, DatabaseError> {
    section
        .as_ref()
        .map(|s| {
            serde_json::to_string(s).map_err(|e| DatabaseError::MalformedJson {
                column,
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn section_from_json<T: DeserializeOwned>(
    column: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, DatabaseError> {
    raw.map(|json| {
        serde_json::from_str(&json).map_err(|e| DatabaseError::MalformedJson {
            column,
            reason: e.to_string(),
        })
    })
    .transpose()
}

struct PatientRow {
    id: String,
    name: String,
    dob: String,
    gender: String,
    chief_complaint: String,
    complaint_duration: Option<String>,
    tongue_color: Option<String>,
    tcm_inspection: Option<String>,
    tcm_auscultation: Option<String>,
    tcm_inquiry: Option<String>,
    tcm_palpation: Option<String>,
    emotional_state: Option<String>,
    lifestyle_factors: Option<String>,
    medical_history: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        dob: row.get(2)?,
        gender: row.get(3)?,
        chief_complaint: row.get(4)?,
        complaint_duration: row.get(5)?,
        tongue_color: row.get(6)?,
        tcm_inspection: row.get(7)?,
        tcm_auscultation: row.get(8)?,
        tcm_inquiry: row.get(9)?,
        tcm_palpation: row.get(10)?,
        emotional_state: row.get(11)?,
        lifestyle_factors: row.get(12)?,
        medical_history: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.name,
        dob: NaiveDate::parse_from_str(&row.dob, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(format!("bad dob {}: {e}", row.dob)))?,
        gender: Gender::from_str(&row.gender)?,
        chief_complaint: row.chief_complaint,
        complaint_duration: row.complaint_duration,
        tongue_color: row.tongue_color,
        tcm_inspection: section_from_json("tcm_inspection", row.tcm_inspection)?,
        tcm_auscultation: section_from_json("tcm_auscultation", row.tcm_auscultation)?,
        tcm_inquiry: section_from_json("tcm_inquiry", row.tcm_inquiry)?,
        tcm_palpation: section_from_json("tcm_palpation", row.tcm_palpation)?,
        emotional_state: row.emotional_state,
        lifestyle_factors: row.lifestyle_factors,
        medical_history: row.medical_history,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
