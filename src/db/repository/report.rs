use rusqlite::{params, Connection};
use uuid::Uuid;

use super::patient::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::StoredReport;

pub fn insert_report(conn: &Connection, report: &StoredReport) -> Result<(), DatabaseError> {
    let titles = serde_json::to_string(&report.knowledge_titles).map_err(|e| {
        DatabaseError::MalformedJson {
            column: "knowledge_titles",
            reason: e.to_string(),
        }
    })?;
    let inserted = conn.execute(
        "INSERT INTO reports (id, patient_id, content, model, knowledge_titles, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            report.id.to_string(),
            report.patient_id.to_string(),
            report.content,
            report.model,
            titles,
            format_timestamp(&report.created_at),
        ],
    );
    match inserted {
        Ok(_) => Ok(()),
        // The patient was deleted while the report was being generated.
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Err(DatabaseError::NotFound {
                entity_type: "patient".into(),
                id: report.patient_id.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

pub fn list_reports_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<StoredReport>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, content, model, knowledge_titles, created_at
         FROM reports WHERE patient_id = ?1
         ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map(params![patient_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, patient_id, content, model, titles, created_at)| {
            Ok(StoredReport {
                id: Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                patient_id: Uuid::parse_str(&patient_id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                content,
                model,
                knowledge_titles: serde_json::from_str(&titles).map_err(|e| {
                    DatabaseError::MalformedJson {
                        column: "knowledge_titles",
                        reason: e.to_string(),
                    }
                })?,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}
