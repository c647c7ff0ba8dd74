use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// Record one API access.
pub fn insert_audit_entry(
    conn: &Connection,
    timestamp: &str,
    client_id: &str,
    action: &str,
    status: u16,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (timestamp, client_id, action, status) VALUES (?1, ?2, ?3, ?4)",
        params![timestamp, client_id, action, status],
    )?;
    Ok(())
}

pub fn count_audit_entries(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
    Ok(count)
}

/// Most recent entries as (timestamp, client_id, action, status).
pub fn recent_audit_entries(
    conn: &Connection,
    limit: u32,
) -> Result<Vec<(String, String, String, u16)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, client_id, action, status FROM audit_log
         ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u16>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
