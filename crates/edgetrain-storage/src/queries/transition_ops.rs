//! Append-only job transition history.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use edgetrain_core::errors::EdgeTrainResult;
use edgetrain_core::models::{JobState, JobTransitionRecord};

use super::{parse_enum, parse_ts};
use crate::to_storage_err;

const TABLE: &str = "job_transitions";

pub fn append(
    conn: &Connection,
    job_id: &str,
    from_state: Option<JobState>,
    to_state: JobState,
    detail: Option<&str>,
    recorded_at: DateTime<Utc>,
) -> EdgeTrainResult<()> {
    conn.execute(
        "INSERT INTO job_transitions (job_id, from_state, to_state, detail, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            job_id,
            from_state.map(JobState::as_str),
            to_state.as_str(),
            detail,
            recorded_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn history(conn: &Connection, job_id: &str) -> EdgeTrainResult<Vec<JobTransitionRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT job_id, from_state, to_state, detail, recorded_at
             FROM job_transitions WHERE job_id = ?1 ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![job_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
        let (job_id, from_state, to_state, detail, recorded_at) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        records.push(JobTransitionRecord {
            job_id,
            from_state: from_state
                .map(|s| parse_enum::<JobState>(TABLE, &s))
                .transpose()?,
            to_state: parse_enum(TABLE, &to_state)?,
            detail,
            recorded_at: parse_ts(TABLE, &recorded_at)?,
        });
    }
    Ok(records)
}
