//! Submission query functions.
//!
//! These are the transaction-scoped primitives the engine composes. None of
//! them opens or commits a transaction; callers pass the transaction in.

use atlus_types::{IdentityId, LevelId, SubmissionRecord, Timestamp};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{DbError, Result};

const SELECT_SUBMISSION: &str = "SELECT identity_id, level_id, attempts, last_submission_at,
            cooldown_until, passed, time_taken
     FROM submissions";

/// Read the record for `(identity, level)`, if one exists.
pub fn get(
    conn: &Connection,
    identity_id: IdentityId,
    level_id: LevelId,
) -> Result<Option<SubmissionRecord>> {
    let record = conn
        .query_row(
            &format!("{SELECT_SUBMISSION} WHERE identity_id = ?1 AND level_id = ?2"),
            rusqlite::params![identity_id, level_id],
            from_row,
        )
        .optional()?;
    Ok(record)
}

/// Count one adjudicated attempt and return the new attempt count.
///
/// Inserts the record with `attempts = 1` or increments the existing one;
/// the primary key keeps this to one row per pair.
pub fn record_attempt(
    conn: &Connection,
    identity_id: IdentityId,
    level_id: LevelId,
    now: Timestamp,
) -> Result<u32> {
    let attempts: i64 = conn.query_row(
        "INSERT INTO submissions (identity_id, level_id, attempts, last_submission_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT (identity_id, level_id) DO UPDATE SET
            attempts = submissions.attempts + 1,
            last_submission_at = excluded.last_submission_at
         RETURNING attempts",
        rusqlite::params![identity_id, level_id, now as i64],
        |row| row.get(0),
    )?;
    Ok(attempts as u32)
}

/// Push `cooldown_until` out to `until`. Never moves it backwards.
///
/// Returns the cooldown now in effect.
pub fn extend_cooldown(
    conn: &Connection,
    identity_id: IdentityId,
    level_id: LevelId,
    until: Timestamp,
) -> Result<Timestamp> {
    conn.query_row(
        "UPDATE submissions SET cooldown_until = MAX(COALESCE(cooldown_until, 0), ?3)
         WHERE identity_id = ?1 AND level_id = ?2
         RETURNING cooldown_until",
        rusqlite::params![identity_id, level_id, until as i64],
        |row| row.get::<_, i64>(0),
    )
    .map(|until| until as u64)
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("submission {identity_id}/{level_id}"))
        }
        other => DbError::Sqlite(other),
    })
}

/// Mark the record passed and stamp `time_taken`.
///
/// `time_taken` is `last_submission_at - release_time`. Only a record that
/// is not yet passed is touched: returns `None` when it already was.
pub fn mark_passed(
    conn: &Connection,
    identity_id: IdentityId,
    level_id: LevelId,
) -> Result<Option<u64>> {
    let time_taken = conn
        .query_row(
            "UPDATE submissions SET
                passed = 1,
                time_taken = MAX(0, last_submission_at -
                    (SELECT release_time FROM levels l WHERE l.level_id = submissions.level_id))
             WHERE identity_id = ?1 AND level_id = ?2 AND passed = 0
             RETURNING time_taken",
            rusqlite::params![identity_id, level_id],
            |row| row.get::<_, Option<i64>>(0),
        )
        .optional()?;
    Ok(time_taken.flatten().map(|t| t as u64))
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<SubmissionRecord> {
    Ok(SubmissionRecord {
        identity_id: row.get(0)?,
        level_id: row.get::<_, i64>(1)? as LevelId,
        attempts: row.get::<_, i64>(2)? as u32,
        last_submission_at: row.get::<_, i64>(3)? as u64,
        cooldown_until: row.get::<_, Option<i64>>(4)?.map(|t| t as u64),
        passed: row.get::<_, bool>(5)?,
        time_taken: row.get::<_, Option<i64>>(6)?.map(|t| t as u64),
    })
}
