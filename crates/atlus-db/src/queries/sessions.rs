//! Session query functions.

use atlus_types::{IdentityId, InputVariantId, LevelId, Session, Snapshot, Timestamp};
use rusqlite::Connection;

use crate::queries::levels;
use crate::{DbError, Result};

/// Create a session for an identity, replacing any session it already has.
///
/// The session copies the identity's `input_variant_id`.
pub fn create(
    conn: &Connection,
    identity_id: IdentityId,
    session_token: &str,
    expires_at: Timestamp,
) -> Result<Session> {
    let inserted = conn.execute(
        "INSERT INTO sessions (session_token, identity_id, input_variant_id, expires_at)
         SELECT ?1, identity_id, input_variant_id, ?3 FROM users WHERE identity_id = ?2
         ON CONFLICT (identity_id) DO UPDATE SET
            session_token = excluded.session_token,
            input_variant_id = excluded.input_variant_id,
            expires_at = excluded.expires_at",
        rusqlite::params![session_token, identity_id, expires_at as i64],
    )?;
    if inserted == 0 {
        return Err(DbError::NotFound(format!("identity {identity_id}")));
    }
    get(conn, session_token)
}

/// Get a session by token, whether or not it has expired.
pub fn get(conn: &Connection, session_token: &str) -> Result<Session> {
    conn.query_row(
        "SELECT session_token, identity_id, input_variant_id, expires_at
         FROM sessions WHERE session_token = ?1",
        [session_token],
        |row| {
            Ok(Session {
                session_token: row.get(0)?,
                identity_id: row.get(1)?,
                input_variant_id: row.get::<_, i64>(2)? as InputVariantId,
                expires_at: row.get::<_, i64>(3)? as u64,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("session".into()),
        other => DbError::Sqlite(other),
    })
}

/// Resolve a live session into the progression snapshot the engine consumes.
pub fn snapshot(conn: &Connection, session_token: &str, now: Timestamp) -> Result<Snapshot> {
    let (identity_id, username, current_level, streak, input_variant_id) = conn
        .query_row(
            "SELECT u.identity_id, u.username, u.current_level, u.streak, s.input_variant_id
             FROM sessions s
             JOIN users u ON u.identity_id = s.identity_id
             WHERE s.session_token = ?1 AND s.expires_at > ?2",
            rusqlite::params![session_token, now as i64],
            |row| {
                Ok((
                    row.get::<_, IdentityId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? as LevelId,
                    row.get::<_, i64>(3)? as u32,
                    row.get::<_, i64>(4)? as InputVariantId,
                ))
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("session".into()),
            other => DbError::Sqlite(other),
        })?;

    Ok(Snapshot {
        identity_id,
        username,
        current_level,
        streak,
        input_variant_id,
        next_release_level: levels::next_release_level(conn, now)?,
    })
}

/// Delete a session (logout). Returns whether a session existed.
pub fn delete(conn: &Connection, session_token: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE session_token = ?1",
        [session_token],
    )?;
    Ok(deleted > 0)
}

/// Remove every session that expired at or before `now`.
pub fn purge_expired(conn: &Connection, now: Timestamp) -> Result<usize> {
    let purged = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        [now as i64],
    )?;
    Ok(purged)
}
