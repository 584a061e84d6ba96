//! Identity query functions.
//!
//! Profile fields belong to the login flow; `current_level` and `streak`
//! are only changed from inside a submission transaction.

use atlus_types::{Identity, IdentityId, InputVariantId, LevelId, Profile, Timestamp};
use rusqlite::{Connection, Row};

use crate::{DbError, Result};

const SELECT_USER: &str = "SELECT identity_id, username, profile_url, avatar_url, email,
            input_variant_id, current_level, streak, created_at
     FROM users";

/// Create the identity on first login, or refresh its profile fields.
///
/// A new identity gets `input_variant_id = (user count % variants) + 1`.
/// Existing identities keep their variant, level and streak.
pub fn upsert_profile(
    conn: &Connection,
    profile: &Profile,
    input_variants: u32,
    now: Timestamp,
) -> Result<Identity> {
    conn.execute(
        "INSERT INTO users (identity_id, username, profile_url, avatar_url, email,
                            input_variant_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, (SELECT COUNT(*) FROM users) % ?6 + 1, ?7)
         ON CONFLICT (identity_id) DO UPDATE SET
            username = excluded.username,
            profile_url = excluded.profile_url,
            avatar_url = excluded.avatar_url,
            email = excluded.email",
        rusqlite::params![
            profile.identity_id,
            profile.username,
            profile.profile_url,
            profile.avatar_url,
            profile.email,
            input_variants.max(1),
            now as i64,
        ],
    )?;
    get(conn, profile.identity_id)
}

/// Get an identity by id.
pub fn get(conn: &Connection, identity_id: IdentityId) -> Result<Identity> {
    conn.query_row(
        &format!("{SELECT_USER} WHERE identity_id = ?1"),
        [identity_id],
        from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("identity {identity_id}"))
        }
        other => DbError::Sqlite(other),
    })
}

/// Increment the streak and return the new value.
pub fn increment_streak(conn: &Connection, identity_id: IdentityId) -> Result<u32> {
    conn.query_row(
        "UPDATE users SET streak = streak + 1 WHERE identity_id = ?1 RETURNING streak",
        [identity_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|streak| streak as u32)
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("identity {identity_id}"))
        }
        other => DbError::Sqlite(other),
    })
}

/// Reset the streak to `to`.
pub fn reset_streak(conn: &Connection, identity_id: IdentityId, to: u32) -> Result<()> {
    let updated = conn.execute(
        "UPDATE users SET streak = ?2 WHERE identity_id = ?1",
        rusqlite::params![identity_id, to],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("identity {identity_id}")));
    }
    Ok(())
}

/// Read the current streak.
pub fn streak(conn: &Connection, identity_id: IdentityId) -> Result<u32> {
    get(conn, identity_id).map(|identity| identity.streak)
}

/// Move the identity from `from_level` to `from_level + 1`.
///
/// Returns `false` without writing when the identity is no longer on
/// `from_level`, so a stale snapshot can never advance twice.
pub fn advance_level(
    conn: &Connection,
    identity_id: IdentityId,
    from_level: LevelId,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE users SET current_level = current_level + 1
         WHERE identity_id = ?1 AND current_level = ?2",
        rusqlite::params![identity_id, from_level],
    )?;
    Ok(updated == 1)
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Identity> {
    Ok(Identity {
        identity_id: row.get(0)?,
        username: row.get(1)?,
        profile_url: row.get(2)?,
        avatar_url: row.get(3)?,
        email: row.get(4)?,
        input_variant_id: row.get::<_, i64>(5)? as InputVariantId,
        current_level: row.get::<_, i64>(6)? as LevelId,
        streak: row.get::<_, i64>(7)? as u32,
        created_at: row.get::<_, i64>(8)? as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn profile(identity_id: IdentityId, username: &str) -> Profile {
        Profile {
            identity_id,
            username: username.to_string(),
            profile_url: format!("https://github.com/{username}"),
            avatar_url: String::new(),
            email: format!("{username}@example.com"),
        }
    }

    #[test]
    fn test_new_identity_defaults() {
        let conn = test_db();
        let identity = upsert_profile(&conn, &profile(42, "octocat"), 4, 1000).expect("upsert");

        assert_eq!(identity.username, "octocat");
        assert_eq!(identity.current_level, 1);
        assert_eq!(identity.streak, 0);
        assert_eq!(identity.input_variant_id, 1);
        assert_eq!(identity.created_at, 1000);
    }

    #[test]
    fn test_variants_assigned_round_robin() {
        let conn = test_db();
        let variants: Vec<u32> = (1..=5)
            .map(|id| {
                upsert_profile(&conn, &profile(id, &format!("user{id}")), 2, 1000)
                    .expect("upsert")
                    .input_variant_id
            })
            .collect();
        assert_eq!(variants, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_relogin_keeps_progression() {
        let conn = test_db();
        upsert_profile(&conn, &profile(42, "octocat"), 4, 1000).expect("upsert");
        increment_streak(&conn, 42).expect("streak");
        assert!(advance_level(&conn, 42, 1).expect("advance"));

        let renamed = upsert_profile(&conn, &profile(42, "monalisa"), 4, 5000).expect("upsert");
        assert_eq!(renamed.username, "monalisa");
        assert_eq!(renamed.current_level, 2);
        assert_eq!(renamed.streak, 1);
        assert_eq!(renamed.created_at, 1000);
        assert_eq!(renamed.input_variant_id, 1);
    }

    #[test]
    fn test_streak_increment_and_reset() {
        let conn = test_db();
        upsert_profile(&conn, &profile(1, "a"), 1, 0).expect("upsert");

        assert_eq!(increment_streak(&conn, 1).expect("inc"), 1);
        assert_eq!(increment_streak(&conn, 1).expect("inc"), 2);
        reset_streak(&conn, 1, 0).expect("reset");
        assert_eq!(streak(&conn, 1).expect("streak"), 0);
    }

    #[test]
    fn test_advance_level_is_guarded() {
        let conn = test_db();
        upsert_profile(&conn, &profile(1, "a"), 1, 0).expect("upsert");

        assert!(advance_level(&conn, 1, 1).expect("advance"));
        // A second caller holding the old snapshot must not advance again.
        assert!(!advance_level(&conn, 1, 1).expect("stale advance"));
        assert_eq!(get(&conn, 1).expect("get").current_level, 2);
    }

    #[test]
    fn test_missing_identity() {
        let conn = test_db();
        assert!(matches!(get(&conn, 9), Err(DbError::NotFound(_))));
        assert!(matches!(increment_streak(&conn, 9), Err(DbError::NotFound(_))));
        assert!(matches!(reset_streak(&conn, 9, 0), Err(DbError::NotFound(_))));
    }
}
