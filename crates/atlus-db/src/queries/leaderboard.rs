//! Read-only leaderboard aggregations.

use atlus_types::{IdentityId, LevelId};
use rusqlite::Connection;
use serde::Serialize;

use crate::Result;

/// Top identities by streak.
pub fn by_streak(conn: &Connection, limit: u32) -> Result<Vec<StreakEntry>> {
    let mut stmt = conn.prepare(
        "SELECT username, streak, profile_url FROM users
         ORDER BY streak DESC, username ASC LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(StreakEntry {
                username: row.get(0)?,
                streak: row.get::<_, i64>(1)? as u32,
                profile_url: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Top identities by unlocked level.
pub fn by_level(conn: &Connection, limit: u32) -> Result<Vec<ChampionEntry>> {
    let mut stmt = conn.prepare(
        "SELECT username, current_level, profile_url FROM users
         ORDER BY current_level DESC, username ASC LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(ChampionEntry {
                username: row.get(0)?,
                current_level: row.get::<_, i64>(1)? as LevelId,
                profile_url: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Fastest pass of each level. Ties go to the earlier submission.
pub fn fastest_per_level(conn: &Connection, limit: u32) -> Result<Vec<FlashEntry>> {
    let mut stmt = conn.prepare(
        "SELECT level_id, username, time_taken FROM (
            SELECT s.level_id, u.username, s.time_taken,
                   ROW_NUMBER() OVER (
                       PARTITION BY s.level_id
                       ORDER BY s.time_taken ASC, s.last_submission_at ASC
                   ) AS position
            FROM submissions s
            JOIN users u ON u.identity_id = s.identity_id
            WHERE s.passed = 1
         )
         WHERE position = 1
         ORDER BY level_id LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(FlashEntry {
                level_id: row.get::<_, i64>(0)? as LevelId,
                username: row.get(1)?,
                time_taken: row.get::<_, Option<i64>>(2)?.unwrap_or(0) as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Passed levels of one identity, fastest first.
pub fn user_stats(conn: &Connection, identity_id: IdentityId) -> Result<Vec<UserStatEntry>> {
    let mut stmt = conn.prepare(
        "SELECT level_id, time_taken, attempts FROM submissions
         WHERE identity_id = ?1 AND passed = 1
         ORDER BY time_taken ASC, level_id ASC",
    )?;

    let rows = stmt
        .query_map([identity_id], |row| {
            Ok(UserStatEntry {
                level_id: row.get::<_, i64>(0)? as LevelId,
                time_taken: row.get::<_, Option<i64>>(1)?.unwrap_or(0) as u64,
                attempts: row.get::<_, i64>(2)? as u32,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakEntry {
    pub username: String,
    pub streak: u32,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChampionEntry {
    pub username: String,
    pub current_level: LevelId,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashEntry {
    pub level_id: LevelId,
    pub username: String,
    pub time_taken: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatEntry {
    pub level_id: LevelId,
    pub time_taken: u64,
    pub attempts: u32,
}
