//! Level metadata query functions.

use atlus_types::{Level, LevelId, Timestamp};
use rusqlite::Connection;

use crate::{DbError, Result};

/// Insert or move a level's release time.
pub fn upsert(conn: &Connection, level_id: LevelId, release_time: Timestamp) -> Result<()> {
    conn.execute(
        "INSERT INTO levels (level_id, release_time) VALUES (?1, ?2)
         ON CONFLICT (level_id) DO UPDATE SET release_time = excluded.release_time",
        rusqlite::params![level_id, release_time as i64],
    )?;
    Ok(())
}

/// Insert levels `1..=count`, one every `interval` seconds from `first_release`.
///
/// Levels that already exist are left untouched. Returns the number inserted.
pub fn seed_schedule(
    conn: &Connection,
    first_release: Timestamp,
    interval: u64,
    count: LevelId,
) -> Result<usize> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO levels (level_id, release_time) VALUES (?1, ?2)")?;

    let mut inserted = 0;
    for level_id in 1..=count {
        let release_time = first_release + u64::from(level_id - 1) * interval;
        inserted += stmt.execute(rusqlite::params![level_id, release_time as i64])?;
    }
    Ok(inserted)
}

/// Get a level by id.
pub fn get(conn: &Connection, level_id: LevelId) -> Result<Level> {
    conn.query_row(
        "SELECT level_id, release_time FROM levels WHERE level_id = ?1",
        [level_id],
        |row| {
            Ok(Level {
                level_id: row.get::<_, i64>(0)? as LevelId,
                release_time: row.get::<_, i64>(1)? as u64,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("level {level_id}")),
        other => DbError::Sqlite(other),
    })
}

/// List all levels in order.
pub fn list(conn: &Connection) -> Result<Vec<Level>> {
    let mut stmt = conn.prepare("SELECT level_id, release_time FROM levels ORDER BY level_id")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Level {
                level_id: row.get::<_, i64>(0)? as LevelId,
                release_time: row.get::<_, i64>(1)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// The lowest level not yet released at `now`.
///
/// When every level is out this is one past the last level, so nothing
/// beyond the seeded set ever counts as released.
pub fn next_release_level(conn: &Connection, now: Timestamp) -> Result<LevelId> {
    let level: i64 = conn.query_row(
        "SELECT COALESCE(
            (SELECT MIN(level_id) FROM levels WHERE release_time > ?1),
            (SELECT COALESCE(MAX(level_id), 0) + 1 FROM levels)
         )",
        [now as i64],
        |row| row.get(0),
    )?;
    Ok(level as LevelId)
}
