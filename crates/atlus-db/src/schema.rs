//! SQL schema definitions.

/// Complete schema for the v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Identities & Sessions
-- ============================================================

CREATE TABLE IF NOT EXISTS users (
    identity_id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    profile_url TEXT NOT NULL DEFAULT '',
    avatar_url TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    input_variant_id INTEGER NOT NULL,
    current_level INTEGER NOT NULL DEFAULT 1 CHECK (current_level >= 1),
    streak INTEGER NOT NULL DEFAULT 0 CHECK (streak >= 0),
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    session_token TEXT PRIMARY KEY,
    identity_id INTEGER NOT NULL UNIQUE REFERENCES users(identity_id) ON DELETE CASCADE,
    input_variant_id INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

-- ============================================================
-- Levels & Submissions
-- ============================================================

CREATE TABLE IF NOT EXISTS levels (
    level_id INTEGER PRIMARY KEY CHECK (level_id >= 1),
    release_time INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS submissions (
    identity_id INTEGER NOT NULL REFERENCES users(identity_id) ON DELETE CASCADE,
    level_id INTEGER NOT NULL REFERENCES levels(level_id),
    attempts INTEGER NOT NULL CHECK (attempts >= 1),
    last_submission_at INTEGER NOT NULL,
    cooldown_until INTEGER,
    passed INTEGER NOT NULL DEFAULT 0,
    time_taken INTEGER,
    PRIMARY KEY (identity_id, level_id)
);

CREATE INDEX IF NOT EXISTS idx_submissions_passed ON submissions(level_id, time_taken) WHERE passed = 1;
"#;
