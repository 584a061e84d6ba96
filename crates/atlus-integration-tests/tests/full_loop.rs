//! Integration test: full participant lifecycle.
//!
//! Exercises the login -> submit -> progress -> leaderboard pipeline:
//! 1. Seed a release schedule and provision answer artifacts on disk
//! 2. Register two participants and issue sessions
//! 3. Fail, get locked out by the cooldown, wait it out and pass
//! 4. Pass a level first time to build a streak
//! 5. Hit the release frontier
//! 6. Read the leaderboards and log out
//!
//! Uses the library crates against a file-backed database, without a
//! running daemon process.

use std::path::Path;

use atlus_db::queries::{leaderboard, levels, sessions, users};
use atlus_engine::accounts::{self, SessionSettings};
use atlus_engine::{CooldownPolicy, Engine, FileAnswerResolver, SubmitError};
use atlus_types::{level_slug, LevelId, Outcome, Profile, Timestamp};

/// Simulated competition start.
const START: Timestamp = 1_700_000_000;

/// One level per day.
const DAY: u64 = 24 * 60 * 60;

const STEP: u64 = 15 * 60;

fn write_artifact(root: &Path, level: LevelId, variant: u32, output: &str) {
    let dir = root.join(level_slug(level)).join("problem_set");
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(
        dir.join(format!("{variant}.json")),
        format!(r#"{{"input": "{level} {variant}", "output": "{output}"}}"#),
    )
    .expect("write artifact");
}

fn profile(identity_id: i64, username: &str) -> Profile {
    Profile {
        identity_id,
        username: username.into(),
        profile_url: format!("https://example.com/{username}"),
        ..Profile::default()
    }
}

#[test]
fn full_lifecycle_login_to_leaderboard() {
    // =========================================================
    // Step 1: Schedule and artifacts
    // =========================================================
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("atlus.db");
    let puzzles = dir.path().join("puzzles");

    let mut conn = atlus_db::open(&db_path).expect("open db");
    let seeded = levels::seed_schedule(&conn, START, DAY, 5).expect("seed");
    assert_eq!(seeded, 5);

    for level in 1..=5 {
        for variant in 1..=2 {
            write_artifact(&puzzles, level, variant, &format!("L{level}V{variant}"));
        }
    }

    let engine = Engine::new(FileAnswerResolver::new(&puzzles), CooldownPolicy::new(STEP));

    // =========================================================
    // Step 2: Register participants
    // =========================================================
    let settings = SessionSettings {
        ttl_secs: 30 * DAY,
        input_variants: 2,
    };
    let alice = accounts::register(&mut conn, &profile(1, "alice"), &settings, START)
        .expect("register alice");
    let bob = accounts::register(&mut conn, &profile(2, "bob"), &settings, START)
        .expect("register bob");
    assert_ne!(alice.identity.input_variant_id, bob.identity.input_variant_id);

    let alice_answer = |level: LevelId| format!("L{level}V{}", alice.identity.input_variant_id);
    let bob_answer = |level: LevelId| format!("L{level}V{}", bob.identity.input_variant_id);
    let alice_token = alice.session.session_token.as_str();
    let bob_token = bob.session.session_token.as_str();

    // =========================================================
    // Step 3: Alice fails three times, waits, then passes
    // =========================================================
    let mut now = START + 600;
    for expected in 1..=2 {
        let outcome = engine
            .submit(&mut conn, alice_token, 1, "guess", now)
            .expect("submit");
        assert!(matches!(outcome, Outcome::LevelFailed { attempts, .. } if attempts == expected));
        now += 10;
    }

    let outcome = engine
        .submit(&mut conn, alice_token, 1, "guess", now)
        .expect("submit");
    let until = match outcome {
        Outcome::Cooldown { until, attempts: 3, .. } => until,
        other => panic!("expected cooldown, got {other:?}"),
    };
    assert_eq!(until, now + STEP);

    // A correct answer during the lock is refused and not counted.
    let outcome = engine
        .submit(&mut conn, alice_token, 1, &alice_answer(1), now + 60)
        .expect("submit");
    assert!(matches!(outcome, Outcome::Cooldown { attempts: 3, .. }));

    now = until;
    let outcome = engine
        .submit(&mut conn, alice_token, 1, &alice_answer(1), now)
        .expect("submit");
    assert_eq!(
        outcome,
        Outcome::LevelPassed {
            level: 1,
            attempts: 4,
            streak: 0,
            next_level: 2,
            advanced: true,
            time_taken: Some(now - START),
        }
    );

    // =========================================================
    // Step 4: Bob passes level 1 and 2 first time
    // =========================================================
    now = START + 2 * DAY;
    for level in 1..=2 {
        let outcome = engine
            .submit(&mut conn, bob_token, level, &bob_answer(level), now)
            .expect("submit");
        assert!(matches!(outcome, Outcome::LevelPassed { streak, .. } if streak == level));
    }

    // Someone else's answer is wrong for bob's variant.
    let outcome = engine
        .submit(&mut conn, bob_token, 3, &alice_answer(3), now)
        .expect("submit");
    assert!(matches!(outcome, Outcome::LevelFailed { streak: 0, .. }));

    // =========================================================
    // Step 5: Release frontier
    // =========================================================
    let err = engine
        .submit(&mut conn, bob_token, 4, &bob_answer(4), now)
        .expect_err("level 4 not released");
    assert!(matches!(
        err,
        SubmitError::NotReleased {
            level: 4,
            next_release_level: 4
        }
    ));

    let err = engine
        .submit(&mut conn, alice_token, 3, &alice_answer(3), now)
        .expect_err("level 3 locked for alice");
    assert!(matches!(err, SubmitError::LevelLocked { current_level: 2, .. }));

    // =========================================================
    // Step 6: Leaderboards, logout
    // =========================================================
    let champions = leaderboard::by_level(&conn, 10).expect("champions");
    assert_eq!(champions[0].username, "bob");
    assert_eq!(champions[0].current_level, 3);

    let flash = leaderboard::fastest_per_level(&conn, 10).expect("flash");
    assert_eq!(flash[0].level_id, 1);
    assert_eq!(flash[0].username, "alice");

    let stats = leaderboard::user_stats(&conn, 2).expect("stats");
    assert_eq!(stats.len(), 2);

    assert!(accounts::logout(&conn, bob_token).expect("logout"));
    let err = engine
        .submit(&mut conn, bob_token, 3, &bob_answer(3), now)
        .expect_err("session gone");
    assert!(matches!(err, SubmitError::SessionInvalid));

    assert_eq!(users::get(&conn, 1).expect("alice").current_level, 2);
    assert_eq!(
        sessions::purge_expired(&conn, START + 31 * DAY).expect("purge"),
        1
    );
}
