//! Submission adjudication and progression.
//!
//! Every adjudication runs in one `BEGIN IMMEDIATE` transaction. The
//! immediate lock serializes writers before the submission record is read,
//! so two concurrent submissions for the same `(identity, level)` can never
//! both observe the pre-write state. Any error drops the transaction, which
//! rolls back the attempt, cooldown, streak and level changes together.

use atlus_db::queries::{sessions, submissions, users};
use atlus_db::DbError;
use atlus_types::{LevelId, Outcome, Snapshot, SubmissionRecord, Timestamp};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::cooldown::CooldownPolicy;
use crate::resolver::AnswerResolver;
use crate::{Result, SubmitError};

/// The submission and progression engine.
///
/// Holds no per-request state; share one instance across all requests and
/// give each request its own connection.
#[derive(Debug, Clone)]
pub struct Engine<R> {
    resolver: R,
    cooldown: CooldownPolicy,
}

impl<R: AnswerResolver> Engine<R> {
    pub fn new(resolver: R, cooldown: CooldownPolicy) -> Self {
        Self { resolver, cooldown }
    }

    pub fn cooldown_policy(&self) -> &CooldownPolicy {
        &self.cooldown
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Resolve a session token into a progression snapshot.
    pub fn snapshot(&self, conn: &Connection, session_token: &str, now: Timestamp) -> Result<Snapshot> {
        sessions::snapshot(conn, session_token, now).map_err(|e| match e {
            DbError::NotFound(_) => SubmitError::SessionInvalid,
            other => SubmitError::Submission(other),
        })
    }

    /// Look up the session, then evaluate the submission against it.
    pub fn submit(
        &self,
        conn: &mut Connection,
        session_token: &str,
        level: LevelId,
        answer: &str,
        now: Timestamp,
    ) -> Result<Outcome> {
        let snapshot = self.snapshot(conn, session_token, now)?;
        self.evaluate(conn, &snapshot, level, answer, now)
    }

    /// Adjudicate one answer for `level` on behalf of `snapshot`.
    ///
    /// Precondition failures return before any transaction opens. Storage
    /// failures leave the store untouched and are safe to retry by
    /// resubmitting the same answer.
    pub fn evaluate(
        &self,
        conn: &mut Connection,
        snapshot: &Snapshot,
        level: LevelId,
        answer: &str,
        now: Timestamp,
    ) -> Result<Outcome> {
        let answer = check_preconditions(snapshot, level, answer)?;

        let canonical = self
            .resolver
            .resolve(level, snapshot.input_variant_id)
            .map_err(|source| {
                warn!(
                    level,
                    input_variant_id = snapshot.input_variant_id,
                    error = %source,
                    "Canonical answer unavailable"
                );
                SubmitError::AnswerNotFound {
                    level,
                    input_variant_id: snapshot.input_variant_id,
                    source,
                }
            })?;
        let correct = answer == canonical.trim();

        let result = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)
            .and_then(|tx| self.adjudicate(tx, snapshot, level, correct, now));

        match result {
            Ok(outcome) => {
                debug!(
                    identity_id = snapshot.identity_id,
                    level,
                    outcome = outcome.name(),
                    "Submission adjudicated"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    identity_id = snapshot.identity_id,
                    level,
                    busy = e.is_busy(),
                    error = %e,
                    "Submission rolled back"
                );
                Err(SubmitError::Submission(e))
            }
        }
    }

    /// The decision steps. Commits only on paths that wrote.
    fn adjudicate(
        &self,
        tx: Transaction<'_>,
        snapshot: &Snapshot,
        level: LevelId,
        correct: bool,
        now: Timestamp,
    ) -> atlus_db::Result<Outcome> {
        let identity_id = snapshot.identity_id;

        let record = submissions::get(&tx, identity_id, level)?
            .unwrap_or_else(|| SubmissionRecord::unattempted(identity_id, level));

        if record.passed {
            return Ok(Outcome::AlreadyPassed { level });
        }
        if let Some(until) = record.cooldown_until.filter(|_| record.in_cooldown(now)) {
            return Ok(Outcome::Cooldown {
                level,
                until,
                attempts: record.attempts,
            });
        }

        let attempts = submissions::record_attempt(&tx, identity_id, level, now)?;
        let lock = match self.cooldown.cooldown_until(attempts, now) {
            Some(until) => Some(submissions::extend_cooldown(&tx, identity_id, level, until)?),
            None => None,
        };
        let first_attempt = attempts == 1;

        let outcome = if correct {
            let streak = if first_attempt {
                users::increment_streak(&tx, identity_id)?
            } else {
                users::streak(&tx, identity_id)?
            };
            let time_taken = submissions::mark_passed(&tx, identity_id, level)?;
            let advanced = level == snapshot.current_level
                && users::advance_level(&tx, identity_id, level)?;
            if advanced {
                info!(
                    identity_id,
                    username = %snapshot.username,
                    level = level + 1,
                    "Advanced to next level"
                );
            }
            Outcome::LevelPassed {
                level,
                attempts,
                streak,
                next_level: level + 1,
                advanced,
                time_taken,
            }
        } else {
            let streak = if first_attempt {
                let reset = self.cooldown.streak_reset();
                users::reset_streak(&tx, identity_id, reset)?;
                reset
            } else {
                users::streak(&tx, identity_id)?
            };
            match lock.filter(|until| *until > now) {
                Some(until) => Outcome::Cooldown {
                    level,
                    until,
                    attempts,
                },
                None => Outcome::LevelFailed {
                    level,
                    attempts,
                    streak,
                },
            }
        };

        tx.commit()?;
        Ok(outcome)
    }
}

/// Reject submissions that must not reach the store. Returns the trimmed answer.
fn check_preconditions<'a>(snapshot: &Snapshot, level: LevelId, answer: &'a str) -> Result<&'a str> {
    check_access(snapshot, level)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(SubmitError::EmptyAnswer);
    }
    Ok(answer)
}

/// Whether `snapshot` may see `level` at all: released, then unlocked.
///
/// Gates both puzzle inputs and submissions.
pub fn check_access(snapshot: &Snapshot, level: LevelId) -> Result<()> {
    if !snapshot.is_released(level) {
        return Err(SubmitError::NotReleased {
            level,
            next_release_level: snapshot.next_release_level,
        });
    }
    if !snapshot.is_unlocked(level) {
        return Err(SubmitError::LevelLocked {
            level,
            current_level: snapshot.current_level,
        });
    }
    Ok(())
}
