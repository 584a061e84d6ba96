//! Result of an adjudicated (or short-circuited) submission.
//!
//! These are policy results, not errors: callers render each variant to
//! the participant. Failures that prevent adjudication live in the engine's
//! error type instead.

use serde::{Deserialize, Serialize};

use crate::{LevelId, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The level was passed earlier. Nothing was written.
    AlreadyPassed { level: LevelId },

    /// Submissions are locked until `until`.
    ///
    /// Returned without consuming an attempt while a lock is running, and
    /// for a wrong answer whose attempt armed a new lock.
    Cooldown {
        level: LevelId,
        until: Timestamp,
        attempts: u32,
    },

    /// Correct answer.
    LevelPassed {
        level: LevelId,
        attempts: u32,
        streak: u32,
        next_level: LevelId,
        /// True when this pass unlocked `next_level`.
        advanced: bool,
        time_taken: Option<u64>,
    },

    /// Wrong answer, no lock armed.
    LevelFailed {
        level: LevelId,
        attempts: u32,
        streak: u32,
    },
}

impl Outcome {
    pub fn level(&self) -> LevelId {
        match self {
            Self::AlreadyPassed { level }
            | Self::Cooldown { level, .. }
            | Self::LevelPassed { level, .. }
            | Self::LevelFailed { level, .. } => *level,
        }
    }

    /// Short name used in logs and events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AlreadyPassed { .. } => "AlreadyPassed",
            Self::Cooldown { .. } => "Cooldown",
            Self::LevelPassed { .. } => "LevelPassed",
            Self::LevelFailed { .. } => "LevelFailed",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::LevelPassed { .. })
    }
}
