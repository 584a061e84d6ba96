//! # atlus-engine
//!
//! Submission & progression engine for the Atlus puzzle competition.
//!
//! Decides whether a submitted answer is correct, whether the participant
//! may submit at all (cooldown), how streaks and attempt counts evolve, and
//! advances the unlocked level exactly once per pass.
//!
//! ## Modules
//!
//! - [`engine`]: adjudication of a single submission
//! - [`cooldown`]: attempt-count driven back-off schedule
//! - [`resolver`]: canonical answer and puzzle input lookup
//! - [`accounts`]: identity registration and session issue for the login flow

pub mod accounts;
pub mod cooldown;
pub mod engine;
pub mod resolver;

pub use cooldown::{CooldownMode, CooldownPolicy};
pub use engine::{check_access, Engine};
pub use resolver::{
    AnswerResolver, FileAnswerResolver, FileInputResolver, ResolveError, StaticAnswerResolver,
};

use atlus_db::DbError;
use atlus_types::{InputVariantId, LevelId};

/// Why a submission could not be adjudicated.
///
/// Policy results (cooldown, pass, fail, already passed) are not errors;
/// see [`atlus_types::Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The answer was blank after trimming.
    #[error("answer must not be empty")]
    EmptyAnswer,

    /// The participant has not unlocked this level.
    #[error("level {level} is locked, complete level {current_level} first")]
    LevelLocked {
        level: LevelId,
        current_level: LevelId,
    },

    /// The level's release time has not been reached.
    #[error("level {level} is not released yet (next release: level {next_release_level})")]
    NotReleased {
        level: LevelId,
        next_release_level: LevelId,
    },

    /// The session token is unknown or expired.
    #[error("session is invalid or expired")]
    SessionInvalid,

    /// No canonical answer is provisioned for this level and variant.
    #[error("no canonical answer for level {level}, variant {input_variant_id}")]
    AnswerNotFound {
        level: LevelId,
        input_variant_id: InputVariantId,
        #[source]
        source: ResolveError,
    },

    /// The store failed; nothing was committed.
    #[error("submission could not be recorded: {0}")]
    Submission(#[from] DbError),
}

/// Broad error class, for callers choosing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before touching the store. Actionable by the participant.
    Input,
    /// The request could not be adjudicated. No progression happened.
    Infrastructure,
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyAnswer | Self::LevelLocked { .. } | Self::NotReleased { .. } => {
                ErrorKind::Input
            }
            Self::SessionInvalid | Self::AnswerNotFound { .. } | Self::Submission(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Resubmitting the same answer may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Submission(_))
    }
}

pub type Result<T> = std::result::Result<T, SubmitError>;
