//! # atlus-types
//!
//! Shared domain types used across the Atlus workspace: identities,
//! sessions, levels, submission records and the adjudication outcome.
//!
//! All timestamps are Unix epoch seconds and all durations are seconds.

pub mod identity;
pub mod level;
pub mod outcome;
pub mod submission;

pub use identity::{Identity, Profile, Session, Snapshot};
pub use level::{level_slug, parse_level_slug, Level, SlugError};
pub use outcome::Outcome;
pub use submission::SubmissionRecord;

/// Stable external account id of a participant.
pub type IdentityId = i64;
/// Ordinal id of a puzzle level. Levels start at 1.
pub type LevelId = u32;
/// Which input/answer variant an identity receives.
pub type InputVariantId = u32;
/// Unix epoch seconds.
pub type Timestamp = u64;

/// The level every new identity starts on.
pub const FIRST_LEVEL: LevelId = 1;

/// Number of adjudicated attempts between cooldown windows.
pub const ATTEMPTS_PER_COOLDOWN: u32 = 3;

/// Default cooldown step (15 minutes).
pub const DEFAULT_COOLDOWN_STEP_SECS: u64 = 15 * 60;

/// Default session lifetime (30 days).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;
