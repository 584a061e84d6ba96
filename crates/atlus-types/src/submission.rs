//! Per-identity, per-level submission record.

use serde::{Deserialize, Serialize};

use crate::{IdentityId, LevelId, Timestamp};

/// The aggregate record of every adjudicated attempt for one
/// `(identity, level)` pair. At most one exists per pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub identity_id: IdentityId,
    pub level_id: LevelId,
    pub attempts: u32,
    pub last_submission_at: Timestamp,
    pub cooldown_until: Option<Timestamp>,
    pub passed: bool,
    /// Seconds from level release to the passing submission.
    pub time_taken: Option<u64>,
}

impl SubmissionRecord {
    /// The state of a pair that has never been adjudicated.
    pub fn unattempted(identity_id: IdentityId, level_id: LevelId) -> Self {
        Self {
            identity_id,
            level_id,
            attempts: 0,
            last_submission_at: 0,
            cooldown_until: None,
            passed: false,
            time_taken: None,
        }
    }

    /// Whether a cooldown is still running at `now`.
    pub fn in_cooldown(&self, now: Timestamp) -> bool {
        self.cooldown_until.is_some_and(|until| until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unattempted_defaults() {
        let record = SubmissionRecord::unattempted(1, 2);
        assert_eq!(record.attempts, 0);
        assert!(!record.passed);
        assert!(!record.in_cooldown(0));
    }

    #[test]
    fn test_cooldown_ends_at_deadline() {
        let mut record = SubmissionRecord::unattempted(1, 2);
        record.cooldown_until = Some(1_000);
        assert!(record.in_cooldown(999));
        assert!(!record.in_cooldown(1_000));
    }
}
