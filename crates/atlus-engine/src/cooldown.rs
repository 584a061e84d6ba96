//! Cooldown back-off schedule.
//!
//! ## Modes
//!
//! - `escalating`: every third adjudicated attempt locks the level for
//!   `(attempts / 3) * step`. Attempts 1-2 are free, attempt 3 locks for one
//!   step, attempt 6 for two steps, and so on. Other attempts add no lock.
//! - `continuous`: every attempt sets the lock to `(attempts / 3) * step`
//!   from now, so attempts 4 and 5 keep the one-step lock going. A failed
//!   first attempt resets the streak to 1 instead of 0. This is the older
//!   schedule, kept selectable for competitions that ran on it.

use atlus_types::{Timestamp, ATTEMPTS_PER_COOLDOWN, DEFAULT_COOLDOWN_STEP_SECS};
use serde::{Deserialize, Serialize};

/// Which back-off schedule to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownMode {
    #[default]
    Escalating,
    Continuous,
}

/// Cooldown schedule derived purely from the attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownPolicy {
    /// Length of one cooldown step in seconds.
    pub step_secs: u64,
    pub mode: CooldownMode,
}

impl CooldownPolicy {
    /// Escalating policy with the given step.
    pub fn new(step_secs: u64) -> Self {
        Self {
            step_secs,
            mode: CooldownMode::Escalating,
        }
    }

    pub fn with_mode(mut self, mode: CooldownMode) -> Self {
        self.mode = mode;
        self
    }

    /// Lock length imposed by reaching `attempts`, or `None` if this
    /// attempt imposes no lock.
    pub fn window(&self, attempts: u32) -> Option<u64> {
        let tier = u64::from(attempts / ATTEMPTS_PER_COOLDOWN);
        match self.mode {
            CooldownMode::Escalating => (attempts > 0 && attempts % ATTEMPTS_PER_COOLDOWN == 0)
                .then(|| tier.saturating_mul(self.step_secs)),
            CooldownMode::Continuous => Some(tier.saturating_mul(self.step_secs)),
        }
    }

    /// Streak value after a failed first attempt.
    pub fn streak_reset(&self) -> u32 {
        match self.mode {
            CooldownMode::Escalating => 0,
            CooldownMode::Continuous => 1,
        }
    }

    /// Absolute end of the lock imposed by an attempt made at `now`.
    pub fn cooldown_until(&self, attempts: u32, now: Timestamp) -> Option<Timestamp> {
        self.window(attempts).map(|window| now.saturating_add(window))
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_STEP_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: u64 = 15 * 60;

    #[test]
    fn test_escalating_schedule() {
        let policy = CooldownPolicy::new(STEP);
        assert_eq!(policy.window(1), None);
        assert_eq!(policy.window(2), None);
        assert_eq!(policy.window(3), Some(STEP));
        assert_eq!(policy.window(4), None);
        assert_eq!(policy.window(5), None);
        assert_eq!(policy.window(6), Some(2 * STEP));
        assert_eq!(policy.window(9), Some(3 * STEP));
    }

    #[test]
    fn test_cooldown_until_is_relative_to_attempt_time() {
        let policy = CooldownPolicy::new(STEP);
        assert_eq!(policy.cooldown_until(3, 1_000), Some(1_000 + STEP));
        assert_eq!(policy.cooldown_until(6, 1_000), Some(1_000 + 2 * STEP));
        assert_eq!(policy.cooldown_until(2, 1_000), None);
    }

    #[test]
    fn test_continuous_schedule() {
        let policy = CooldownPolicy::new(STEP).with_mode(CooldownMode::Continuous);
        assert_eq!(policy.window(1), Some(0));
        assert_eq!(policy.window(3), Some(STEP));
        assert_eq!(policy.window(4), Some(STEP));
        assert_eq!(policy.window(6), Some(2 * STEP));
    }

    #[test]
    fn test_streak_reset_by_mode() {
        assert_eq!(CooldownPolicy::new(STEP).streak_reset(), 0);
        let continuous = CooldownPolicy::new(STEP).with_mode(CooldownMode::Continuous);
        assert_eq!(continuous.streak_reset(), 1);
    }

    #[test]
    fn test_zero_step_never_locks() {
        let policy = CooldownPolicy::new(0);
        assert_eq!(policy.cooldown_until(3, 500), Some(500));
    }

    #[test]
    fn test_default_policy() {
        let policy = CooldownPolicy::default();
        assert_eq!(policy.step_secs, STEP);
        assert_eq!(policy.mode, CooldownMode::Escalating);
    }

    #[test]
    fn test_mode_deserializes_snake_case() {
        let mode: CooldownMode = serde_json::from_str("\"continuous\"").expect("parse");
        assert_eq!(mode, CooldownMode::Continuous);
    }
}
