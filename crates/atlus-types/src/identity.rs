//! Identity and session structures.

use serde::{Deserialize, Serialize};

use crate::{IdentityId, InputVariantId, LevelId, Timestamp};

/// A registered participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub identity_id: IdentityId,
    pub username: String,
    pub profile_url: String,
    pub avatar_url: String,
    pub email: String,
    /// Assigned once at registration, never changed.
    pub input_variant_id: InputVariantId,
    /// Highest unlocked level. Only moves forward.
    pub current_level: LevelId,
    /// Consecutive levels passed on the first attempt.
    pub streak: u32,
    pub created_at: Timestamp,
}

/// Profile fields supplied by the login flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub identity_id: IdentityId,
    pub username: String,
    #[serde(default)]
    pub profile_url: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub email: String,
}

/// An opaque login session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_token: String,
    pub identity_id: IdentityId,
    pub input_variant_id: InputVariantId,
    pub expires_at: Timestamp,
}

impl Session {
    /// True once `now` has reached the expiry time.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Progression state handed to the engine for a single request.
///
/// The engine trusts `identity_id`, `current_level` and `input_variant_id`
/// as given; it never authenticates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub identity_id: IdentityId,
    pub username: String,
    pub current_level: LevelId,
    pub streak: u32,
    pub input_variant_id: InputVariantId,
    /// Lowest level that is not released yet.
    pub next_release_level: LevelId,
}

impl Snapshot {
    /// Whether `level` has been released.
    pub fn is_released(&self, level: LevelId) -> bool {
        level < self.next_release_level
    }

    /// Whether `level` has been unlocked for this identity.
    pub fn is_unlocked(&self, level: LevelId) -> bool {
        level <= self.current_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(current_level: LevelId, next_release_level: LevelId) -> Snapshot {
        Snapshot {
            identity_id: 42,
            username: "octocat".into(),
            current_level,
            streak: 0,
            input_variant_id: 1,
            next_release_level,
        }
    }

    #[test]
    fn test_release_boundary_is_exclusive() {
        let s = snapshot(3, 4);
        assert!(s.is_released(3));
        assert!(!s.is_released(4));
    }

    #[test]
    fn test_unlock_boundary_is_inclusive() {
        let s = snapshot(3, 10);
        assert!(s.is_unlocked(1));
        assert!(s.is_unlocked(3));
        assert!(!s.is_unlocked(4));
    }

    #[test]
    fn test_session_expiry() {
        let session = Session {
            session_token: "abc".into(),
            identity_id: 1,
            input_variant_id: 2,
            expires_at: 1000,
        };
        assert!(!session.is_expired(999));
        assert!(session.is_expired(1000));
    }

    #[test]
    fn test_profile_defaults_optional_fields() {
        let profile: Profile =
            serde_json::from_str(r#"{"identity_id": 7, "username": "mona"}"#).expect("parse");
        assert_eq!(profile.identity_id, 7);
        assert!(profile.email.is_empty());
    }
}
