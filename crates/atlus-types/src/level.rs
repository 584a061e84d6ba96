//! Level metadata and URL slugs.

use serde::{Deserialize, Serialize};

use crate::{LevelId, Timestamp};

/// A puzzle level and the time it becomes playable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub level_id: LevelId,
    pub release_time: Timestamp,
}

impl Level {
    pub fn is_released(&self, now: Timestamp) -> bool {
        now >= self.release_time
    }
}

/// Errors parsing a `level<N>` slug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("slug {0:?} does not start with \"level\"")]
    MissingPrefix(String),

    #[error("slug {0:?} does not end in a level number")]
    InvalidNumber(String),
}

const SLUG_PREFIX: &str = "level";

/// Parse a `level<N>` slug into a level id. Level 0 is not a level.
pub fn parse_level_slug(slug: &str) -> Result<LevelId, SlugError> {
    let digits = slug
        .strip_prefix(SLUG_PREFIX)
        .ok_or_else(|| SlugError::MissingPrefix(slug.to_string()))?;
    match digits.parse::<LevelId>() {
        Ok(level) if level > 0 => Ok(level),
        _ => Err(SlugError::InvalidNumber(slug.to_string())),
    }
}

/// Render the slug for a level id.
pub fn level_slug(level: LevelId) -> String {
    format!("{SLUG_PREFIX}{level}")
}
