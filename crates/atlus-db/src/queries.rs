//! Database query functions organized by domain.

pub mod leaderboard;
pub mod levels;
pub mod sessions;
pub mod submissions;
pub mod users;
