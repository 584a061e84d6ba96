//! Login-side identity and session bookkeeping.
//!
//! The login flow itself (OAuth, cookies) happens elsewhere; once it has a
//! verified profile it calls [`register`] to create or refresh the identity
//! and issue a session token.

use atlus_db::queries::{sessions, users};
use atlus_types::{Identity, Profile, Session, Timestamp, DEFAULT_SESSION_TTL_SECS};
use rand::RngCore;
use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

/// Random bytes in a session token (hex encoded to twice as many chars).
pub const SESSION_TOKEN_BYTES: usize = 24;

/// How sessions and input variants are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub ttl_secs: u64,
    /// Number of distinct input variants per level.
    pub input_variants: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
            input_variants: 1,
        }
    }
}

/// Identity and fresh session issued at login.
#[derive(Debug, Clone)]
pub struct Registration {
    pub identity: Identity,
    pub session: Session,
}

/// Generate an opaque session token.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Create or refresh the identity for `profile` and replace its session.
pub fn register(
    conn: &mut Connection,
    profile: &Profile,
    settings: &SessionSettings,
    now: Timestamp,
) -> atlus_db::Result<Registration> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let identity = users::upsert_profile(&tx, profile, settings.input_variants, now)?;
    let session = sessions::create(
        &tx,
        identity.identity_id,
        &new_session_token(),
        now.saturating_add(settings.ttl_secs),
    )?;
    tx.commit()?;

    info!(
        identity_id = identity.identity_id,
        username = %identity.username,
        input_variant_id = identity.input_variant_id,
        "Session issued"
    );

    Ok(Registration { identity, session })
}

/// End a session. Returns whether it existed.
pub fn logout(conn: &Connection, session_token: &str) -> atlus_db::Result<bool> {
    sessions::delete(conn, session_token)
}
