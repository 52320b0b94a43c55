//! Session registry types.
//!
//! A `SessionRecord` is a browser-bound row keyed by an opaque sid. The sid
//! itself travels in the tower-sessions cookie; the registry tracks which
//! user is active on the device and which accounts are remembered on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierhub_core::UserId;

/// A session registry row.
///
/// A sid is browser-bound, not user-bound: several humans may share one
/// sid's saved accounts.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Opaque session identifier (primary key).
    pub sid: String,
    /// Currently active user, if anyone is logged in.
    pub current_user_id: Option<UserId>,
    /// User agent captured on first login.
    pub user_agent: Option<String>,
    /// Client IP captured on first login.
    pub ip_address: Option<String>,
    /// When the registry row was created.
    pub created_at: DateTime<Utc>,
    /// When the registry row was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A session as shown on the settings "devices" page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    /// Opaque session identifier.
    pub sid: String,
    /// User agent captured on first login.
    pub user_agent: Option<String>,
    /// Client IP captured on first login.
    pub ip_address: Option<String>,
    /// Whether this is the session making the request.
    pub current: bool,
    /// Whether the viewing user is the active user on this session.
    pub logged_in: bool,
    /// When the registry row was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Keys for values stored in the tower-sessions cookie session.
pub mod session_keys {
    /// Key for the opaque registry sid.
    pub const SID: &str = "sid";

    /// Key for the OAuth CSRF state parameter.
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Key for the pending OAuth action (`login` or `link-account`).
    pub const OAUTH_ACTION: &str = "oauth_action";
}
