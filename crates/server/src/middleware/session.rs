//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The browser
//! session stores an opaque `sid` that keys the registry; everything else
//! about the device lives server-side under that sid.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ch_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &ServerConfig,
) -> SessionManagerLayer<PostgresStore> {
    // Note: The sessions table must be created via migration
    let store = PostgresStore::new(pool.clone());

    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Extractor for the opaque session id.
///
/// Reads the sid from the browser session, minting and storing a fresh one
/// on first contact so every request carries a stable registry key.
pub struct Sid(pub String);

/// Error returned when the session layer is missing or unreadable.
#[derive(Debug)]
pub struct SidRejection;

impl IntoResponse for SidRejection {
    fn into_response(self) -> Response {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

impl<S> FromRequestParts<S> for Sid
where
    S: Send + Sync,
{
    type Rejection = SidRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts.extensions.get::<Session>().ok_or(SidRejection)?;

        if let Some(sid) = session
            .get::<String>(session_keys::SID)
            .await
            .map_err(|_| SidRejection)?
        {
            return Ok(Self(sid));
        }

        let sid = Uuid::new_v4().to_string();
        session
            .insert(session_keys::SID, &sid)
            .await
            .map_err(|_| SidRejection)?;

        Ok(Self(sid))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use tower_sessions::{MemoryStore, Session};

    use super::*;

    #[tokio::test]
    async fn test_sid_minted_once_and_stable() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store, None);

        let (mut parts, ()) = Request::new(()).into_parts();
        parts.extensions.insert(session);

        let Sid(first) = Sid::from_request_parts(&mut parts, &())
            .await
            .expect("sid resolves");
        let Sid(second) = Sid::from_request_parts(&mut parts, &())
            .await
            .expect("sid resolves");

        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[tokio::test]
    async fn test_missing_session_layer_rejected() {
        let (mut parts, ()) = Request::new(()).into_parts();
        assert!(Sid::from_request_parts(&mut parts, &()).await.is_err());
    }
}
