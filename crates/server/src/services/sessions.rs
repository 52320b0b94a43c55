//! Session registry: which user is active on which device, and which
//! accounts each device remembers for quick switching.
//!
//! The sid is an opaque value stored in the browser session cookie. All
//! authority flows through the registry row it names.

use sqlx::PgPool;
use thiserror::Error;

use courierhub_core::UserId;

use crate::db::{RepositoryError, SessionRepository, users::UserRepository};
use crate::models::{PublicUser, SessionView};

/// Errors that can occur in the session registry.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Switch target isn't saved on this session.
    #[error("account is not saved on this session")]
    NotSaved,

    /// Saved account to remove wasn't found on this session.
    #[error("account is not saved on this session")]
    SavedAccountNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Session registry service.
pub struct SessionService<'a> {
    sessions: SessionRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> SessionService<'a> {
    /// Create a new session service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            sessions: SessionRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// Resolve the user currently active on a session.
    ///
    /// Returns only the public projection. Fails closed: a missing registry
    /// row, a cleared `current_user_id`, or a deleted user all resolve to
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if a query fails.
    pub async fn resolve_current_user(
        &self,
        sid: &str,
    ) -> Result<Option<PublicUser>, SessionError> {
        let Some(record) = self.sessions.get(sid).await? else {
            return Ok(None);
        };
        let Some(user_id) = record.current_user_id else {
            return Ok(None);
        };

        let user = self.users.get_by_id(user_id).await?;
        Ok(user.map(PublicUser::from))
    }

    /// Record a login on a session.
    ///
    /// Upserts the registry row (user agent and IP are captured on first
    /// insert) and sets the active user. With `remember`, the user is also
    /// prepended to the session's saved accounts unless already present.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if a query fails.
    pub async fn login(
        &self,
        sid: &str,
        user_id: UserId,
        remember: bool,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<(), SessionError> {
        self.sessions
            .record_login(sid, user_id, user_agent, ip_address)
            .await?;

        if remember {
            self.sessions.save_account(sid, user_id).await?;
        }

        Ok(())
    }

    /// Switch the active user to an account saved on this session.
    ///
    /// The target must be saved on THIS sid; a user saved on some other
    /// device grants nothing here. On rejection the active user is left
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSaved` if the target isn't on this
    /// session's saved list.
    pub async fn switch_account(&self, sid: &str, target: UserId) -> Result<(), SessionError> {
        if !self.sessions.is_saved(sid, target).await? {
            return Err(SessionError::NotSaved);
        }

        self.sessions.set_current_user(sid, Some(target)).await?;
        Ok(())
    }

    /// List the users saved on this session, most recent first.
    ///
    /// Deleted users are skipped rather than surfaced as errors.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if a query fails.
    pub async fn saved_accounts(&self, sid: &str) -> Result<Vec<PublicUser>, SessionError> {
        let ids = self.sessions.saved_user_ids(sid).await?;

        let mut accounts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.users.get_by_id(id).await? {
                accounts.push(PublicUser::from(user));
            }
        }

        Ok(accounts)
    }

    /// Remove a user from this session's saved accounts.
    ///
    /// The active user is untouched; callers log out separately if needed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SavedAccountNotFound` if the user wasn't saved.
    pub async fn remove_saved_account(
        &self,
        sid: &str,
        user_id: UserId,
    ) -> Result<(), SessionError> {
        if self.sessions.remove_saved(sid, user_id).await? {
            Ok(())
        } else {
            Err(SessionError::SavedAccountNotFound)
        }
    }

    /// Clear the active user on a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if the query fails.
    pub async fn logout(&self, sid: &str) -> Result<(), SessionError> {
        self.sessions.set_current_user(sid, None).await?;
        Ok(())
    }

    /// Revoke one device for a user: clear the active user on the target
    /// session if it is this user, and strip the user from its saved list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if a query fails.
    pub async fn revoke_session(
        &self,
        target_sid: &str,
        user_id: UserId,
    ) -> Result<(), SessionError> {
        self.sessions.clear_current_if(target_sid, user_id).await?;
        self.sessions.remove_saved(target_sid, user_id).await?;
        Ok(())
    }

    /// Revoke every session of a user except the caller's own.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if a query fails.
    pub async fn revoke_all_other_sessions(
        &self,
        user_id: UserId,
        except_sid: &str,
    ) -> Result<(), SessionError> {
        self.sessions
            .revoke_for_user_except(user_id, except_sid)
            .await?;
        Ok(())
    }

    /// List every session where the user is active or saved, flagged with
    /// whether it is the viewer's own device and whether the user is the
    /// active account there.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if the query fails.
    pub async fn list_sessions_for_user(
        &self,
        user_id: UserId,
        viewer_sid: &str,
    ) -> Result<Vec<SessionView>, SessionError> {
        let records = self.sessions.sessions_for_user(user_id).await?;

        Ok(records
            .into_iter()
            .map(|record| SessionView {
                current: record.sid == viewer_sid,
                logged_in: record.current_user_id == Some(user_id),
                sid: record.sid,
                user_agent: record.user_agent,
                ip_address: record.ip_address,
                updated_at: record.updated_at,
            })
            .collect())
    }
}
