//! Push-subscription bookkeeping handlers.
//!
//! Delivery transport is out of scope; these only record which endpoints
//! want notifications.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::db::PushSubscriptionRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Subscription payload: the browser's `PushSubscription` JSON.
#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub subscription: serde_json::Value,
}

/// Store a push subscription for the active user. Idempotent.
///
/// # Route
///
/// `POST /api/notifications/subscribe`
pub async fn subscribe(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(body): Json<SubscriptionRequest>,
) -> Result<StatusCode> {
    let payload = serde_json::to_string(&body.subscription)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    PushSubscriptionRepository::new(state.pool())
        .subscribe(auth.user.id, &payload)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove a push subscription by its payload.
///
/// # Route
///
/// `POST /api/notifications/unsubscribe`
pub async fn unsubscribe(
    State(state): State<AppState>,
    _auth: RequireUser,
    Json(body): Json<SubscriptionRequest>,
) -> Result<StatusCode> {
    let payload = serde_json::to_string(&body.subscription)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let removed = PushSubscriptionRepository::new(state.pool())
        .unsubscribe(&payload)
        .await?;

    if !removed {
        return Err(AppError::NotFound("subscription".to_owned()));
    }

    Ok(StatusCode::NO_CONTENT)
}
