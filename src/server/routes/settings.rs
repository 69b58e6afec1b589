//! Merchant settings API. Both routes sit behind the session gate.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::server::{ApiError, AppState, RequireSession};
use crate::settings::{self, PopupSettings, SettingsPayload};

#[derive(Serialize)]
pub struct SaveResponse {
    success: bool,
    settings: PopupSettings,
}

/// `GET /api/settings`
pub async fn show(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Result<Json<PopupSettings>, ApiError> {
    let settings = state.settings().get(&session.shop).await?;
    Ok(Json(settings))
}

/// `POST /api/settings` replaces the whole record.
pub async fn update(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    payload: Result<Json<SettingsPayload>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(payload) = payload?;
    let settings = settings::save(state.settings(), &session.shop, payload).await?;

    Ok(Json(SaveResponse {
        success: true,
        settings,
    }))
}
