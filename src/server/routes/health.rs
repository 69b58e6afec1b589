//! Health and public configuration.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
    version: &'static str,
}

/// Liveness check. Does not touch the stores.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Values the admin frontend needs to boot App Bridge.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    api_key: String,
    host: String,
    scopes: String,
}

pub async fn app_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let config = state.config();
    Json(ConfigResponse {
        api_key: config.api_key().as_ref().to_string(),
        host: config.host().as_ref().to_string(),
        scopes: config.scopes().to_string(),
    })
}
