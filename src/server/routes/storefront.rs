//! Public settings read for the theme extension.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::config::ShopDomain;
use crate::server::{ApiError, AppState};

/// `GET /api/storefront/settings?shop=`
///
/// Any storefront may embed the widget, so the response allows every origin.
pub async fn settings(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = query
        .get("shop")
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter: shop".to_string()))
        .and_then(|raw| ShopDomain::new(raw).map_err(|e| ApiError::BadRequest(e.to_string())))?;

    let settings = state.settings().get(&shop).await?;
    Ok(([(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")], Json(settings)))
}
