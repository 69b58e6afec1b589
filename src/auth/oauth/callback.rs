//! OAuth callback handling.
//!
//! Shopify redirects the merchant to the callback with
//! `code, shop, state, hmac, host, timestamp`. [`handle_callback`] walks the
//! request through [`CallbackState`]:
//!
//! ```text
//! AwaitingCode --verified--> ExchangingToken --token--> Authenticated
//!      |                            |
//!      +-------- rejected ----------+--------- error --> Failed
//! ```
//!
//! Checks run in a fixed order and stop at the first failure: required
//! parameters, HMAC, shop domain, `state` (which must have been issued for
//! that same shop). Only then is the code exchanged;
//! nothing is sent upstream for a request that fails verification. A code
//! that was already exchanged is refused by Shopify and surfaces as
//! [`OAuthError::TokenExchangeFailed`]. There are no retries.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::Serialize;

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::hmac::validate_hmac;
use crate::auth::oauth::state::StateRegistry;
use crate::auth::session::AccessTokenResponse;
use crate::auth::session_store::SessionStore;
use crate::auth::Session;
use crate::config::{AppConfig, ShopDomain};

/// Maximum number of bytes of an upstream error body kept in the error.
const MAX_ERROR_BODY: usize = 512;

/// Progress of a single callback request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackState {
    /// Parameters received, not yet verified.
    AwaitingCode,
    /// Verified; the code is being exchanged for a token.
    ExchangingToken,
    /// A session was stored.
    Authenticated,
    /// Rejected or failed; no session was stored.
    Failed,
}

#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// A successfully completed install.
#[derive(Clone, Debug)]
pub struct CallbackOutcome {
    /// The session that was stored.
    pub session: Session,
    /// Where to send the merchant next: the embedded app home.
    pub redirect_url: String,
}

fn required<'a>(
    params: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, OAuthError> {
    params
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or(OAuthError::MissingParameter { name })
}

/// Returns the `host` parameter value the embedded admin expects for `shop`.
#[must_use]
pub fn admin_host_param(shop: &ShopDomain) -> String {
    STANDARD.encode(format!("{}/admin", shop.as_ref()))
}

/// Returns the URL of the embedded app home for `shop`.
#[must_use]
pub fn app_home_url(config: &AppConfig, shop: &ShopDomain) -> String {
    config.host().join(&format!(
        "/?shop={}&host={}",
        urlencoding::encode(shop.as_ref()),
        urlencoding::encode(&admin_host_param(shop))
    ))
}

fn token_endpoint(config: &AppConfig, shop: &ShopDomain) -> String {
    let path = "/admin/oauth/access_token";
    match config.oauth_base_url() {
        Some(base) => base.join(path),
        None => format!("https://{}{path}", shop.as_ref()),
    }
}

/// Exchanges an authorization code for an offline access token.
///
/// # Errors
///
/// - [`OAuthError::Network`] if the endpoint cannot be reached
/// - [`OAuthError::Timeout`] if it does not answer in time
/// - [`OAuthError::TokenExchangeFailed`] for a non-2xx status
/// - [`OAuthError::InvalidTokenResponse`] for a 2xx body without a token
pub async fn exchange_code(
    config: &AppConfig,
    client: &reqwest::Client,
    shop: &ShopDomain,
    code: &str,
) -> Result<AccessTokenResponse, OAuthError> {
    let request_body = TokenExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code,
    };

    let response = client
        .post(token_endpoint(config, shop))
        .timeout(config.request_timeout())
        .json(&request_body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let mut message = response.text().await.unwrap_or_default();
        if message.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| message.is_char_boundary(*i))
                .unwrap_or(0);
            message.truncate(cut);
        }
        return Err(OAuthError::TokenExchangeFailed {
            status: status.as_u16(),
            message,
        });
    }

    let token: AccessTokenResponse = response.json().await.map_err(|e| {
        if e.is_timeout() {
            OAuthError::Timeout
        } else {
            OAuthError::InvalidTokenResponse {
                reason: e.to_string(),
            }
        }
    })?;

    if token.access_token.trim().is_empty() {
        return Err(OAuthError::InvalidTokenResponse {
            reason: "access_token is empty".to_string(),
        });
    }

    Ok(token)
}

async fn verify_and_exchange(
    config: &AppConfig,
    client: &reqwest::Client,
    states: &StateRegistry,
    params: &HashMap<String, String>,
) -> Result<(ShopDomain, AccessTokenResponse), OAuthError> {
    let code = required(params, "code")?;
    let raw_shop = required(params, "shop")?;

    if !validate_hmac(params, config) {
        return Err(OAuthError::InvalidHmac);
    }

    let shop = ShopDomain::new(raw_shop).map_err(|_| OAuthError::InvalidCallback {
        reason: format!("Invalid shop domain: {raw_shop}"),
    })?;

    let state = required(params, "state")?;
    if !states.is_valid(state, &shop, Utc::now()).await {
        return Err(OAuthError::StateMismatch);
    }

    tracing::debug!(shop = %shop, state = ?CallbackState::ExchangingToken, "exchanging authorization code");
    let token = exchange_code(config, client, &shop, code).await?;

    Ok((shop, token))
}

/// Verifies an OAuth callback, exchanges its code and stores the session.
///
/// `params` is the complete decoded query string of the callback request.
/// On success the returned [`CallbackOutcome`] holds the stored session and
/// the app home URL to redirect to.
///
/// # Errors
///
/// Returns the [`OAuthError`] of the first failed step; no session is
/// stored in that case.
#[tracing::instrument(skip_all, fields(shop = params.get("shop").map(String::as_str).unwrap_or_default()))]
pub async fn handle_callback(
    config: &AppConfig,
    client: &reqwest::Client,
    states: &StateRegistry,
    sessions: &dyn SessionStore,
    params: &HashMap<String, String>,
) -> Result<CallbackOutcome, OAuthError> {
    tracing::debug!(state = ?CallbackState::AwaitingCode, "oauth callback received");

    let result = async {
        let (shop, token) = verify_and_exchange(config, client, states, params).await?;
        let session = Session::from_access_token_response(shop, &token);
        sessions.put(session.clone()).await?;
        Ok::<_, OAuthError>(session)
    }
    .await;

    match result {
        Ok(session) => {
            tracing::info!(
                shop = %session.shop,
                scopes = %session.scopes,
                state = ?CallbackState::Authenticated,
                "app installed"
            );
            let redirect_url = app_home_url(config, &session.shop);
            Ok(CallbackOutcome {
                session,
                redirect_url,
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, state = ?CallbackState::Failed, "oauth callback rejected");
            Err(e)
        }
    }
}
