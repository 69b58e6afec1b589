//! Browser session for the embedded admin.
//!
//! The install callback records the shop in a `tower-sessions` session; the
//! cookie carries only the signed session id. Sessions live in memory and
//! lapse after 24 hours without a request.

use axum::Router;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{time, Key, SameSite};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::{SessionSecret, ShopDomain};

/// Name of the browser session cookie.
pub const SESSION_COOKIE_NAME: &str = "shopify_app_session";

/// Inactivity window after which a browser session lapses (24 hours).
pub const SESSION_EXPIRY_SECS: i64 = 24 * 60 * 60;

const SHOP_KEY: &str = "shop";

/// Wraps `router` in the session layer.
///
/// The admin runs the app inside an iframe on another site, so the cookie is
/// `SameSite=None` and therefore `Secure`.
pub(crate) fn with_sessions(router: Router, secret: &SessionSecret) -> Router {
    let layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(SESSION_EXPIRY_SECS)))
        .with_secure(true)
        .with_same_site(SameSite::None)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(secret));

    router.layer(layer)
}

/// Cookie signing key stretched from the configured session secret.
fn signing_key(secret: &SessionSecret) -> Key {
    // SHA-512 yields exactly the 64 bytes `Key::from` requires
    let digest = Sha512::digest(secret.as_ref().as_bytes());
    Key::from(digest.as_slice())
}

/// Binds `shop` to the browser session, issuing a fresh session id.
pub(crate) async fn remember_shop(
    session: &tower_sessions::Session,
    shop: &ShopDomain,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(SHOP_KEY, shop).await
}

/// Returns the shop bound to the browser session, if any.
pub(crate) async fn session_shop(
    session: &tower_sessions::Session,
) -> Result<Option<ShopDomain>, tower_sessions::session::Error> {
    session.get::<ShopDomain>(SHOP_KEY).await
}
