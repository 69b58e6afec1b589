//! Authentication for the app.
//!
//! # Overview
//!
//! - [`AuthScopes`]: A set of OAuth scopes with implied scope handling
//! - [`Session`]: An installed shop and its offline access token
//! - [`SessionStore`]: Where sessions live between requests
//! - [`oauth`]: The install flow and session token decoding
//!
//! Sessions are offline sessions: app-level tokens that do not expire and are
//! removed when the shop uninstalls the app.
//!
//! # Example
//!
//! ```rust
//! use shopify_popup::{Session, ShopDomain};
//!
//! let shop = ShopDomain::new("my-store").unwrap();
//! let session = Session::new(
//!     Session::offline_id(&shop),
//!     shop,
//!     "access-token".to_string(),
//!     "read_themes".parse().unwrap(),
//!     None,
//! );
//!
//! assert!(!session.expired());
//! ```

pub mod oauth;
mod scopes;
pub mod session;
pub mod session_store;

pub use scopes::AuthScopes;
pub use session::{AccessTokenResponse, Session};
pub use session_store::{InMemorySessionStore, SessionStore, StoreError};
