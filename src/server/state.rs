//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::oauth::StateRegistry;
use crate::auth::{InMemorySessionStore, SessionStore};
use crate::config::AppConfig;
use crate::settings::{InMemorySettingsStore, SettingsStore};

/// Application state shared across all handlers.
///
/// Cloning is cheap; every clone refers to the same stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    sessions: Arc<dyn SessionStore>,
    settings: Arc<dyn SettingsStore>,
    oauth_states: StateRegistry,
    http: reqwest::Client,
}

impl AppState {
    /// Creates state over the given stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the token exchange cannot be
    /// built (for example, if the TLS backend fails to initialize).
    pub fn new(
        config: AppConfig,
        sessions: Arc<dyn SessionStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("shopify-popup-app/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                sessions,
                settings,
                oauth_states: StateRegistry::new(),
                http,
            }),
        })
    }

    /// Creates state backed by in-memory stores.
    ///
    /// # Errors
    ///
    /// See [`AppState::new`].
    pub fn in_memory(config: AppConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemorySettingsStore::new()),
        )
    }

    /// Returns the app configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Returns the session store.
    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.inner.sessions.as_ref()
    }

    /// Returns the settings store.
    #[must_use]
    pub fn settings(&self) -> &dyn SettingsStore {
        self.inner.settings.as_ref()
    }

    /// Returns the registry of issued OAuth state nonces.
    #[must_use]
    pub fn oauth_states(&self) -> &StateRegistry {
        &self.inner.oauth_states
    }

    /// Returns the HTTP client used for the token exchange.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
