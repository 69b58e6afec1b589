//! The shopper's stored acceptance.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Storage key of the flag in the browser.
pub const ACCEPTANCE_FLAG_KEY: &str = "shopify_popup_accepted";

/// How long an acceptance is remembered.
pub const FLAG_LIFETIME_DAYS: i64 = 365;

/// A remembered "accept" click, stored per browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceFlag {
    /// Whether the shopper accepted.
    pub value: bool,
    /// When the flag stops counting.
    pub expiry: DateTime<Utc>,
}

impl AcceptanceFlag {
    /// Returns the flag stored when the shopper accepts at `now`.
    #[must_use]
    pub fn accepted_at(now: DateTime<Utc>) -> Self {
        Self {
            value: true,
            expiry: now + Duration::days(FLAG_LIFETIME_DAYS),
        }
    }

    /// Returns `true` if the flag records an acceptance still valid at `now`.
    #[must_use]
    pub fn is_accepted(&self, now: DateTime<Utc>) -> bool {
        self.value && now < self.expiry
    }
}

/// Browser-local key/value storage for the flag.
pub trait FlagStorage {
    /// Reads the flag, if one is stored and readable.
    fn load(&self) -> Option<AcceptanceFlag>;

    /// Stores `flag`, replacing any previous one.
    fn store(&mut self, flag: AcceptanceFlag);
}

/// Flag storage held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryFlagStorage {
    flag: Option<AcceptanceFlag>,
}

impl InMemoryFlagStorage {
    /// Creates storage that already holds `flag`.
    #[must_use]
    pub const fn with_flag(flag: AcceptanceFlag) -> Self {
        Self { flag: Some(flag) }
    }
}

impl FlagStorage for InMemoryFlagStorage {
    fn load(&self) -> Option<AcceptanceFlag> {
        self.flag
    }

    fn store(&mut self, flag: AcceptanceFlag) {
        self.flag = Some(flag);
    }
}
