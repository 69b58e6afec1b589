//! Storefront popup behavior.
//!
//! The theme extension shows the popup in the shopper's browser. Its
//! behavior is modeled here as a state machine so it can be specified and
//! tested without a DOM:
//!
//! ```text
//!            load (no flag)          timer fired
//! Hidden ---------------------> Hidden* -----------> Visible
//!   |                                                  |
//!   | load (flag unexpired)      accept / decline /    |
//!   +-----------------------> Dismissed <--------------+
//!                                 overlay click
//! ```
//!
//! `Hidden*` is `Hidden` with a render scheduled. Each stimulus returns the
//! [`Effect`]s the host page must carry out. Stimuli that do not apply to the
//! current state are ignored and return no effects.
//!
//! Accepting stores an [`AcceptanceFlag`] valid for 365 days; while it is
//! valid the popup never renders. Declining, directly or by clicking the
//! overlay outside the popup, stores nothing, so the popup returns on the
//! next visit.

mod flag;

pub use flag::{AcceptanceFlag, FlagStorage, InMemoryFlagStorage, ACCEPTANCE_FLAG_KEY, FLAG_LIFETIME_DAYS};

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::settings::{PopupSettings, Position};

/// Visibility of the popup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetState {
    /// Not shown yet.
    Hidden,
    /// On screen, waiting for the shopper.
    Visible,
    /// Closed for the rest of the page view.
    Dismissed,
}

/// The shopper's answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    /// Accept button.
    Accepted,
    /// Decline button or overlay click.
    Declined,
}

/// What the popup looks like once rendered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupView {
    /// Heading line.
    pub title: String,
    /// Main message.
    pub body_text: String,
    /// Accept button text.
    pub accept_label: String,
    /// `None` when the decline button is hidden.
    pub decline_label: Option<String>,
    /// Policy URL and link text, when a policy URL is set.
    pub policy_link: Option<(String, String)>,
    /// Placement on the page.
    pub position: Position,
    /// Popup background color.
    pub background_color: String,
    /// Popup text color.
    pub text_color: String,
    /// Accept button color.
    pub accept_button_color: String,
}

impl From<&PopupSettings> for PopupView {
    fn from(settings: &PopupSettings) -> Self {
        Self {
            title: settings.title.clone(),
            body_text: settings.body_text.clone(),
            accept_label: settings.accept_label.clone(),
            decline_label: settings
                .show_decline
                .then(|| settings.decline_label.clone()),
            policy_link: settings
                .privacy_policy_url
                .clone()
                .map(|url| (url, settings.policy_link_text.clone())),
            position: settings.position,
            background_color: settings.background_color.clone(),
            text_color: settings.text_color.clone(),
            accept_button_color: settings.accept_button_color.clone(),
        }
    }
}

/// A side effect requested by the widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Start a timer and call [`Widget::timer_fired`] when it elapses.
    ScheduleRender {
        /// Time until the popup appears.
        delay: Duration,
    },
    /// Show the popup.
    Render(PopupView),
    /// Remove the popup from the page.
    Hide,
    /// Emit the choice event to the page.
    Notify(Choice),
}

/// Popup state machine for one page view.
#[derive(Debug)]
pub struct Widget<S> {
    settings: PopupSettings,
    storage: S,
    state: WidgetState,
    loaded: bool,
    render_scheduled: bool,
}

impl<S: FlagStorage> Widget<S> {
    /// Creates a widget for a page view of a shop with `settings`.
    pub const fn new(settings: PopupSettings, storage: S) -> Self {
        Self {
            settings,
            storage,
            state: WidgetState::Hidden,
            loaded: false,
            render_scheduled: false,
        }
    }

    /// Returns the current state.
    pub const fn state(&self) -> WidgetState {
        self.state
    }

    /// Returns the flag storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Page load.
    ///
    /// Dismisses at once, with no effects, when the shopper accepted within
    /// the last year. Otherwise schedules the render, unless the popup is
    /// disabled, in which case it stays hidden.
    pub fn load(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        if self.loaded {
            return Vec::new();
        }
        self.loaded = true;

        if self
            .storage
            .load()
            .is_some_and(|flag| flag.is_accepted(now))
        {
            self.state = WidgetState::Dismissed;
            return Vec::new();
        }

        if !self.settings.enabled {
            return Vec::new();
        }

        self.render_scheduled = true;
        vec![Effect::ScheduleRender {
            delay: Duration::from_secs(u64::from(self.settings.delay_seconds)),
        }]
    }

    /// The render timer elapsed.
    pub fn timer_fired(&mut self) -> Vec<Effect> {
        if self.state != WidgetState::Hidden || !self.render_scheduled {
            return Vec::new();
        }
        self.render_scheduled = false;
        self.state = WidgetState::Visible;
        vec![Effect::Render(PopupView::from(&self.settings))]
    }

    /// The shopper clicked accept.
    pub fn accept(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        if self.state != WidgetState::Visible {
            return Vec::new();
        }
        self.storage.store(AcceptanceFlag::accepted_at(now));
        self.dismiss(Choice::Accepted)
    }

    /// The shopper clicked decline.
    pub fn decline(&mut self) -> Vec<Effect> {
        if self.state != WidgetState::Visible {
            return Vec::new();
        }
        self.dismiss(Choice::Declined)
    }

    /// The shopper clicked the overlay outside the popup. Same as declining.
    pub fn overlay_click(&mut self) -> Vec<Effect> {
        self.decline()
    }

    fn dismiss(&mut self, choice: Choice) -> Vec<Effect> {
        self.state = WidgetState::Dismissed;
        vec![Effect::Hide, Effect::Notify(choice)]
    }
}
