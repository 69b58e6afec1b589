//! Popup settings record and its validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SettingsError;

const MAX_LABEL_CHARS: usize = 200;
const MAX_BODY_CHARS: usize = 2000;

/// Where the popup is placed on the storefront page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Banner along the top edge.
    Top,
    /// Modal in the middle of the viewport.
    Center,
    /// Banner along the bottom edge.
    #[default]
    Bottom,
}

impl Position {
    /// Returns the wire name of this position.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            _ => Err(()),
        }
    }
}

/// The popup configuration of one shop.
///
/// Values of this type are always valid; build them from untrusted input
/// with `PopupSettings::try_from(payload)`.
///
/// # Example
///
/// ```rust
/// use shopify_popup::settings::{PopupSettings, Position};
///
/// let settings = PopupSettings::default();
/// assert!(settings.enabled);
/// assert_eq!(settings.position, Position::Bottom);
/// assert_eq!(settings.delay_seconds, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupSettings {
    /// Whether the popup is shown at all.
    pub enabled: bool,
    /// Heading line.
    pub title: String,
    /// Main message.
    pub body_text: String,
    /// Text of the accept button.
    pub accept_label: String,
    /// Text of the decline button.
    pub decline_label: String,
    /// Whether the decline button is shown.
    pub show_decline: bool,
    /// Link to the shop's privacy policy.
    pub privacy_policy_url: Option<String>,
    /// Text of the privacy policy link.
    pub policy_link_text: String,
    /// Placement on the page.
    pub position: Position,
    /// Seconds between page load and the popup appearing.
    pub delay_seconds: u32,
    /// Popup background, `#rgb` or `#rrggbb`.
    pub background_color: String,
    /// Popup text color.
    pub text_color: String,
    /// Accept button color.
    pub accept_button_color: String,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "We value your privacy".to_string(),
            body_text:
                "This website uses cookies to ensure you get the best experience on our website."
                    .to_string(),
            accept_label: "Accept".to_string(),
            decline_label: "Decline".to_string(),
            show_decline: true,
            privacy_policy_url: None,
            policy_link_text: "Privacy Policy".to_string(),
            position: Position::Bottom,
            delay_seconds: 0,
            background_color: "#ffffff".to_string(),
            text_color: "#1a1a1a".to_string(),
            accept_button_color: "#008060".to_string(),
        }
    }
}

/// Settings as submitted by the admin UI, before validation.
///
/// A POST replaces the whole record, so every field except
/// `privacyPolicyUrl` must be present. Fields are optional here only so that
/// validation can name each missing one instead of failing on the first.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPayload {
    /// `enabled`: whether the popup is shown.
    pub enabled: Option<bool>,
    /// `title`: heading line, up to 200 characters.
    pub title: Option<String>,
    /// `bodyText`: main message, up to 2000 characters.
    pub body_text: Option<String>,
    /// `acceptLabel`: accept button text.
    pub accept_label: Option<String>,
    /// `declineLabel`: decline button text.
    pub decline_label: Option<String>,
    /// `showDecline`: whether the decline button is shown.
    pub show_decline: Option<bool>,
    /// `privacyPolicyUrl`: http(s) link; absent or blank means no link.
    pub privacy_policy_url: Option<String>,
    /// `policyLinkText`: text of the policy link.
    pub policy_link_text: Option<String>,
    /// `position`: one of `top`, `center`, `bottom`.
    pub position: Option<String>,
    /// `delaySeconds`: whole seconds, 0 or more. Signed so that negative
    /// input is reported as a field error rather than a parse failure.
    pub delay_seconds: Option<i64>,
    /// `backgroundColor`: `#rgb` or `#rrggbb`.
    pub background_color: Option<String>,
    /// `textColor`: `#rgb` or `#rrggbb`.
    pub text_color: Option<String>,
    /// `acceptButtonColor`: `#rgb` or `#rrggbb`.
    pub accept_button_color: Option<String>,
}

impl From<PopupSettings> for SettingsPayload {
    fn from(settings: PopupSettings) -> Self {
        Self {
            enabled: Some(settings.enabled),
            title: Some(settings.title),
            body_text: Some(settings.body_text),
            accept_label: Some(settings.accept_label),
            decline_label: Some(settings.decline_label),
            show_decline: Some(settings.show_decline),
            privacy_policy_url: settings.privacy_policy_url,
            policy_link_text: Some(settings.policy_link_text),
            position: Some(settings.position.to_string()),
            delay_seconds: Some(i64::from(settings.delay_seconds)),
            background_color: Some(settings.background_color),
            text_color: Some(settings.text_color),
            accept_button_color: Some(settings.accept_button_color),
        }
    }
}

/// One rejected field of a settings payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Unwraps a required field, recording it as missing if absent.
    ///
    /// `placeholder` only keeps the record buildable; a payload with a
    /// missing field is never accepted.
    fn required<T>(&mut self, field: &'static str, value: Option<T>, placeholder: T) -> T {
        value.unwrap_or_else(|| {
            self.fail(field, "is required");
            placeholder
        })
    }

    fn text(&mut self, field: &'static str, value: Option<String>, placeholder: String, max: usize) -> String {
        let value = self.required(field, value, placeholder);
        if value.chars().count() > max {
            self.fail(field, format!("must be at most {max} characters"));
        }
        value
    }

    fn color(&mut self, field: &'static str, value: Option<String>, placeholder: String) -> String {
        let value = self.required(field, value, placeholder).trim().to_string();
        if !is_hex_color(&value) {
            self.fail(field, "must be a hex color like #rgb or #rrggbb");
        }
        value
    }
}

fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

fn is_http_url(value: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        value
            .strip_prefix(scheme)
            .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/') && !rest.contains(char::is_whitespace))
    })
}

impl TryFrom<SettingsPayload> for PopupSettings {
    type Error = SettingsError;

    /// Validates a payload.
    ///
    /// All fields are checked; the error lists every rejected or missing
    /// field.
    fn try_from(payload: SettingsPayload) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        let mut check = Checker::default();

        let position = match payload.position.as_deref().map(str::trim) {
            None => check.required("position", None, defaults.position),
            Some(raw) => raw.parse().unwrap_or_else(|()| {
                check.fail("position", "must be one of top, center, bottom");
                defaults.position
            }),
        };

        let delay_seconds = match payload.delay_seconds {
            None => check.required("delaySeconds", None, defaults.delay_seconds),
            Some(raw) => u32::try_from(raw).unwrap_or_else(|_| {
                check.fail("delaySeconds", "must be a whole number of seconds, 0 or more");
                defaults.delay_seconds
            }),
        };

        let privacy_policy_url = payload
            .privacy_policy_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = &privacy_policy_url {
            if !is_http_url(url) {
                check.fail("privacyPolicyUrl", "must be an http or https URL");
            }
        }

        let settings = Self {
            enabled: check.required("enabled", payload.enabled, defaults.enabled),
            title: check.text("title", payload.title, defaults.title, MAX_LABEL_CHARS),
            body_text: check.text("bodyText", payload.body_text, defaults.body_text, MAX_BODY_CHARS),
            accept_label: check.text(
                "acceptLabel",
                payload.accept_label,
                defaults.accept_label,
                MAX_LABEL_CHARS,
            ),
            decline_label: check.text(
                "declineLabel",
                payload.decline_label,
                defaults.decline_label,
                MAX_LABEL_CHARS,
            ),
            show_decline: check.required("showDecline", payload.show_decline, defaults.show_decline),
            privacy_policy_url,
            policy_link_text: check.text(
                "policyLinkText",
                payload.policy_link_text,
                defaults.policy_link_text,
                MAX_LABEL_CHARS,
            ),
            position,
            delay_seconds,
            background_color: check.color(
                "backgroundColor",
                payload.background_color,
                defaults.background_color,
            ),
            text_color: check.color("textColor", payload.text_color, defaults.text_color),
            accept_button_color: check.color(
                "acceptButtonColor",
                payload.accept_button_color,
                defaults.accept_button_color,
            ),
        };

        if check.errors.is_empty() {
            Ok(settings)
        } else {
            Err(SettingsError::Validation(check.errors))
        }
    }
}
