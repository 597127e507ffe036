//! Party roles inferred during categorization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role inferred for a calling or called party number.
///
/// A number without a role is unrecognized. Roles render as a parenthesised
/// label appended to the number, e.g. `5551234 (WxCC Dial Number)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    /// Contact center routable dial number.
    WxccDialNumber,
    /// Contact center user with an agent profile.
    WxccAgentUser,
    /// Contact center user without an agent profile.
    WxccUser,
    /// Calling platform call queue number.
    WebexCallQueue,
    /// Calling platform number owned by a person.
    WebexUser,
    /// Calling platform number owned by anything else (virtual line, place).
    WebexNumber,
}

impl PartyRole {
    /// Returns the human-readable label used in rendered numbers.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::WxccDialNumber => "WxCC Dial Number",
            Self::WxccAgentUser => "WxCC Agent User",
            Self::WxccUser => "WxCC User",
            Self::WebexCallQueue => "Webex Call Queue",
            Self::WebexUser => "Webex User",
            Self::WebexNumber => "Webex Number",
        }
    }

    /// Returns the snake_case identifier (used for metric labels and config).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WxccDialNumber => "wxcc_dial_number",
            Self::WxccAgentUser => "wxcc_agent_user",
            Self::WxccUser => "wxcc_user",
            Self::WebexCallQueue => "webex_call_queue",
            Self::WebexUser => "webex_user",
            Self::WebexNumber => "webex_number",
        }
    }

    /// Returns the parenthesised tag, e.g. `(Webex User)`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("({})", self.label())
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Renders a party number with its optional role tag.
///
/// Unannotated numbers are returned unchanged.
#[must_use]
pub fn render_annotated(number: &str, role: Option<PartyRole>) -> String {
    match role {
        Some(role) => format!("{number} {}", role.tag()),
        None => number.to_string(),
    }
}
