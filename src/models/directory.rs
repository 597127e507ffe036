//! Reference directories used to categorize party numbers.
//!
//! Entry types mirror the provider payloads field for field (camelCase on
//! the wire) and ignore every field the categorizer does not read.

use serde::{Deserialize, Deserializer, Serialize};

/// Owner type marking a number assigned to a person.
pub const PEOPLE_OWNER_TYPE: &str = "PEOPLE";

/// Contact center dial number entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialNumberEntry {
    /// The routable number.
    #[serde(rename = "dialledNumber", default, skip_serializing_if = "Option::is_none")]
    pub dialled_number: Option<String>,
}

impl DialNumberEntry {
    /// Creates an entry for a dial number.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            dialled_number: Some(number.into()),
        }
    }
}

/// Contact center user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Common identity user id, matched against a record's `User UUID`.
    #[serde(rename = "ciUserId")]
    pub ci_user_id: String,

    /// Agent profile id. Presence of the key marks an agent, even when its
    /// value is `null`.
    #[serde(
        rename = "agentProfileId",
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub agent_profile_id: Option<serde_json::Value>,
}

impl UserEntry {
    /// Creates a plain (non-agent) user.
    #[must_use]
    pub fn new(ci_user_id: impl Into<String>) -> Self {
        Self {
            ci_user_id: ci_user_id.into(),
            agent_profile_id: None,
        }
    }

    /// Marks the user as an agent with the given profile.
    #[must_use]
    pub fn with_agent_profile(mut self, profile_id: impl Into<String>) -> Self {
        self.agent_profile_id = Some(serde_json::Value::String(profile_id.into()));
        self
    }

    /// Returns whether the user has an agent profile.
    #[must_use]
    pub const fn is_agent(&self) -> bool {
        self.agent_profile_id.is_some()
    }
}

/// Maps any present value (including `null`) to `Some`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Call queue entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueNumberEntry {
    /// Number routing to the queue.
    #[serde(rename = "phoneNumber", default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl QueueNumberEntry {
    /// Creates an entry for a queue number.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            phone_number: Some(number.into()),
        }
    }
}

/// Owner of a platform phone number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberOwner {
    /// Owner type, e.g. `PEOPLE`, `PLACE`, `VIRTUAL_LINE`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub owner_type: Option<String>,
}

/// Platform phone number entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumberEntry {
    /// The assigned number.
    #[serde(rename = "phoneNumber", default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// The number's owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<NumberOwner>,
}

impl PhoneNumberEntry {
    /// Creates an entry for a number with the given owner type.
    #[must_use]
    pub fn new(number: impl Into<String>, owner_type: impl Into<String>) -> Self {
        Self {
            phone_number: Some(number.into()),
            owner: Some(NumberOwner {
                owner_type: Some(owner_type.into()),
            }),
        }
    }

    /// Returns the owner type, if reported.
    #[must_use]
    pub fn owner_type(&self) -> Option<&str> {
        self.owner.as_ref()?.owner_type.as_deref()
    }
}

/// The four reference lists, fully materialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceDirectory {
    /// Contact center dial numbers.
    pub dial_numbers: Vec<DialNumberEntry>,
    /// Contact center users.
    pub users: Vec<UserEntry>,
    /// Call queue numbers.
    pub queue_numbers: Vec<QueueNumberEntry>,
    /// Platform phone numbers.
    pub phone_numbers: Vec<PhoneNumberEntry>,
}

impl ReferenceDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dial numbers.
    #[must_use]
    pub fn with_dial_numbers(mut self, entries: Vec<DialNumberEntry>) -> Self {
        self.dial_numbers = entries;
        self
    }

    /// Sets the users.
    #[must_use]
    pub fn with_users(mut self, entries: Vec<UserEntry>) -> Self {
        self.users = entries;
        self
    }

    /// Sets the queue numbers.
    #[must_use]
    pub fn with_queue_numbers(mut self, entries: Vec<QueueNumberEntry>) -> Self {
        self.queue_numbers = entries;
        self
    }

    /// Sets the phone numbers.
    #[must_use]
    pub fn with_phone_numbers(mut self, entries: Vec<PhoneNumberEntry>) -> Self {
        self.phone_numbers = entries;
        self
    }

    /// Returns whether all four lists are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dial_numbers.is_empty()
            && self.users.is_empty()
            && self.queue_numbers.is_empty()
            && self.phone_numbers.is_empty()
    }
}
