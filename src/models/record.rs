//! Call detail records.
//!
//! A [`CallRecord`] is one leg of one call as reported by the calling
//! platform. Records keep every reported column as a string so that nothing
//! the platform emits is lost on the way to the consumer; the handful of
//! columns the pipeline reads are addressed through [`RecordField`].

use super::role::{PartyRole, render_annotated};
use crate::{Error, Result};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder used in error messages for records without a correlation id.
const UNKNOWN_RECORD: &str = "<unknown>";

/// Columns the pipeline reads from a record.
///
/// Each field is stored under the platform's report header (see
/// [`RecordField::header`]). Ingest accepts the header, the compact form
/// (`CorrelationID`) and `snake_case` (`correlation_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    /// Identifier shared by all legs of one logical call.
    CorrelationId,
    /// Leg start time; lexicographic order is chronological order.
    StartTime,
    /// `ORIGINATING` or `TERMINATING`.
    Direction,
    /// Free-text reason; one value marks push-notification noise.
    RelatedReason,
    /// Calling party number.
    CallingNumber,
    /// Called party number.
    CalledNumber,
    /// Identifier of the platform user the leg belongs to.
    UserUuid,
}

impl RecordField {
    /// Returns all fields.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::CorrelationId,
            Self::StartTime,
            Self::Direction,
            Self::RelatedReason,
            Self::CallingNumber,
            Self::CalledNumber,
            Self::UserUuid,
        ]
    }

    /// Returns the report header the field is stored under.
    #[must_use]
    pub const fn header(&self) -> &'static str {
        match self {
            Self::CorrelationId => "Correlation ID",
            Self::StartTime => "Start time",
            Self::Direction => "Direction",
            Self::RelatedReason => "Related reason",
            Self::CallingNumber => "Calling number",
            Self::CalledNumber => "Called number",
            Self::UserUuid => "User UUID",
        }
    }

    /// Resolves a column key to a known field, ignoring case, spaces,
    /// underscores and dashes.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "correlationid" => Some(Self::CorrelationId),
            "starttime" => Some(Self::StartTime),
            "direction" => Some(Self::Direction),
            "relatedreason" => Some(Self::RelatedReason),
            "callingnumber" => Some(Self::CallingNumber),
            "callednumber" => Some(Self::CalledNumber),
            "useruuid" => Some(Self::UserUuid),
            _ => None,
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Direction of a call leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Leg seen from the initiating side.
    Originating,
    /// Leg seen from the receiving side.
    Terminating,
    /// Any other reported value.
    Other,
}

impl Direction {
    /// Parses a reported direction. Matching is exact; unknown values,
    /// including padded or lowercase spellings, map to [`Direction::Other`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "ORIGINATING" => Self::Originating,
            "TERMINATING" => Self::Terminating,
            _ => Self::Other,
        }
    }

    /// Returns the platform spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Originating => "ORIGINATING",
            Self::Terminating => "TERMINATING",
            Self::Other => "OTHER",
        }
    }
}

/// One of the two party numbers on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    /// The calling party.
    Calling,
    /// The called party.
    Called,
}

impl Party {
    /// Both parties, calling first.
    pub const BOTH: [Self; 2] = [Self::Calling, Self::Called];

    /// Returns the record field holding this party's number.
    #[must_use]
    pub const fn field(&self) -> RecordField {
        match self {
            Self::Calling => RecordField::CallingNumber,
            Self::Called => RecordField::CalledNumber,
        }
    }
}

/// One leg of one call.
///
/// Field values are the raw reported strings. Party numbers never have
/// their role embedded in the value; the role lives next to it and is only
/// rendered into the string by [`CallRecord::display_number`] and
/// serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRecord {
    fields: BTreeMap<String, String>,
    calling_role: Option<PartyRole>,
    called_role: Option<PartyRole>,
}

impl CallRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record from `(column, value)` pairs.
    ///
    /// Known columns are normalized to their report header.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in fields {
            record.set(key.as_ref(), value);
        }
        record
    }

    /// Sets a column, returning the record.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a column value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = RecordField::from_key(key)
            .map_or_else(|| key.trim().to_string(), |field| field.header().to_string());
        self.fields.insert(key, value.into());
    }

    /// Returns the raw value of any column.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = RecordField::from_key(key).map_or(key, |field| field.header());
        self.fields.get(key).map(String::as_str)
    }

    /// Returns a pipeline field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the record does not carry the field.
    pub fn field(&self, field: RecordField) -> Result<&str> {
        self.fields
            .get(field.header())
            .map(String::as_str)
            .ok_or_else(|| Error::MissingField {
                field: field.header(),
                record: self.label().to_string(),
            })
    }

    /// Returns the correlation id.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing.
    pub fn correlation_id(&self) -> Result<&str> {
        self.field(RecordField::CorrelationId)
    }

    /// Returns the start time.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing.
    pub fn start_time(&self) -> Result<&str> {
        self.field(RecordField::StartTime)
    }

    /// Returns the leg direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing.
    pub fn direction(&self) -> Result<Direction> {
        self.field(RecordField::Direction).map(Direction::parse)
    }

    /// Returns the related reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing.
    pub fn related_reason(&self) -> Result<&str> {
        self.field(RecordField::RelatedReason)
    }

    /// Returns the user identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing.
    pub fn user_uuid(&self) -> Result<&str> {
        self.field(RecordField::UserUuid)
    }

    /// Returns a party's raw number, without any role tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing.
    pub fn number(&self, party: Party) -> Result<&str> {
        self.field(party.field())
    }

    /// Returns the role assigned to a party number.
    #[must_use]
    pub const fn role(&self, party: Party) -> Option<PartyRole> {
        match party {
            Party::Calling => self.calling_role,
            Party::Called => self.called_role,
        }
    }

    /// Returns whether a party number already carries a role.
    #[must_use]
    pub const fn is_annotated(&self, party: Party) -> bool {
        self.role(party).is_some()
    }

    /// Assigns a role to a party number unless it already has one.
    ///
    /// Returns `true` if the role was assigned.
    pub fn annotate(&mut self, party: Party, role: PartyRole) -> bool {
        let slot = match party {
            Party::Calling => &mut self.calling_role,
            Party::Called => &mut self.called_role,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(role);
        true
    }

    /// Renders a party number with its role tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the number field is missing.
    pub fn display_number(&self, party: Party) -> Result<String> {
        Ok(render_annotated(self.number(party)?, self.role(party)))
    }

    /// Iterates over all raw columns in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns all columns with party numbers rendered for display.
    #[must_use]
    pub fn display_fields(&self) -> BTreeMap<String, String> {
        let mut fields = self.fields.clone();
        for party in Party::BOTH {
            if let Some(value) = fields.get_mut(party.field().header()) {
                *value = render_annotated(value, self.role(party));
            }
        }
        fields
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Short label for log and error messages.
    fn label(&self) -> &str {
        self.fields
            .get(RecordField::CorrelationId.header())
            .map_or(UNKNOWN_RECORD, String::as_str)
    }
}

/// Converts a structured value to the string a report column would hold.
fn value_to_field(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl Serialize for CallRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = self.display_fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CallRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_fields(
            raw.into_iter().map(|(k, v)| (k, value_to_field(v))),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CallRecord {
        CallRecord::new()
            .with_field("Correlation ID", "C1")
            .with_field("Start time", "2024-01-01T10:00:00.000Z")
            .with_field("Direction", "TERMINATING")
            .with_field("Calling number", "5559999")
            .with_field("Called number", "5551234")
            .with_field("Duration", "42")
    }

    #[test]
    fn test_key_aliases_normalize_to_header() {
        let record = CallRecord::from_fields([
            ("CorrelationID", "C1"),
            ("start_time", "t"),
            ("USER UUID", "u"),
        ]);
        assert_eq!(record.correlation_id().unwrap(), "C1");
        assert_eq!(record.start_time().unwrap(), "t");
        assert_eq!(record.user_uuid().unwrap(), "u");
        assert_eq!(record.get("Correlation ID"), Some("C1"));
        assert_eq!(record.get("correlation_id"), Some("C1"));
    }

    #[test]
    fn test_missing_field_error_names_field_and_record() {
        let record = CallRecord::new().with_field("Correlation ID", "C9");
        let err = record.start_time().unwrap_err();
        assert_eq!(
            err.to_string(),
            "record C9 is missing field 'Start time'"
        );

        let anonymous = CallRecord::new();
        let err = anonymous.correlation_id().unwrap_err();
        assert!(err.to_string().contains("<unknown>"));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("ORIGINATING"), Direction::Originating);
        assert_eq!(Direction::parse("TERMINATING"), Direction::Terminating);
        assert_eq!(Direction::parse(" TERMINATING "), Direction::Other);
        assert_eq!(Direction::parse("terminating"), Direction::Other);
        assert_eq!(sample().direction().unwrap(), Direction::Terminating);
    }

    #[test]
    fn test_annotate_first_role_wins() {
        let mut record = sample();
        assert!(record.annotate(Party::Called, PartyRole::WxccDialNumber));
        assert!(!record.annotate(Party::Called, PartyRole::WebexUser));
        assert_eq!(record.role(Party::Called), Some(PartyRole::WxccDialNumber));
        assert!(!record.is_annotated(Party::Calling));

        assert_eq!(record.number(Party::Called).unwrap(), "5551234");
        assert_eq!(
            record.display_number(Party::Called).unwrap(),
            "5551234 (WxCC Dial Number)"
        );
    }

    #[test]
    fn test_display_fields_render_roles_only_for_numbers() {
        let mut record = sample();
        record.annotate(Party::Calling, PartyRole::WebexUser);
        let fields = record.display_fields();
        assert_eq!(fields["Calling number"], "5559999 (Webex User)");
        assert_eq!(fields["Called number"], "5551234");
        assert_eq!(fields["Duration"], "42");
    }

    #[test]
    fn test_deserialize_stringifies_values() {
        let record: CallRecord = serde_json::from_str(
            r#"{"Correlation ID": "C1", "Duration": 12, "Answered": true, "Site": null}"#,
        )
        .unwrap();
        assert_eq!(record.get("Duration"), Some("12"));
        assert_eq!(record.get("Answered"), Some("true"));
        assert_eq!(record.get("Site"), Some(""));
    }

    #[test]
    fn test_serialize_renders_roles() {
        let mut record = sample();
        record.annotate(Party::Called, PartyRole::WebexCallQueue);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Called number"], "5551234 (Webex Call Queue)");
        assert_eq!(json["Correlation ID"], "C1");
    }
}
