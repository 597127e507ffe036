//! Role matchers, one per reference list.
//!
//! Each matcher compares a record against one list of the
//! [`ReferenceDirectory`] and assigns a role to every party number that
//! matched and does not carry a role yet.

use crate::models::{
    CallRecord, Direction, PEOPLE_OWNER_TYPE, Party, PartyRole, ReferenceDirectory,
};
use crate::{Error, Result};

/// A role assigned to one party number of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    /// The annotated party.
    pub party: Party,
    /// The assigned role.
    pub role: PartyRole,
}

/// One categorization step.
pub trait RoleMatcher: Send + Sync {
    /// Step name for logs.
    fn name(&self) -> &'static str;

    /// Annotates the record from the directory.
    ///
    /// Returns the annotations this step made.
    ///
    /// # Errors
    ///
    /// Returns an error if the record lacks a field the step reads, or if a
    /// directory entry is malformed.
    fn categorize(
        &self,
        record: &mut CallRecord,
        directory: &ReferenceDirectory,
    ) -> Result<Vec<Annotation>>;
}

/// Annotates every unannotated party whose raw number equals `candidate`.
fn tag_equal_parties(
    record: &mut CallRecord,
    candidate: &str,
    role: PartyRole,
    applied: &mut Vec<Annotation>,
) -> Result<()> {
    for party in Party::BOTH {
        if record.is_annotated(party) || record.number(party)? != candidate {
            continue;
        }
        if record.annotate(party, role) {
            applied.push(Annotation { party, role });
        }
    }
    Ok(())
}

/// Tags contact center dial numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialNumberMatcher;

impl RoleMatcher for DialNumberMatcher {
    fn name(&self) -> &'static str {
        "dial_numbers"
    }

    fn categorize(
        &self,
        record: &mut CallRecord,
        directory: &ReferenceDirectory,
    ) -> Result<Vec<Annotation>> {
        let mut applied = Vec::new();
        for number in directory
            .dial_numbers
            .iter()
            .filter_map(|entry| entry.dialled_number.as_deref())
        {
            tag_equal_parties(record, number, PartyRole::WxccDialNumber, &mut applied)?;
        }
        Ok(applied)
    }
}

/// Tags the number of the contact center user a leg belongs to.
///
/// The user's number is the calling number on an originating leg and the
/// called number on a terminating leg. The step only runs while the called
/// number has no role, whichever side it would tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserMatcher;

impl RoleMatcher for UserMatcher {
    fn name(&self) -> &'static str {
        "users"
    }

    fn categorize(
        &self,
        record: &mut CallRecord,
        directory: &ReferenceDirectory,
    ) -> Result<Vec<Annotation>> {
        let user_uuid = record.user_uuid()?;
        let Some(user) = directory.users.iter().find(|u| u.ci_user_id == user_uuid) else {
            return Ok(Vec::new());
        };
        if record.is_annotated(Party::Called) {
            return Ok(Vec::new());
        }

        let role = if user.is_agent() {
            PartyRole::WxccAgentUser
        } else {
            PartyRole::WxccUser
        };
        let party = match record.direction()? {
            Direction::Originating => Party::Calling,
            Direction::Terminating => Party::Called,
            Direction::Other => return Ok(Vec::new()),
        };

        if record.annotate(party, role) {
            Ok(vec![Annotation { party, role }])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Tags call queue numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueMatcher;

impl RoleMatcher for QueueMatcher {
    fn name(&self) -> &'static str {
        "queues"
    }

    fn categorize(
        &self,
        record: &mut CallRecord,
        directory: &ReferenceDirectory,
    ) -> Result<Vec<Annotation>> {
        let mut applied = Vec::new();
        for number in directory
            .queue_numbers
            .iter()
            .filter_map(|entry| entry.phone_number.as_deref())
        {
            tag_equal_parties(record, number, PartyRole::WebexCallQueue, &mut applied)?;
        }
        Ok(applied)
    }
}

/// Tags platform phone numbers by owner type.
///
/// Every entry that carries a number must name its owner type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneNumberMatcher;

impl RoleMatcher for PhoneNumberMatcher {
    fn name(&self) -> &'static str {
        "phone_numbers"
    }

    fn categorize(
        &self,
        record: &mut CallRecord,
        directory: &ReferenceDirectory,
    ) -> Result<Vec<Annotation>> {
        let mut applied = Vec::new();
        for entry in &directory.phone_numbers {
            let Some(number) = entry.phone_number.as_deref() else {
                continue;
            };
            let owner_type = entry
                .owner_type()
                .ok_or_else(|| Error::InvalidDirectory {
                    directory: "phone_numbers",
                    reason: format!("entry {number} has no owner type"),
                })?;
            let role = if owner_type == PEOPLE_OWNER_TYPE {
                PartyRole::WebexUser
            } else {
                PartyRole::WebexNumber
            };
            tag_equal_parties(record, number, role, &mut applied)?;
        }
        Ok(applied)
    }
}

/// Returns the four matchers in priority order.
#[must_use]
pub fn default_matchers() -> Vec<Box<dyn RoleMatcher>> {
    vec![
        Box::new(DialNumberMatcher),
        Box::new(UserMatcher),
        Box::new(QueueMatcher),
        Box::new(PhoneNumberMatcher),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DialNumberEntry, PhoneNumberEntry, QueueNumberEntry, UserEntry};

    fn record(calling: &str, called: &str, direction: &str, user: &str) -> CallRecord {
        CallRecord::new()
            .with_field("Calling number", calling)
            .with_field("Called number", called)
            .with_field("Direction", direction)
            .with_field("User UUID", user)
    }

    #[test]
    fn test_dial_number_tags_both_sides() {
        let directory = ReferenceDirectory::new().with_dial_numbers(vec![
            DialNumberEntry::new("100"),
            DialNumberEntry { dialled_number: None },
        ]);
        let mut rec = record("100", "100", "ORIGINATING", "u");

        let applied = DialNumberMatcher.categorize(&mut rec, &directory).unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(rec.role(Party::Calling), Some(PartyRole::WxccDialNumber));
        assert_eq!(rec.role(Party::Called), Some(PartyRole::WxccDialNumber));
    }

    #[test]
    fn test_user_matches_by_direction() {
        let directory = ReferenceDirectory::new().with_users(vec![
            UserEntry::new("agent").with_agent_profile("p1"),
            UserEntry::new("plain"),
        ]);

        let mut originating = record("100", "200", "ORIGINATING", "agent");
        UserMatcher.categorize(&mut originating, &directory).unwrap();
        assert_eq!(originating.role(Party::Calling), Some(PartyRole::WxccAgentUser));
        assert_eq!(originating.role(Party::Called), None);

        let mut terminating = record("100", "200", "TERMINATING", "plain");
        UserMatcher.categorize(&mut terminating, &directory).unwrap();
        assert_eq!(terminating.role(Party::Calling), None);
        assert_eq!(terminating.role(Party::Called), Some(PartyRole::WxccUser));
    }

    #[test]
    fn test_user_step_gated_on_called_number() {
        let directory = ReferenceDirectory::new().with_users(vec![UserEntry::new("u")]);
        let mut rec = record("100", "200", "ORIGINATING", "u");
        rec.annotate(Party::Called, PartyRole::WxccDialNumber);

        let applied = UserMatcher.categorize(&mut rec, &directory).unwrap();
        assert!(applied.is_empty());
        assert_eq!(rec.role(Party::Calling), None);
    }

    #[test]
    fn test_user_step_never_overwrites() {
        let directory = ReferenceDirectory::new().with_users(vec![UserEntry::new("u")]);
        let mut rec = record("100", "200", "ORIGINATING", "u");
        rec.annotate(Party::Calling, PartyRole::WxccDialNumber);

        assert!(UserMatcher.categorize(&mut rec, &directory).unwrap().is_empty());
        assert_eq!(rec.role(Party::Calling), Some(PartyRole::WxccDialNumber));
    }

    #[test]
    fn test_first_matching_user_wins() {
        let directory = ReferenceDirectory::new().with_users(vec![
            UserEntry::new("u"),
            UserEntry::new("u").with_agent_profile("p"),
        ]);
        let mut rec = record("100", "200", "TERMINATING", "u");
        UserMatcher.categorize(&mut rec, &directory).unwrap();
        assert_eq!(rec.role(Party::Called), Some(PartyRole::WxccUser));
    }

    #[test]
    fn test_queue_match() {
        let directory =
            ReferenceDirectory::new().with_queue_numbers(vec![QueueNumberEntry::new("300")]);
        let mut rec = record("100", "300", "ORIGINATING", "u");
        QueueMatcher.categorize(&mut rec, &directory).unwrap();
        assert_eq!(rec.role(Party::Called), Some(PartyRole::WebexCallQueue));
    }

    #[test]
    fn test_phone_number_owner_types() {
        let directory = ReferenceDirectory::new().with_phone_numbers(vec![
            PhoneNumberEntry::new("100", "PEOPLE"),
            PhoneNumberEntry::new("200", "VIRTUAL_LINE"),
        ]);
        let mut rec = record("100", "200", "ORIGINATING", "u");
        PhoneNumberMatcher.categorize(&mut rec, &directory).unwrap();
        assert_eq!(rec.role(Party::Calling), Some(PartyRole::WebexUser));
        assert_eq!(rec.role(Party::Called), Some(PartyRole::WebexNumber));
    }

    #[test]
    fn test_phone_number_without_owner_type_fails() {
        let directory = ReferenceDirectory::new().with_phone_numbers(vec![PhoneNumberEntry {
            phone_number: Some("900".to_string()),
            owner: None,
        }]);
        let mut rec = record("100", "200", "ORIGINATING", "u");
        let err = PhoneNumberMatcher.categorize(&mut rec, &directory).unwrap_err();
        assert!(matches!(err, Error::InvalidDirectory { .. }));
    }

    #[test]
    fn test_phone_entry_without_number_is_skipped() {
        let directory = ReferenceDirectory::new().with_phone_numbers(vec![PhoneNumberEntry {
            phone_number: None,
            owner: None,
        }]);
        let mut rec = record("100", "200", "ORIGINATING", "u");
        assert!(
            PhoneNumberMatcher
                .categorize(&mut rec, &directory)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_default_matchers_priority() {
        let names: Vec<_> = default_matchers().iter().map(|m| m.name()).collect();
        assert_eq!(names, ["dial_numbers", "users", "queues", "phone_numbers"]);
    }
}
