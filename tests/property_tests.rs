//! Property-based tests for the pipeline stages.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Grouping keeps every non-noise record exactly once
//! - Deduplication is order-insensitive and idempotent
//! - Both deduplication strategies agree
//! - Ordering is a stable sort by start time
//! - Categorization assigns at most one role per number

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use callflow::models::{CallHistory, CallRecord, Party, PartyRole, ReferenceDirectory};
use callflow::services::deduplication::{DedupStrategy, DeduplicationConfig};
use callflow::services::{
    CategorizationService, DeduplicationService, GroupingService, OrderingService,
};
use callflow::{DialNumberEntry, PhoneNumberEntry, QueueNumberEntry, UserEntry};
use proptest::prelude::*;

const NOISE: &str = "PushNotificationRetrieval";

/// A leg drawn from a small alphabet so collisions are common.
#[derive(Debug, Clone)]
struct Leg {
    correlation_id: String,
    start: String,
    direction: &'static str,
    reason: &'static str,
    calling: String,
    called: String,
    user: String,
    seq: usize,
}

impl Leg {
    fn to_record(&self) -> CallRecord {
        CallRecord::new()
            .with_field("Correlation ID", self.correlation_id.clone())
            .with_field("Start time", self.start.clone())
            .with_field("Direction", self.direction)
            .with_field("Related reason", self.reason)
            .with_field("Calling number", self.calling.clone())
            .with_field("Called number", self.called.clone())
            .with_field("User UUID", self.user.clone())
            .with_field("Seq", self.seq.to_string())
    }
}

fn leg_strategy() -> impl Strategy<Value = Leg> {
    (
        prop::sample::select(vec!["C1", "C2", "C3"]),
        prop::sample::select(vec!["09:00", "09:30", "10:00"]),
        prop::sample::select(vec!["ORIGINATING", "TERMINATING", "UNKNOWN"]),
        prop::sample::select(vec!["", "", "", NOISE, "CallForward"]),
        prop::sample::select(vec!["100", "200", "300", "400", "500"]),
        prop::sample::select(vec!["100", "200", "300", "400", "500"]),
        prop::sample::select(vec!["u1", "u2", "u3"]),
    )
        .prop_map(
            |(correlation_id, start, direction, reason, calling, called, user)| Leg {
                correlation_id: correlation_id.to_string(),
                start: start.to_string(),
                direction,
                reason,
                calling: calling.to_string(),
                called: called.to_string(),
                user: user.to_string(),
                seq: 0,
            },
        )
}

fn legs_strategy(max: usize) -> impl Strategy<Value = Vec<Leg>> {
    prop::collection::vec(leg_strategy(), 0..max).prop_map(|mut legs| {
        for (i, leg) in legs.iter_mut().enumerate() {
            leg.seq = i;
        }
        legs
    })
}

fn records(legs: &[Leg]) -> Vec<CallRecord> {
    legs.iter().map(Leg::to_record).collect()
}

fn seqs(history: &CallHistory, correlation_id: &str) -> Vec<String> {
    history
        .get(correlation_id)
        .map(|group| {
            group
                .iter()
                .map(|r| r.get("Seq").unwrap().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn directory() -> ReferenceDirectory {
    ReferenceDirectory::new()
        .with_dial_numbers(vec![DialNumberEntry::new("100")])
        .with_users(vec![
            UserEntry::new("u1").with_agent_profile("p1"),
            UserEntry::new("u2"),
        ])
        .with_queue_numbers(vec![QueueNumberEntry::new("200")])
        .with_phone_numbers(vec![
            PhoneNumberEntry::new("100", "PEOPLE"),
            PhoneNumberEntry::new("300", "PEOPLE"),
            PhoneNumberEntry::new("400", "PLACE"),
        ])
}

fn dedup(strategy: DedupStrategy, history: CallHistory) -> CallHistory {
    DeduplicationService::new(DeduplicationConfig::new(strategy))
        .deduplicate(history)
        .unwrap()
}

// ============================================================================
// Grouping
// ============================================================================

proptest! {
    /// Property: every non-noise record lands in its own correlation group,
    /// in input order, and noise never appears.
    #[test]
    fn prop_grouping_partitions_records(legs in legs_strategy(30)) {
        let history = GroupingService::new().group(records(&legs)).unwrap();

        let kept: Vec<&Leg> = legs.iter().filter(|l| l.reason != NOISE).collect();
        prop_assert_eq!(history.record_count(), kept.len());

        for id in ["C1", "C2", "C3"] {
            let expected: Vec<String> = kept
                .iter()
                .filter(|l| l.correlation_id == id)
                .map(|l| l.seq.to_string())
                .collect();
            prop_assert_eq!(seqs(&history, id), expected);
        }

        for record in history.records() {
            prop_assert_ne!(record.get("Related reason"), Some(NOISE));
        }
    }
}

// ============================================================================
// Deduplication
// ============================================================================

proptest! {
    /// Property: the terminating leg survives and the originating copy is
    /// removed, whichever comes first.
    #[test]
    fn prop_dedup_keeps_terminating_leg(
        start in "[0-9]{2}:[0-9]{2}",
        called in "[0-9]{3,7}",
        originating_first in any::<bool>(),
    ) {
        let terminating = CallRecord::new()
            .with_field("Start time", start.clone())
            .with_field("Called number", called.clone())
            .with_field("Direction", "TERMINATING");
        let originating = CallRecord::new()
            .with_field("Start time", start)
            .with_field("Called number", called)
            .with_field("Direction", "ORIGINATING");
        let group = if originating_first {
            vec![originating, terminating.clone()]
        } else {
            vec![terminating.clone(), originating]
        };

        let mut history = CallHistory::new();
        history.insert_group("C1", group.into_iter().collect());

        for strategy in [DedupStrategy::Pairwise, DedupStrategy::Indexed] {
            let result = dedup(strategy, history.clone());
            prop_assert_eq!(result.get("C1").unwrap().records(), std::slice::from_ref(&terminating));
        }
    }

    /// Property: deduplicating twice changes nothing the second time.
    #[test]
    fn prop_dedup_is_idempotent(legs in legs_strategy(30)) {
        let history = GroupingService::new().group(records(&legs)).unwrap();
        let once = dedup(DedupStrategy::Pairwise, history);
        let twice = dedup(DedupStrategy::Pairwise, once.clone());
        prop_assert_eq!(once, twice);
    }

    /// Property: both strategies produce identical histories.
    #[test]
    fn prop_dedup_strategies_agree(legs in legs_strategy(40)) {
        let history = GroupingService::new().group(records(&legs)).unwrap();
        let pairwise = dedup(DedupStrategy::Pairwise, history.clone());
        let indexed = dedup(DedupStrategy::Indexed, history.clone());
        prop_assert_eq!(&pairwise, &indexed);

        // Removal never drops whole groups.
        prop_assert_eq!(pairwise.len(), history.len());
    }
}

// ============================================================================
// Ordering
// ============================================================================

proptest! {
    /// Property: ordering matches a stable sort of the input by start time.
    #[test]
    fn prop_ordering_is_stable_sort(legs in legs_strategy(30)) {
        let history = GroupingService::new().group(records(&legs)).unwrap();
        let ordered = OrderingService::new().order(history.clone()).unwrap();

        for id in ["C1", "C2", "C3"] {
            let mut expected: Vec<&Leg> = legs
                .iter()
                .filter(|l| l.reason != NOISE && l.correlation_id == id)
                .collect();
            expected.sort_by(|a, b| a.start.cmp(&b.start));
            let expected: Vec<String> = expected.iter().map(|l| l.seq.to_string()).collect();
            prop_assert_eq!(seqs(&ordered, id), expected);
        }
    }
}

// ============================================================================
// Categorization
// ============================================================================

proptest! {
    /// Property: each number carries at most one role, and the rendered
    /// value starts with the raw number.
    #[test]
    fn prop_single_annotation_keeps_number_prefix(legs in legs_strategy(30)) {
        let service = CategorizationService::new(directory());
        let history = GroupingService::new().group(records(&legs)).unwrap();
        let categorized = service.categorize(history.clone()).unwrap();
        let twice = service.categorize(categorized.clone()).unwrap();
        prop_assert_eq!(&categorized, &twice);

        for record in categorized.records() {
            for party in Party::BOTH {
                let raw = record.number(party).unwrap();
                let rendered = record.display_number(party).unwrap();
                prop_assert!(rendered.starts_with(raw));
                match record.role(party) {
                    Some(role) => {
                        prop_assert_eq!(rendered.matches('(').count(), 1);
                        prop_assert!(rendered.ends_with(&role.tag()));
                    },
                    None => prop_assert_eq!(rendered, raw),
                }
            }
        }
    }

    /// Property: a number in both the dial numbers and the phone numbers is
    /// always tagged as a dial number.
    #[test]
    fn prop_dial_number_beats_phone_number(legs in legs_strategy(30)) {
        let service = CategorizationService::new(directory());
        let history = GroupingService::new().group(records(&legs)).unwrap();
        let categorized = service.categorize(history).unwrap();

        for record in categorized.records() {
            for party in Party::BOTH {
                if record.number(party).unwrap() == "100" {
                    prop_assert_eq!(record.role(party), Some(PartyRole::WxccDialNumber));
                }
            }
        }
    }
}

#[test]
fn test_ordering_ties_keep_input_order() {
    let legs: Vec<Leg> = ["10:00", "09:00", "09:00"]
        .iter()
        .enumerate()
        .map(|(seq, start)| Leg {
            correlation_id: "C1".to_string(),
            start: (*start).to_string(),
            direction: "TERMINATING",
            reason: "",
            calling: format!("{seq}"),
            called: format!("9{seq}"),
            user: "u".to_string(),
            seq,
        })
        .collect();

    let history = GroupingService::new().group(records(&legs)).unwrap();
    let ordered = OrderingService::new().order(history).unwrap();
    assert_eq!(seqs(&ordered, "C1"), vec!["1", "2", "0"]);
}
