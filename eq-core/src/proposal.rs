//! Typed output of message extraction, input to reconciliation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The kind of action a message asks for. Closed set: adding a kind is a
/// compile-time-checked change at every match site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Appointment,
    Task,
    Query,
}

/// A structured action extracted from a free-text message.
///
/// Transient: produced by the extractor, consumed by the reconciler, never
/// stored. Optional mentions are `None` when absent, never empty strings.
/// The date is timezone-less as on the wire; it is pinned to UTC only when a
/// record is created from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionProposal {
    pub horse_name: Option<String>,
    pub owner_name: Option<String>,
    pub kind: ActionKind,
    pub details: String,
    pub date: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_round_trips_wire_tags() {
        for (kind, tag) in [
            (ActionKind::Appointment, "\"APPOINTMENT\""),
            (ActionKind::Task, "\"TASK\""),
            (ActionKind::Query, "\"QUERY\""),
        ] {
            assert_eq!(serde_json::to_string(&kind).expect("serialize"), tag);
            let back: ActionKind = serde_json::from_str(tag).expect("deserialize");
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn proposal_deserializes_with_absent_optionals() {
        let p: ActionProposal = serde_json::from_str(
            r#"{"horse_name":null,"owner_name":null,"kind":"QUERY","details":"Boarding costs?","date":null}"#,
        )
        .expect("deserialize proposal");
        assert_eq!(p.kind, ActionKind::Query);
        assert!(p.horse_name.is_none());
        assert!(p.date.is_none());
    }
}
