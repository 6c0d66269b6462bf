//! Change detection against the persisted tracking state.

use crate::store::SnapshotStore;
use crate::types::{BillSnapshot, Meeting, MeetingRecord, MeetingStatus};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Deterministic dedup key for a (bill, action) pair:
/// `{bill_id}_{action_date}_{sha256 of the first 50 chars of the text,
/// truncated to 12 hex chars}`. A key already present in the posted map is
/// never published again.
pub fn dedup_key(bill_id: &str, action_date: &str, action_text: &str) -> String {
    let head: String = action_text.chars().take(50).collect();
    let mut hasher = Sha256::new();
    hasher.update(head.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}_{}_{}", bill_id, action_date, &digest[..12])
}

/// Tracks which bill ids have been considered within one run, so a bill
/// appearing twice in the fetched list is processed once (first wins).
#[derive(Debug, Default)]
pub struct SeenThisRun {
    ids: HashSet<String>,
}

impl SeenThisRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a bill id is offered
    pub fn first_occurrence(&mut self, bill_id: &str) -> bool {
        self.ids.insert(bill_id.to_string())
    }
}

/// Has the bill's latest action changed since the persisted snapshot?
/// A difference in either the date or the text counts, whether or not the
/// new action is itself significant.
pub fn bill_changed(snapshots: &SnapshotStore, bill_id: &str, action_date: &str, action_text: &str) -> bool {
    match snapshots.get(bill_id) {
        Some(snapshot) => snapshot.action_date != action_date || snapshot.action_text != action_text,
        None => true,
    }
}

/// Build the snapshot to persist for a bill's latest action
pub fn snapshot_for(action_date: &str, action_text: &str) -> BillSnapshot {
    BillSnapshot {
        action_date: action_date.to_string(),
        action_text: action_text.to_string(),
    }
}

/// Classified change for one fetched meeting
#[derive(Debug, Clone, PartialEq)]
pub enum MeetingChange {
    New,
    Rescheduled { previous_date: String },
    Canceled { previous_date: String },
    Unchanged,
}

/// Compare a fetched meeting against its tracking record.
///
/// Meetings that silently vanish from a future fetch window are not
/// handled here at all: without an explicit canceled status the upstream
/// signal is ambiguous, so nothing is posted and the record is left as-is.
pub fn classify_meeting_change(previous: Option<&MeetingRecord>, current: &Meeting) -> MeetingChange {
    let previous = match previous {
        Some(record) => record,
        // A meeting first seen already canceled is recorded but never
        // announced
        None if current.status == MeetingStatus::Canceled => return MeetingChange::Unchanged,
        None => return MeetingChange::New,
    };

    if current.status == MeetingStatus::Canceled {
        if previous.status == MeetingStatus::Canceled {
            return MeetingChange::Unchanged;
        }
        return MeetingChange::Canceled {
            previous_date: previous.date.clone(),
        };
    }

    let status_moved = matches!(
        current.status,
        MeetingStatus::Rescheduled | MeetingStatus::Postponed
    ) && current.status != previous.status;

    if status_moved || current.date != previous.date {
        return MeetingChange::Rescheduled {
            previous_date: previous.date.clone(),
        };
    }

    MeetingChange::Unchanged
}

/// Build the tracking record to persist for a fetched meeting
pub fn record_for(meeting: &Meeting) -> MeetingRecord {
    MeetingRecord {
        status: meeting.status,
        date: meeting.date.clone(),
        committee: meeting.committee.clone(),
        title: meeting.title.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;
    use crate::types::Chamber;
    use tempfile::tempdir;

    fn meeting(status: MeetingStatus, date: &str) -> Meeting {
        Meeting {
            event_id: "EVENT-1".to_string(),
            chamber: Chamber::House,
            committee: "Committee on Rules".to_string(),
            date: date.to_string(),
            status,
            title: "Markup of H.R. 471".to_string(),
            room: None,
            bill_refs: vec!["H.R. 471".to_string()],
        }
    }

    #[test]
    fn dedup_key_is_deterministic() {
        let a = dedup_key("hr471", "2025-03-01", "Passed House by the Yeas and Nays: 279 - 141");
        let b = dedup_key("hr471", "2025-03-01", "Passed House by the Yeas and Nays: 279 - 141");
        assert_eq!(a, b);
        assert!(a.starts_with("hr471_2025-03-01_"));
    }

    #[test]
    fn dedup_key_varies_with_inputs() {
        let a = dedup_key("hr471", "2025-03-01", "Passed House");
        let b = dedup_key("hr471", "2025-03-02", "Passed House");
        let c = dedup_key("hr471", "2025-03-01", "Passed Senate");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn dedup_key_uses_only_first_fifty_chars() {
        let base = "x".repeat(50);
        let a = dedup_key("hr1", "2025-01-01", &format!("{}tail one", base));
        let b = dedup_key("hr1", "2025-01-01", &format!("{}another tail", base));
        assert_eq!(a, b);
    }

    #[test]
    fn first_occurrence_wins_within_run() {
        let mut seen = SeenThisRun::new();
        assert!(seen.first_occurrence("hr471"));
        assert!(!seen.first_occurrence("hr471"));
        assert!(seen.first_occurrence("s99"));
    }

    #[test]
    fn unseen_bill_is_changed() {
        let dir = tempdir().unwrap();
        let snapshots: SnapshotStore = JsonStore::open(dir.path().join("snap.json")).unwrap();
        assert!(bill_changed(&snapshots, "hr471", "2025-03-01", "Passed House"));
    }

    #[test]
    fn matching_snapshot_is_unchanged() {
        let dir = tempdir().unwrap();
        let mut snapshots: SnapshotStore = JsonStore::open(dir.path().join("snap.json")).unwrap();
        snapshots.insert("hr471", snapshot_for("2025-03-01", "Passed House"));
        assert!(!bill_changed(&snapshots, "hr471", "2025-03-01", "Passed House"));
        assert!(bill_changed(&snapshots, "hr471", "2025-03-02", "Passed House"));
        assert!(bill_changed(&snapshots, "hr471", "2025-03-01", "Passed Senate"));
    }

    #[test]
    fn untracked_meeting_is_new() {
        let change = classify_meeting_change(None, &meeting(MeetingStatus::Scheduled, "2025-04-02T10:00:00"));
        assert_eq!(change, MeetingChange::New);
    }

    #[test]
    fn meeting_first_seen_canceled_is_not_announced() {
        let change = classify_meeting_change(None, &meeting(MeetingStatus::Canceled, "2025-04-02T10:00:00"));
        assert_eq!(change, MeetingChange::Unchanged);
    }

    #[test]
    fn scheduled_to_canceled_reports_previous_date() {
        let previous = record_for(&meeting(MeetingStatus::Scheduled, "2025-04-02T10:00:00"));
        let change = classify_meeting_change(
            Some(&previous),
            &meeting(MeetingStatus::Canceled, "2025-04-02T10:00:00"),
        );
        assert_eq!(
            change,
            MeetingChange::Canceled {
                previous_date: "2025-04-02T10:00:00".to_string()
            }
        );
    }

    #[test]
    fn date_move_is_rescheduled() {
        let previous = record_for(&meeting(MeetingStatus::Scheduled, "2025-04-02T10:00:00"));
        let change = classify_meeting_change(
            Some(&previous),
            &meeting(MeetingStatus::Scheduled, "2025-04-09T10:00:00"),
        );
        assert_eq!(
            change,
            MeetingChange::Rescheduled {
                previous_date: "2025-04-02T10:00:00".to_string()
            }
        );
    }

    #[test]
    fn postponed_status_is_rescheduled() {
        let previous = record_for(&meeting(MeetingStatus::Scheduled, "2025-04-02T10:00:00"));
        let change = classify_meeting_change(
            Some(&previous),
            &meeting(MeetingStatus::Postponed, "2025-04-02T10:00:00"),
        );
        assert!(matches!(change, MeetingChange::Rescheduled { .. }));
    }

    #[test]
    fn identical_meeting_is_unchanged() {
        let previous = record_for(&meeting(MeetingStatus::Scheduled, "2025-04-02T10:00:00"));
        let change = classify_meeting_change(
            Some(&previous),
            &meeting(MeetingStatus::Scheduled, "2025-04-02T10:00:00"),
        );
        assert_eq!(change, MeetingChange::Unchanged);
        // Already-canceled meetings do not repost
        let canceled = record_for(&meeting(MeetingStatus::Canceled, "2025-04-02T10:00:00"));
        let change = classify_meeting_change(
            Some(&canceled),
            &meeting(MeetingStatus::Canceled, "2025-04-02T10:00:00"),
        );
        assert_eq!(change, MeetingChange::Unchanged);
    }
}
