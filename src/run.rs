//! One tracker run, end to end.
//!
//! A run walks recent bill activity, keeps only significant changes that
//! have not been posted, enriches and renders the survivors in priority
//! order, then diffs both committee calendars against their tracking
//! records. Every tracking document is saved at the end whether or not
//! anything was posted, so first runs seed a baseline without spamming.

use crate::calendar::CalendarClient;
use crate::classify::{classify, extract_vote, is_significant, Priority};
use crate::config::Config;
use crate::detect::{
    bill_changed, classify_meeting_change, dedup_key, record_for, snapshot_for, MeetingChange,
    SeenThisRun,
};
use crate::error::Result;
use crate::fetch::{BillStub, CongressClient};
use crate::format::{render_bill_post, render_meeting_post, BillPostInput};
use crate::progress::whats_next;
use crate::publish::Publisher;
use crate::store::{JsonStore, MeetingStore, PostedStore, SnapshotStore, SummaryStore};
use crate::summary::SummaryClient;
use crate::types::{Meeting, PostedRecord};
use chrono::Utc;
use futures::StreamExt;
use std::time::Duration;
use tracing::{info, warn};

/// Counters reported by one run
#[derive(Debug, Default, Clone, Copy)]
pub struct RunReport {
    pub bills_checked: usize,
    pub bill_posts: usize,
    pub meetings_checked: usize,
    pub meeting_posts: usize,
}

/// A significant, unposted bill change awaiting enrichment
struct Candidate {
    stub: BillStub,
    action_date: String,
    action_text: String,
    key: String,
    priority: Priority,
}

pub struct Tracker {
    config: Config,
    congress: CongressClient,
    calendar: CalendarClient,
    summaries: SummaryClient,
    publisher: Box<dyn Publisher>,
}

impl Tracker {
    pub fn new(config: Config, publisher: Box<dyn Publisher>) -> Self {
        Self {
            congress: CongressClient::new(&config),
            calendar: CalendarClient::new(),
            summaries: SummaryClient::new(&config),
            publisher,
            config,
        }
    }

    /// Execute one full run
    pub async fn run(&self) -> Result<RunReport> {
        let mut posted: PostedStore = JsonStore::open(self.config.posted_path())?;
        let mut snapshots: SnapshotStore = JsonStore::open(self.config.snapshots_path())?;
        let mut summaries: SummaryStore = JsonStore::open(self.config.summaries_path())?;
        let mut meetings: MeetingStore = JsonStore::open(self.config.meetings_path())?;

        let mut report = RunReport::default();
        self.process_bills(&mut report, &mut posted, &mut snapshots, &mut summaries)
            .await;
        self.process_meetings(&mut report, &mut meetings).await;

        // Saved unconditionally: a quiet run still advances snapshots
        for (name, result) in [
            ("posted", posted.save()),
            ("snapshots", snapshots.save()),
            ("summaries", summaries.save()),
            ("meetings", meetings.save()),
        ] {
            if let Err(e) = result {
                warn!(store = name, error = %e, "Failed to save tracking store");
            }
        }

        info!(
            bills = report.bills_checked,
            bill_posts = report.bill_posts,
            meetings = report.meetings_checked,
            meeting_posts = report.meeting_posts,
            "Run complete"
        );
        Ok(report)
    }

    async fn process_bills(
        &self,
        report: &mut RunReport,
        posted: &mut PostedStore,
        snapshots: &mut SnapshotStore,
        summaries: &mut SummaryStore,
    ) {
        let stubs: Vec<BillStub> = self
            .congress
            .recent_bills(self.config.days_back)
            .collect()
            .await;
        report.bills_checked = stubs.len();

        let mut seen = SeenThisRun::new();
        let mut candidates: Vec<Candidate> = Vec::new();
        for stub in stubs {
            let bill_id = stub.id();
            if !seen.first_occurrence(&bill_id) {
                continue;
            }
            let (action_date, action_text) = match stub.latest_action.clone() {
                Some(action) => action,
                None => continue,
            };
            if !bill_changed(snapshots, &bill_id, &action_date, &action_text) {
                continue;
            }
            // The snapshot only advances here for changes that will never
            // be posted; posting candidates advance it on publish success,
            // so a failed or capped-out publish is retried next run
            if !is_significant(&action_text) {
                snapshots.insert(&bill_id, snapshot_for(&action_date, &action_text));
                continue;
            }
            let key = dedup_key(&bill_id, &action_date, &action_text);
            if posted.contains_key(&key) {
                snapshots.insert(&bill_id, snapshot_for(&action_date, &action_text));
                continue;
            }
            let priority = classify(&action_text, stub.bill_type).priority;
            candidates.push(Candidate {
                stub,
                action_date,
                action_text,
                key,
                priority,
            });
        }

        // Stable sort keeps fetch order within a priority band
        candidates.sort_by_key(|c| c.priority.rank());

        for candidate in candidates {
            if report.bill_posts >= self.config.max_bill_posts {
                info!(cap = self.config.max_bill_posts, "Reached bill post cap");
                break;
            }
            if self.post_bill(&candidate, posted, snapshots, summaries).await {
                report.bill_posts += 1;
                tokio::time::sleep(Duration::from_millis(self.config.post_delay_ms)).await;
            }
        }
    }

    /// Enrich, render, and publish one candidate. Returns whether a post
    /// went out.
    async fn post_bill(
        &self,
        candidate: &Candidate,
        posted: &mut PostedStore,
        snapshots: &mut SnapshotStore,
        summaries: &mut SummaryStore,
    ) -> bool {
        let stub = &candidate.stub;
        let bill = match self.congress.full_bill(stub.bill_type, stub.number).await {
            Some(bill) => bill,
            None => {
                warn!(bill = %stub.id(), "Detail fetch failed, skipping");
                return false;
            }
        };

        let actions = self.congress.actions(stub.bill_type, stub.number).await;
        let history: Vec<_> = actions
            .iter()
            .filter(|action| action.text != candidate.action_text)
            .cloned()
            .collect();

        // The list endpoint drops recorded-vote pointers, so look the
        // action up in the full history before resolving totals
        let structured = match actions.iter().find(|a| a.text == candidate.action_text) {
            Some(action) => self.congress.resolve_vote(action).await,
            None => None,
        };
        let vote = extract_vote(&candidate.action_text, structured);
        let classification =
            classify(&candidate.action_text, stub.bill_type).with_vote(vote.as_ref());

        let enacted = SummaryClient::is_enacted(&candidate.action_text);
        let summary = self
            .summaries
            .summarize_cached(summaries, &bill, enacted)
            .await;

        let input = BillPostInput {
            display_id: bill.display_id(),
            emoji: classification.emoji.to_string(),
            label: classification.label.clone(),
            sponsor: bill.sponsor.as_ref().map(|s| s.display()),
            committees: bill.committees.clone(),
            whats_next: whats_next(&candidate.action_text, stub.bill_type, &history),
            summary: Some(summary),
            url: bill.url(self.config.congress),
        };
        let text = render_bill_post(&input, self.config.post_style);

        match self.publisher.publish(&text).await {
            Ok(id) => {
                info!(bill = %stub.id(), post_id = %id, label = %classification.label, "Posted bill update");
                posted.insert(
                    &candidate.key,
                    PostedRecord {
                        posted_at: Utc::now(),
                        text,
                        test_mode: !self.publisher.is_live(),
                    },
                );
                snapshots.insert(
                    stub.id(),
                    snapshot_for(&candidate.action_date, &candidate.action_text),
                );
                true
            }
            Err(e) => {
                // Neither the posted map nor the snapshot advances, so
                // the change is retried next run
                warn!(bill = %stub.id(), error = %e, "Publish failed");
                false
            }
        }
    }

    async fn process_meetings(&self, report: &mut RunReport, meetings: &mut MeetingStore) {
        let mut fetched: Vec<Meeting> = Vec::new();
        if let Some(url) = &self.config.calendar_feed_url {
            fetched.extend(self.calendar.fetch_feed(url).await);
        }
        if let Some(url) = &self.config.weekly_schedule_url {
            fetched.extend(self.calendar.fetch_weekly(url).await);
        }
        report.meetings_checked = fetched.len();

        let cap = category_cap(self.config.max_meeting_posts);
        let (mut new, mut rescheduled, mut canceled) = (0usize, 0usize, 0usize);

        for meeting in fetched {
            let change = classify_meeting_change(meetings.get(&meeting.event_id), &meeting);

            let counter = match &change {
                MeetingChange::New => &mut new,
                MeetingChange::Rescheduled { .. } => &mut rescheduled,
                MeetingChange::Canceled { .. } => &mut canceled,
                MeetingChange::Unchanged => {
                    meetings.insert(&meeting.event_id, record_for(&meeting));
                    continue;
                }
            };
            // Both the per-category split and the overall cap apply;
            // skipped changes stay untracked so they are announced next run
            if *counter >= cap || report.meeting_posts >= self.config.max_meeting_posts {
                continue;
            }

            let text = match render_meeting_post(&meeting, &change) {
                Some(text) => text,
                None => continue,
            };
            match self.publisher.publish(&text).await {
                Ok(id) => {
                    info!(event = %meeting.event_id, post_id = %id, "Posted meeting update");
                    meetings.insert(&meeting.event_id, record_for(&meeting));
                    *counter += 1;
                    report.meeting_posts += 1;
                    tokio::time::sleep(Duration::from_millis(self.config.post_delay_ms)).await;
                }
                Err(e) => {
                    warn!(event = %meeting.event_id, error = %e, "Publish failed");
                }
            }
        }
    }

    /// Probe each upstream dependency and print the results
    pub async fn check(&self) -> Result<()> {
        match self.congress.check().await {
            Some(count) => println!("✅ Legislative API: OK ({count} bills tracked)"),
            None => println!("❌ Legislative API: unreachable"),
        }
        match self.publisher.verify().await {
            Ok(identity) => println!("✅ Publisher: authenticated as {identity}"),
            Err(e) => println!("❌ Publisher: {e}"),
        }
        match self.summaries.check().await {
            Ok(()) => println!("✅ Summary generation: OK"),
            Err(e) => println!("❌ Summary generation: {e}"),
        }
        Ok(())
    }
}

/// Per-category meeting post allowance: the overall cap split three ways,
/// never below one
fn category_cap(max_meeting_posts: usize) -> usize {
    (max_meeting_posts / 3).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_cap_splits_three_ways() {
        assert_eq!(category_cap(6), 2);
        assert_eq!(category_cap(9), 3);
        assert_eq!(category_cap(1), 1);
        assert_eq!(category_cap(0), 1);
    }

    #[test]
    fn candidate_sort_is_stable_within_priority() {
        use crate::types::BillType;
        let mut candidates = vec![
            ("hr1", Priority::Routine),
            ("hr2", Priority::ChamberPassage),
            ("hr3", Priority::Routine),
            ("hr4", Priority::Enacted),
        ];
        candidates.sort_by_key(|(_, priority)| priority.rank());
        let order: Vec<&str> = candidates.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec!["hr4", "hr2", "hr1", "hr3"]);
        // Enacted outranks everything classify can produce
        assert_eq!(classify("Became Public Law No: 119-4.", BillType::Hr).priority, Priority::Enacted);
    }
}
