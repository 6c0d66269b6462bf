//! Classification of free-text legislative actions.
//!
//! Everything here is pure string matching: an ordered first-match-wins
//! rule table maps an action description to a label, an emoji, and a
//! priority rank, with a separate significance test deciding whether the
//! action is worth posting at all.

use crate::types::{BillType, VoteTotals};
use regex::Regex;

/// An action description with its lowercase form precomputed for matching
#[derive(Debug, Clone)]
pub struct ActionText {
    raw: String,
    lower: String,
}

impl ActionText {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            lower: raw.to_lowercase(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Case-insensitive substring test
    pub fn has(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }
}

/// Priority rank over action categories. Lower rank posts first when a
/// per-run cap is reached; ties keep fetch order (stable sort).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Signed into law, vetoed, veto overridden or sustained
    Enacted = 1,
    /// Passed the House or the Senate
    ChamberPassage = 2,
    /// Conference report filed or agreed to
    Conference = 3,
    /// Cloture or a committee report
    CommitteeStage = 4,
    /// Everything else
    Routine = 5,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

/// Structured signals derived from one action description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: String,
    pub emoji: &'static str,
    pub priority: Priority,
}

impl Classification {
    fn new(label: impl Into<String>, emoji: &'static str, priority: Priority) -> Self {
        Self {
            label: label.into(),
            emoji,
            priority,
        }
    }

    /// Append a vote outcome to the label, e.g. "Passed House (279-141)"
    pub fn with_vote(mut self, vote: Option<&VoteOutcome>) -> Self {
        if let Some(vote) = vote {
            self.label = format!("{} {}", self.label, vote.display());
        }
        self
    }
}

/// One entry in the ordered rule table
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&ActionText, BillType) -> Option<Classification>,
}

/// Ordered rule table, first match wins. Order matters: negations come
/// before the positive forms they contain ("cloture not invoked" before
/// "cloture invoked"), and veto handling before the generic veto check.
pub const RULES: &[Rule] = &[
    Rule { name: "became_law", apply: rule_became_law },
    Rule { name: "pocket_veto", apply: rule_pocket_veto },
    Rule { name: "veto_override_failed", apply: rule_veto_override_failed },
    Rule { name: "veto_override_passed", apply: rule_veto_override_passed },
    Rule { name: "vetoed", apply: rule_vetoed },
    Rule { name: "measure_tabled", apply: rule_measure_tabled },
    Rule { name: "indefinitely_postponed", apply: rule_indefinitely_postponed },
    Rule { name: "failed_of_passage", apply: rule_failed_of_passage },
    Rule { name: "recommit_agreed", apply: rule_recommit_agreed },
    Rule { name: "recommit_failed", apply: rule_recommit_failed },
    Rule { name: "passed_house", apply: rule_passed_house },
    Rule { name: "passed_senate", apply: rule_passed_senate },
    Rule { name: "conference_agreed", apply: rule_conference_agreed },
    Rule { name: "conference_filed", apply: rule_conference_filed },
    Rule { name: "cloture_not_invoked", apply: rule_cloture_not_invoked },
    Rule { name: "cloture_invoked", apply: rule_cloture_invoked },
    Rule { name: "cloture_filed", apply: rule_cloture_filed },
    Rule { name: "ordered_reported", apply: rule_ordered_reported },
    Rule { name: "reported_by", apply: rule_reported_by },
    Rule { name: "discharged", apply: rule_discharged },
    Rule { name: "placed_on_calendar", apply: rule_placed_on_calendar },
    Rule { name: "resolving_differences", apply: rule_resolving_differences },
    Rule { name: "motion_to_proceed", apply: rule_motion_to_proceed },
    Rule { name: "presented", apply: rule_presented },
    Rule { name: "introduced", apply: rule_introduced },
    Rule { name: "referred", apply: rule_referred },
    Rule { name: "amendment", apply: rule_amendment },
    Rule { name: "floor_vote", apply: rule_floor_vote },
];

/// Classify an action description. Falls back to the truncated raw text
/// when no rule matches.
pub fn classify(text: &str, bill_type: BillType) -> Classification {
    let action = ActionText::new(text);
    for rule in RULES {
        if let Some(result) = (rule.apply)(&action, bill_type) {
            return result;
        }
    }
    Classification::new(truncate_text(action.raw(), 60), "📌", Priority::Routine)
}

fn rule_became_law(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("became public law") || a.has("signed by president") {
        return Some(Classification::new("Signed into Law", "📜✍️", Priority::Enacted));
    }
    None
}

fn rule_pocket_veto(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("pocket veto") {
        // No override vote is possible after a pocket veto
        return Some(Classification::new("Pocket Vetoed", "❌", Priority::Enacted));
    }
    None
}

fn rule_veto_override_failed(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("veto") && (a.has("failed of passage") || (a.has("override") && (a.has("failed") || a.has("rejected")))) {
        return Some(Classification::new("Veto Override Failed", "❌", Priority::Enacted));
    }
    None
}

fn rule_veto_override_passed(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("veto") && (a.has("passed over") || a.has("two-thirds") || (a.has("override") && a.has("agreed"))) {
        return Some(Classification::new("Veto Overridden", "🔁", Priority::Enacted));
    }
    None
}

fn rule_vetoed(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("veto") {
        return Some(Classification::new("Vetoed by President", "❌", Priority::Enacted));
    }
    None
}

fn rule_measure_tabled(a: &ActionText, t: BillType) -> Option<Classification> {
    // Tabling the measure itself kills it. "Motion to reconsider laid on
    // the table" never reaches this rule: it lacks "motion to table".
    if a.has("motion to table") && a.has("agreed") {
        return Some(Classification::new(
            format!("{} Tabled", t.noun()),
            "🚫",
            Priority::Routine,
        ));
    }
    None
}

fn rule_indefinitely_postponed(a: &ActionText, t: BillType) -> Option<Classification> {
    if a.has("indefinitely postponed") {
        return Some(Classification::new(
            format!("{} Indefinitely Postponed", t.noun()),
            "🚫",
            Priority::Routine,
        ));
    }
    None
}

fn rule_failed_of_passage(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("failed of passage") {
        return Some(Classification::new("Failed of Passage", "❌", Priority::Routine));
    }
    None
}

fn rule_recommit_agreed(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("motion to recommit") && a.has("agreed") {
        return Some(Classification::new("Recommitted to Committee", "↩️", Priority::Routine));
    }
    None
}

fn rule_recommit_failed(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("motion to recommit") && (a.has("failed") || a.has("rejected")) {
        return Some(Classification::new("Motion to Recommit Failed", "📌", Priority::Routine));
    }
    None
}

fn rule_passed_house(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("passed") && a.has("house") {
        return Some(Classification::new("Passed House", "✅🏛️", Priority::ChamberPassage));
    }
    None
}

fn rule_passed_senate(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("passed") && a.has("senate") {
        return Some(Classification::new("Passed Senate", "✅🏛️", Priority::ChamberPassage));
    }
    None
}

fn rule_conference_agreed(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("conference report") && (a.has("agreed") || a.has("adopted")) {
        return Some(Classification::new("Conference Report Agreed To", "🤝", Priority::Conference));
    }
    None
}

fn rule_conference_filed(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("conference report") {
        return Some(Classification::new("Conference Report Filed", "🤝", Priority::Conference));
    }
    None
}

fn rule_cloture_not_invoked(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("cloture") && (a.has("not invoked") || a.has("rejected") || a.has("failed")) {
        return Some(Classification::new("Cloture Not Invoked", "⏱️", Priority::CommitteeStage));
    }
    None
}

fn rule_cloture_invoked(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("cloture") && (a.has("invoked") || a.has("agreed")) {
        return Some(Classification::new("Cloture Invoked", "⏱️", Priority::CommitteeStage));
    }
    None
}

fn rule_cloture_filed(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("cloture") {
        return Some(Classification::new("Cloture Motion Filed", "⏱️", Priority::CommitteeStage));
    }
    None
}

fn rule_ordered_reported(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("ordered reported") || a.has("ordered to be reported") {
        return Some(Classification::new(
            "Ordered Reported by Committee",
            "📊",
            Priority::CommitteeStage,
        ));
    }
    None
}

fn rule_reported_by(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("reported by") {
        let label = match extract_committee(a.raw()) {
            Some(committee) => format!("Reported by {}", committee),
            None => "Reported by Committee".to_string(),
        };
        return Some(Classification::new(label, "📊", Priority::CommitteeStage));
    }
    None
}

fn rule_discharged(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("discharged from") {
        return Some(Classification::new("Discharged from Committee", "📤", Priority::Routine));
    }
    None
}

fn rule_placed_on_calendar(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("placed on") && a.has("calendar") {
        let label = if a.has("senate") {
            "Placed on Senate Calendar"
        } else if a.has("house") {
            "Placed on House Calendar"
        } else {
            "Placed on Calendar"
        };
        return Some(Classification::new(label, "📅", Priority::Routine));
    }
    None
}

fn rule_resolving_differences(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("resolving differences") {
        return Some(Classification::new("Resolving Differences", "🔄", Priority::Routine));
    }
    None
}

fn rule_motion_to_proceed(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("motion to proceed") {
        let label = if a.has("agreed") {
            "Motion to Proceed Agreed To"
        } else {
            "Motion to Proceed Filed"
        };
        return Some(Classification::new(label, "▶️", Priority::Routine));
    }
    None
}

fn rule_presented(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("presented to president") {
        return Some(Classification::new("Presented to the President", "🖋️", Priority::Routine));
    }
    None
}

fn rule_introduced(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("introduced") {
        return Some(Classification::new("Introduced", "📋", Priority::Routine));
    }
    None
}

fn rule_referred(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("referred to") {
        return Some(Classification::new("Referred to Committee", "📁", Priority::Routine));
    }
    None
}

fn rule_amendment(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("amendment") {
        return Some(Classification::new(truncate_text(a.raw(), 60), "📝", Priority::Routine));
    }
    None
}

fn rule_floor_vote(a: &ActionText, _t: BillType) -> Option<Classification> {
    if a.has("vote") || a.has("roll call") {
        return Some(Classification::new(truncate_text(a.raw(), 60), "🗳️", Priority::Routine));
    }
    None
}

/// Significance keyword set, final revision. "agreed to" and "adopted"
/// were dropped from earlier revisions and are intentionally absent.
const SIGNIFICANT_KEYWORDS: &[&str] = &[
    "passed",
    "signed by president",
    "became public law",
    "veto",
    "reported by",
    "ordered reported",
    "placed on calendar",
    "placed on the calendar",
    "cloture",
    "conference report",
    "resolving differences",
    "motion to proceed",
    "discharged from",
    "laid on the table",
    "indefinitely postponed",
    "failed of passage",
];

/// Decide whether an action is significant enough to post about.
///
/// "Motion to reconsider laid on the table" reaffirms a prior vote rather
/// than killing the measure, so it is carved out even though "laid on the
/// table" alone would match. Tabling the measure itself ("motion to table
/// ... agreed") does kill it and is significant.
pub fn is_significant(text: &str) -> bool {
    let action = ActionText::new(text);

    if action.has("motion to reconsider") && action.has("laid on the table") {
        return false;
    }
    if action.has("motion to table") && action.has("agreed") {
        return true;
    }

    SIGNIFICANT_KEYWORDS.iter().any(|keyword| action.has(keyword))
}

/// Vote outcome parsed out of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded(VoteTotals),
    VoiceVote,
    UnanimousConsent,
}

impl VoteOutcome {
    pub fn display(&self) -> String {
        match self {
            VoteOutcome::Recorded(totals) => format!("({}-{})", totals.yea, totals.nay),
            VoteOutcome::VoiceVote => "(voice vote)".to_string(),
            VoteOutcome::UnanimousConsent => "(unanimous consent)".to_string(),
        }
    }
}

/// Extract a vote outcome. A structured roll-call total wins over text
/// parsing; failing both, voice vote and unanimous consent are recognized
/// as non-numeric outcomes.
pub fn extract_vote(text: &str, structured: Option<VoteTotals>) -> Option<VoteOutcome> {
    if let Some(totals) = structured {
        if totals.yea > 0 || totals.nay > 0 {
            return Some(VoteOutcome::Recorded(totals));
        }
    }

    let action = ActionText::new(text);
    if let Ok(regex) = Regex::new(r"(\d{1,3})\s*[-–]\s*(\d{1,3})") {
        if let Some(caps) = regex.captures(action.raw()) {
            let yea = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let nay = caps.get(2).and_then(|m| m.as_str().parse().ok());
            if let (Some(yea), Some(nay)) = (yea, nay) {
                return Some(VoteOutcome::Recorded(VoteTotals { yea, nay }));
            }
        }
    }

    if action.has("voice vote") {
        return Some(VoteOutcome::VoiceVote);
    }
    if action.has("unanimous consent") {
        return Some(VoteOutcome::UnanimousConsent);
    }
    None
}

/// Pull the committee name out of "Reported by the Committee on ..."
fn extract_committee(text: &str) -> Option<String> {
    let regex = Regex::new(r"(?i)reported by[:\s]+(?:the\s+)?(.+?)(?:\.|,|$)").ok()?;
    let caps = regex.captures(text)?;
    let committee = caps.get(1)?.as_str().trim();
    if committee.is_empty() {
        return None;
    }
    Some(truncate_text(committee, 40))
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", truncated)
}
