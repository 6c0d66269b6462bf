use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Legislation type codes used by the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillType {
    Hr,
    S,
    Hjres,
    Sjres,
    Hconres,
    Sconres,
    Hres,
    Sres,
}

impl BillType {
    /// Parse an API type code like "hr" or "SJRES"
    pub fn parse(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "hr" => Some(BillType::Hr),
            "s" => Some(BillType::S),
            "hjres" => Some(BillType::Hjres),
            "sjres" => Some(BillType::Sjres),
            "hconres" => Some(BillType::Hconres),
            "sconres" => Some(BillType::Sconres),
            "hres" => Some(BillType::Hres),
            "sres" => Some(BillType::Sres),
            _ => None,
        }
    }

    /// Lowercase API code, also used in bill ids and URLs
    pub fn code(&self) -> &'static str {
        match self {
            BillType::Hr => "hr",
            BillType::S => "s",
            BillType::Hjres => "hjres",
            BillType::Sjres => "sjres",
            BillType::Hconres => "hconres",
            BillType::Sconres => "sconres",
            BillType::Hres => "hres",
            BillType::Sres => "sres",
        }
    }

    /// Human-readable citation form
    pub fn display(&self) -> &'static str {
        match self {
            BillType::Hr => "H.R.",
            BillType::S => "S.",
            BillType::Hjres => "H.J.Res.",
            BillType::Sjres => "S.J.Res.",
            BillType::Hconres => "H.Con.Res.",
            BillType::Sconres => "S.Con.Res.",
            BillType::Hres => "H.Res.",
            BillType::Sres => "S.Res.",
        }
    }

    /// Simple and concurrent resolutions never reach the president
    pub fn is_simple_or_concurrent(&self) -> bool {
        matches!(
            self,
            BillType::Hres | BillType::Sres | BillType::Hconres | BillType::Sconres
        )
    }

    /// Simple resolutions terminate on passage in their own chamber
    pub fn is_simple_resolution(&self) -> bool {
        matches!(self, BillType::Hres | BillType::Sres)
    }

    /// "Bill" vs "Resolution" for labels like "Bill Tabled"
    pub fn noun(&self) -> &'static str {
        match self {
            BillType::Hr | BillType::S => "Bill",
            _ => "Resolution",
        }
    }
}

/// Congressional chamber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    House,
    Senate,
}

impl From<&str> for Chamber {
    fn from(s: &str) -> Self {
        if s.to_lowercase().contains("senate") {
            Chamber::Senate
        } else {
            Chamber::House
        }
    }
}

impl Chamber {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chamber::House => "House",
            Chamber::Senate => "Senate",
        }
    }
}

/// Bill sponsor as reported by the upstream API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsor {
    pub name: String,
    pub party: Option<String>,
    pub state: Option<String>,
    pub chamber: Option<String>,
}

impl Sponsor {
    /// Render as "Rep. Jane Doe [D-IL]" style, degrading when fields are missing
    pub fn display(&self) -> String {
        // Upstream sometimes bakes the honorific into the name already
        let prefix = if self.name.starts_with("Rep.") || self.name.starts_with("Sen.") {
            ""
        } else {
            match self.chamber.as_deref() {
                Some(c) if c.to_lowercase().contains("senate") => "Sen. ",
                Some(_) => "Rep. ",
                None => "",
            }
        };
        match (self.party.as_deref(), self.state.as_deref()) {
            (Some(party), Some(state)) => format!("{}{} [{}-{}]", prefix, self.name, party, state),
            _ => format!("{}{}", prefix, self.name),
        }
    }
}

/// A single action from a bill's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillAction {
    #[serde(rename = "actionDate", default)]
    pub date: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "recordedVotes", default)]
    pub recorded_votes: Vec<RecordedVote>,
}

/// Pointer to a roll-call vote attached to an action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedVote {
    #[serde(default)]
    pub chamber: String,
    #[serde(rename = "rollNumber")]
    pub roll_number: Option<u32>,
}

/// Yea/nay totals from a roll-call vote record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTotals {
    pub yea: u32,
    pub nay: u32,
}

/// A bill with the enrichment needed to render a post.
///
/// Fetched fresh each run; never mutated locally except as the cached
/// snapshot used for comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub bill_type: BillType,
    pub number: u32,
    pub title: String,
    pub short_title: Option<String>,
    pub sponsor: Option<Sponsor>,
    /// Ordered, deduplicated committee names
    pub committees: Vec<String>,
    pub latest_action: Option<BillAction>,
    /// Official abstract from the summaries endpoint, when one exists
    pub official_summary: Option<String>,
}

impl Bill {
    /// Identifier like "hr471"
    pub fn id(&self) -> String {
        format!("{}{}", self.bill_type.code(), self.number)
    }

    /// Citation like "H.R. 471"
    pub fn display_id(&self) -> String {
        format!("{} {}", self.bill_type.display(), self.number)
    }

    /// Public bill page for the given congress
    pub fn url(&self, congress: u32) -> String {
        format!(
            "https://congress.gov/bill/{}th-congress/{}/{}",
            congress,
            self.bill_type.code(),
            self.number
        )
    }
}

/// Scheduling status of a committee meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Scheduled,
    Rescheduled,
    Postponed,
    Canceled,
}

impl From<&str> for MeetingStatus {
    fn from(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("cancel") {
            MeetingStatus::Canceled
        } else if lower.contains("postpone") {
            MeetingStatus::Postponed
        } else if lower.contains("reschedul") {
            MeetingStatus::Rescheduled
        } else {
            MeetingStatus::Scheduled
        }
    }
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "Scheduled",
            MeetingStatus::Rescheduled => "Rescheduled",
            MeetingStatus::Postponed => "Postponed",
            MeetingStatus::Canceled => "Canceled",
        }
    }
}

/// A committee meeting normalized from either calendar source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub event_id: String,
    pub chamber: Chamber,
    pub committee: String,
    /// Scheduled date/time as reported by the source
    pub date: String,
    pub status: MeetingStatus,
    pub title: String,
    pub room: Option<String>,
    /// Bill citations pulled from the meeting title
    pub bill_refs: Vec<String>,
}

/// Persisted record of a published post, keyed by dedup key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedRecord {
    pub posted_at: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub test_mode: bool,
}

/// Persisted latest-action snapshot for a bill, keyed by bill id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillSnapshot {
    pub action_date: String,
    pub action_text: String,
}

/// Persisted tracking record for a meeting, keyed by event id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub status: MeetingStatus,
    pub date: String,
    pub committee: String,
    pub title: String,
}
