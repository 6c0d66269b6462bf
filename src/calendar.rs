//! Committee-calendar sources.
//!
//! Two upstream shapes feed the same `Meeting` record: an XML committee
//! schedule (one element per meeting with committee, chamber, date, matter,
//! room, status) and an HTML weekly-schedule page (a table of committee,
//! date, time, title). Both are parsed with the loose HTML5 parser, which
//! lowercases element names, so all selectors here are lowercase. Fetch or
//! parse failures degrade to an empty list; the run continues.

use crate::types::{Chamber, Meeting, MeetingStatus};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Client for the two calendar sources
pub struct CalendarClient {
    http: reqwest::Client,
}

impl Default for CalendarClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Fetch and parse the XML committee feed. Any failure is logged and
    /// yields an empty list.
    pub async fn fetch_feed(&self, url: &str) -> Vec<Meeting> {
        match self.fetch_text(url).await {
            Some(body) => parse_feed(&body),
            None => Vec::new(),
        }
    }

    /// Fetch and parse the HTML weekly schedule. Any failure is logged and
    /// yields an empty list.
    pub async fn fetch_weekly(&self, url: &str) -> Vec<Meeting> {
        match self.fetch_text(url).await {
            Some(body) => parse_weekly(&body),
            None => Vec::new(),
        }
    }

    async fn fetch_text(&self, url: &str) -> Option<String> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "Calendar fetch failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(url, status = %response.status(), "Calendar fetch returned error status");
            return None;
        }
        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url, error = %e, "Failed to read calendar body");
                None
            }
        }
    }
}

/// Parse the XML committee feed
pub fn parse_feed(body: &str) -> Vec<Meeting> {
    let document = Html::parse_document(body);
    let meeting_sel = match Selector::parse("meeting") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };

    document
        .select(&meeting_sel)
        .filter_map(parse_feed_meeting)
        .collect()
}

fn parse_feed_meeting(element: ElementRef) -> Option<Meeting> {
    let committee = child_text(element, "committee")?;
    let date = child_text(element, "date")?;
    let title = child_text(element, "matter").unwrap_or_else(|| "Committee meeting".to_string());

    let chamber = child_text(element, "chamber")
        .map(|c| Chamber::from(c.as_str()))
        .unwrap_or(Chamber::House);
    let status = child_text(element, "status")
        .map(|s| MeetingStatus::from(s.as_str()))
        .unwrap_or(MeetingStatus::Scheduled);
    let event_id = element
        .value()
        .attr("id")
        .map(|id| id.to_string())
        .unwrap_or_else(|| derived_event_id(&committee, &date));

    Some(Meeting {
        event_id,
        chamber,
        committee,
        date,
        status,
        room: child_text(element, "room"),
        bill_refs: extract_bill_refs(&title),
        title,
    })
}

/// Parse the HTML weekly-schedule table. Rows carry class="meeting" with
/// committee/date/time/title cells; cancellations only appear as text in
/// the title, so status is recovered from there.
pub fn parse_weekly(body: &str) -> Vec<Meeting> {
    let document = Html::parse_document(body);
    let row_sel = match Selector::parse("tr.meeting") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };

    document
        .select(&row_sel)
        .filter_map(parse_weekly_row)
        .collect()
}

fn parse_weekly_row(row: ElementRef) -> Option<Meeting> {
    let committee = child_text(row, "td.committee")?;
    let date = child_text(row, "td.date")?;
    let time = child_text(row, "td.time");
    let title = child_text(row, "td.title").unwrap_or_else(|| "Committee meeting".to_string());

    let date = match time {
        Some(time) => format!("{} {}", date, time),
        None => date,
    };
    let status = MeetingStatus::from(title.as_str());
    let event_id = row
        .value()
        .attr("data-event-id")
        .map(|id| id.to_string())
        .unwrap_or_else(|| derived_event_id(&committee, &date));

    Some(Meeting {
        event_id,
        // The weekly schedule page covers Senate committees
        chamber: Chamber::Senate,
        committee,
        date,
        status,
        room: None,
        bill_refs: extract_bill_refs(&title),
        title,
    })
}

/// Stable event id for sources that do not hand one out
fn derived_event_id(committee: &str, date: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(committee.as_bytes());
    hasher.update(date.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("meeting-{}", &digest[..16])
}

/// Pull bill citations like "H.R. 471" or "S.J.Res. 12" out of free text
pub fn extract_bill_refs(text: &str) -> Vec<String> {
    let pattern = r"(?i)\b(h\.?\s?j\.?\s?res\.?|s\.?\s?j\.?\s?res\.?|h\.?\s?con\.?\s?res\.?|s\.?\s?con\.?\s?res\.?|h\.?\s?res\.?|s\.?\s?res\.?|h\.?\s?r\.?|s\.?)\s?(\d+)\b";
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_) => return Vec::new(),
    };

    let mut refs = Vec::new();
    for caps in regex.captures_iter(text) {
        let citation = caps.get(0).map(|m| m.as_str().trim().to_string());
        if let Some(citation) = citation {
            if !refs.contains(&citation) {
                refs.push(citation);
            }
        }
    }
    refs
}

fn child_text(element: ElementRef, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let child = element.select(&selector).next()?;
    let text: String = child.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<committee-schedule>
  <meeting id="HHRG-119-RU00">
    <committee>Committee on Rules</committee>
    <chamber>House</chamber>
    <date>2025-04-02T10:00:00</date>
    <matter>Markup of H.R. 471 and H.J.Res. 20</matter>
    <room>H-313</room>
    <status>Scheduled</status>
  </meeting>
  <meeting id="HHRG-119-AG00">
    <committee>Committee on Agriculture</committee>
    <chamber>House</chamber>
    <date>2025-04-03T14:00:00</date>
    <matter>Hearing on rural broadband</matter>
    <status>Canceled</status>
  </meeting>
</committee-schedule>"#;

    const WEEKLY: &str = r#"<html><body>
<table class="schedule">
  <tr class="meeting" data-event-id="SSAF-2025-04-02">
    <td class="committee">Committee on Armed Services</td>
    <td class="date">2025-04-02</td>
    <td class="time">09:30</td>
    <td class="title">Markup of S. 99</td>
  </tr>
  <tr class="meeting">
    <td class="committee">Committee on Finance</td>
    <td class="date">2025-04-04</td>
    <td class="time">10:00</td>
    <td class="title">CANCELED: Hearing on tax administration</td>
  </tr>
</table>
</body></html>"#;

    #[test]
    fn feed_parses_meetings() {
        let meetings = parse_feed(FEED);
        assert_eq!(meetings.len(), 2);

        let first = &meetings[0];
        assert_eq!(first.event_id, "HHRG-119-RU00");
        assert_eq!(first.committee, "Committee on Rules");
        assert_eq!(first.chamber, Chamber::House);
        assert_eq!(first.status, MeetingStatus::Scheduled);
        assert_eq!(first.room.as_deref(), Some("H-313"));
        assert_eq!(first.bill_refs, vec!["H.R. 471".to_string(), "H.J.Res. 20".to_string()]);

        assert_eq!(meetings[1].status, MeetingStatus::Canceled);
        assert!(meetings[1].room.is_none());
    }

    #[test]
    fn weekly_parses_rows() {
        let meetings = parse_weekly(WEEKLY);
        assert_eq!(meetings.len(), 2);

        let first = &meetings[0];
        assert_eq!(first.event_id, "SSAF-2025-04-02");
        assert_eq!(first.chamber, Chamber::Senate);
        assert_eq!(first.date, "2025-04-02 09:30");
        assert_eq!(first.bill_refs, vec!["S. 99".to_string()]);

        // Missing id derives a stable one; cancellation read from title
        let second = &meetings[1];
        assert!(second.event_id.starts_with("meeting-"));
        assert_eq!(second.status, MeetingStatus::Canceled);
    }

    #[test]
    fn derived_ids_are_stable() {
        let a = derived_event_id("Committee on Finance", "2025-04-04 10:00");
        let b = derived_event_id("Committee on Finance", "2025-04-04 10:00");
        assert_eq!(a, b);
    }

    #[test]
    fn garbage_input_parses_to_empty() {
        assert!(parse_feed("not xml at all").is_empty());
        assert!(parse_weekly("<html><body>nothing here</body></html>").is_empty());
    }

    #[test]
    fn bill_refs_are_deduplicated_and_ordered() {
        let refs = extract_bill_refs("Markup of H.R. 471, S. 12, and H.R. 471 again");
        assert_eq!(refs, vec!["H.R. 471".to_string(), "S. 12".to_string()]);
    }

    #[test]
    fn joint_resolution_matches_before_bare_s() {
        let refs = extract_bill_refs("Consideration of S.J.Res. 7");
        assert_eq!(refs, vec!["S.J.Res. 7".to_string()]);
    }
}
