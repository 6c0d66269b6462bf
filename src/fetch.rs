//! Legislative-data API client.
//!
//! Every call degrades on failure: transport and HTTP-status errors are
//! logged and mapped to an empty or missing result so the run continues
//! with defaults. There is no retry or backoff; a failed request is
//! simply dropped and picked up again on a later run.

use crate::config::Config;
use crate::types::{Bill, BillAction, BillType, Sponsor, VoteTotals};
use async_stream::stream;
use chrono::Utc;
use futures::Stream;
use regex::Regex;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// Page size for list endpoints, the maximum the API allows
const PAGE_LIMIT: u64 = 250;

/// A bill as it appears in the recent-activity list, before detail fetch
#[derive(Debug, Clone)]
pub struct BillStub {
    pub bill_type: BillType,
    pub number: u32,
    /// Latest action (date, text) as reported by the list endpoint
    pub latest_action: Option<(String, String)>,
}

impl BillStub {
    pub fn id(&self) -> String {
        format!("{}{}", self.bill_type.code(), self.number)
    }
}

/// Client for the legislative data API
pub struct CongressClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
    congress: u32,
    page_delay: Duration,
}

impl CongressClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            congress: config.congress,
            page_delay: Duration::from_millis(config.page_delay_ms),
        }
    }

    /// GET a JSON document, treating any failure as "no data"
    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Option<Value> {
        let mut query: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
        ];
        query.extend(params.iter().cloned());

        let response = match self.http.get(url).query(&query).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "Request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(url, status = %response.status(), "Request returned error status");
            return None;
        }
        match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(url, error = %e, "Failed to parse response body");
                None
            }
        }
    }

    /// Stream bills with activity inside the trailing window, walking the
    /// offset/limit pagination until the reported total is exhausted or a
    /// page comes back empty. A short delay separates pages.
    pub fn recent_bills(&self, days_back: u32) -> impl Stream<Item = BillStub> + '_ {
        stream! {
            let from_date = (Utc::now() - chrono::Duration::days(days_back as i64))
                .format("%Y-%m-%dT00:00:00Z")
                .to_string();
            let url = format!("{}/bill/{}", self.base, self.congress);
            let mut offset = 0u64;
            let mut yielded = 0usize;

            loop {
                let params = [
                    ("offset", offset.to_string()),
                    ("limit", PAGE_LIMIT.to_string()),
                    ("fromDateTime", from_date.clone()),
                    ("sort", "updateDate+desc".to_string()),
                ];
                let value = match self.get_json(&url, &params).await {
                    Some(value) => value,
                    None => break,
                };

                let bills = value
                    .get("bills")
                    .and_then(|b| b.as_array())
                    .cloned()
                    .unwrap_or_default();
                if bills.is_empty() {
                    break;
                }
                for bill in &bills {
                    if let Some(stub) = parse_stub(bill) {
                        yielded += 1;
                        yield stub;
                    }
                }

                let count = value
                    .get("pagination")
                    .and_then(|p| p.get("count"))
                    .and_then(|c| c.as_u64())
                    .unwrap_or(0);
                if offset + PAGE_LIMIT >= count {
                    break;
                }
                offset += PAGE_LIMIT;
                tokio::time::sleep(self.page_delay).await;
            }

            info!(bills = yielded, "Fetched bills with recent activity");
        }
    }

    /// Fetch a bill's detail record plus its committee, title, and summary
    /// enrichment. Missing pieces default rather than failing the bill.
    pub async fn full_bill(&self, bill_type: BillType, number: u32) -> Option<Bill> {
        let url = format!(
            "{}/bill/{}/{}/{}",
            self.base,
            self.congress,
            bill_type.code(),
            number
        );
        let value = self.get_json(&url, &[]).await?;
        let detail = value.get("bill")?;

        let title = detail
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or("Unknown")
            .to_string();
        let sponsor = detail
            .get("sponsors")
            .and_then(|s| s.as_array())
            .and_then(|a| a.first())
            .map(parse_sponsor);
        let latest_action = detail.get("latestAction").and_then(parse_action);

        Some(Bill {
            bill_type,
            number,
            title,
            short_title: self.short_title(bill_type, number).await,
            sponsor,
            committees: self.committees(bill_type, number).await,
            latest_action,
            official_summary: self.official_summary(bill_type, number).await,
        })
    }

    /// Full action history, most recent first
    pub async fn actions(&self, bill_type: BillType, number: u32) -> Vec<BillAction> {
        let url = format!(
            "{}/bill/{}/{}/{}/actions",
            self.base,
            self.congress,
            bill_type.code(),
            number
        );
        let value = match self.get_json(&url, &[("limit", "50".to_string())]).await {
            Some(value) => value,
            None => return Vec::new(),
        };
        value
            .get("actions")
            .cloned()
            .and_then(|actions| serde_json::from_value(actions).ok())
            .unwrap_or_default()
    }

    /// Ordered, deduplicated committee names
    pub async fn committees(&self, bill_type: BillType, number: u32) -> Vec<String> {
        let url = format!(
            "{}/bill/{}/{}/{}/committees",
            self.base,
            self.congress,
            bill_type.code(),
            number
        );
        let value = match self.get_json(&url, &[]).await {
            Some(value) => value,
            None => return Vec::new(),
        };
        let mut names = Vec::new();
        if let Some(committees) = value.get("committees").and_then(|c| c.as_array()) {
            for committee in committees {
                if let Some(name) = committee.get("name").and_then(|n| n.as_str()) {
                    let name = name.to_string();
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }

    /// Short title, when the title list carries one
    pub async fn short_title(&self, bill_type: BillType, number: u32) -> Option<String> {
        let url = format!(
            "{}/bill/{}/{}/{}/titles",
            self.base,
            self.congress,
            bill_type.code(),
            number
        );
        let value = self.get_json(&url, &[]).await?;
        let titles = value.get("titles")?.as_array()?;
        titles.iter().find_map(|title| {
            let title_type = title.get("titleType").and_then(|t| t.as_str())?;
            if title_type.to_lowercase().contains("short title") {
                title.get("title").and_then(|t| t.as_str()).map(String::from)
            } else {
                None
            }
        })
    }

    /// Most recent official summary text, with markup stripped
    pub async fn official_summary(&self, bill_type: BillType, number: u32) -> Option<String> {
        let url = format!(
            "{}/bill/{}/{}/{}/summaries",
            self.base,
            self.congress,
            bill_type.code(),
            number
        );
        let value = self.get_json(&url, &[]).await?;
        let summaries = value.get("summaries")?.as_array()?;
        let text = summaries.last()?.get("text")?.as_str()?;
        let stripped = strip_markup(text);
        if stripped.is_empty() {
            None
        } else {
            Some(stripped)
        }
    }

    /// Yea/nay totals for a roll-call vote
    pub async fn roll_call_totals(&self, chamber: &str, roll_number: u32) -> Option<VoteTotals> {
        let url = format!(
            "{}/roll-call-vote/{}/{}/{}",
            self.base,
            self.congress,
            chamber.to_lowercase(),
            roll_number
        );
        let value = self.get_json(&url, &[]).await?;
        let vote = value.get("rollCallVote")?;
        let yea = vote.get("yea")?.get("total")?.as_u64()? as u32;
        let nay = vote.get("nay")?.get("total")?.as_u64()? as u32;
        if yea == 0 && nay == 0 {
            return None;
        }
        Some(VoteTotals { yea, nay })
    }

    /// Resolve structured vote totals for an action, if it carries a
    /// recorded-vote pointer the API can answer for
    pub async fn resolve_vote(&self, action: &BillAction) -> Option<VoteTotals> {
        for vote in &action.recorded_votes {
            if let Some(roll_number) = vote.roll_number {
                if let Some(totals) = self.roll_call_totals(&vote.chamber, roll_number).await {
                    return Some(totals);
                }
            }
        }
        None
    }

    /// Connectivity probe: how many bills does the API report?
    pub async fn check(&self) -> Option<u64> {
        let url = format!("{}/bill/{}", self.base, self.congress);
        let value = self.get_json(&url, &[("limit", "1".to_string())]).await?;
        value
            .get("pagination")
            .and_then(|p| p.get("count"))
            .and_then(|c| c.as_u64())
    }
}

fn parse_stub(bill: &Value) -> Option<BillStub> {
    let bill_type = bill
        .get("type")
        .and_then(|t| t.as_str())
        .and_then(BillType::parse)?;
    let number = match bill.get("number") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as u32),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }?;
    Some(BillStub {
        bill_type,
        number,
        latest_action: bill.get("latestAction").and_then(parse_action).map(|action| {
            (action.date, action.text)
        }),
    })
}

fn parse_action(value: &Value) -> Option<BillAction> {
    let text = value.get("text").and_then(|t| t.as_str())?.to_string();
    let date = value
        .get("actionDate")
        .and_then(|d| d.as_str())
        .unwrap_or("")
        .to_string();
    Some(BillAction {
        date,
        text,
        recorded_votes: value
            .get("recordedVotes")
            .cloned()
            .and_then(|votes| serde_json::from_value(votes).ok())
            .unwrap_or_default(),
    })
}

fn parse_sponsor(value: &Value) -> Sponsor {
    let get = |key: &str| value.get(key).and_then(|v| v.as_str()).map(String::from);
    Sponsor {
        name: get("fullName")
            .or_else(|| get("lastName"))
            .unwrap_or_else(|| "Unknown".to_string()),
        party: get("party"),
        state: get("state"),
        chamber: get("chamber"),
    }
}

/// Drop HTML-ish tags from summary text
fn strip_markup(text: &str) -> String {
    match Regex::new(r"<[^>]*>") {
        Ok(regex) => regex.replace_all(text, "").trim().to_string(),
        Err(_) => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base: &str) -> Config {
        ConfigBuilder::new("/tmp/billtracker-test")
            .api_base(base)
            .api_key("test-key")
            .page_delay_ms(0)
            .build()
            .unwrap()
    }

    #[test]
    fn stub_parses_string_and_numeric_numbers() {
        let from_string = parse_stub(&json!({"type": "HR", "number": "471"})).unwrap();
        assert_eq!(from_string.id(), "hr471");

        let from_number = parse_stub(&json!({"type": "s", "number": 12})).unwrap();
        assert_eq!(from_number.id(), "s12");

        assert!(parse_stub(&json!({"type": "amendment", "number": 1})).is_none());
        assert!(parse_stub(&json!({"type": "hr"})).is_none());
    }

    #[test]
    fn markup_is_stripped_from_summaries() {
        assert_eq!(
            strip_markup("<p>This bill does a thing.</p> "),
            "This bill does a thing."
        );
    }

    #[tokio::test]
    async fn recent_bills_walks_pagination() {
        let server = MockServer::start().await;

        let bill = |number: u32| {
            json!({
                "type": "HR",
                "number": number,
                "latestAction": {"actionDate": "2025-03-01", "text": "Passed House"}
            })
        };
        Mock::given(path("/bill/119"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bills": [bill(1), bill(2)],
                "pagination": {"count": 3}
            })))
            .mount(&server)
            .await;
        Mock::given(path("/bill/119"))
            .and(query_param("offset", "250"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bills": [bill(3)],
                "pagination": {"count": 3}
            })))
            .mount(&server)
            .await;

        let client = CongressClient::new(&test_config(&server.uri()));
        let stubs: Vec<BillStub> = client.recent_bills(1).collect().await;
        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[2].id(), "hr3");
        assert_eq!(
            stubs[0].latest_action,
            Some(("2025-03-01".to_string(), "Passed House".to_string()))
        );
    }

    #[tokio::test]
    async fn failed_fetch_is_empty_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(path("/bill/119"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CongressClient::new(&test_config(&server.uri()));
        let stubs: Vec<BillStub> = client.recent_bills(1).collect().await;
        assert!(stubs.is_empty());
        assert!(client.full_bill(BillType::Hr, 471).await.is_none());
        assert!(client.actions(BillType::Hr, 471).await.is_empty());
        assert!(client.committees(BillType::Hr, 471).await.is_empty());
    }

    #[tokio::test]
    async fn full_bill_collects_enrichment() {
        let server = MockServer::start().await;
        Mock::given(path("/bill/119/hr/471"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bill": {
                    "title": "Example Act",
                    "sponsors": [{"fullName": "Jane Doe", "party": "D", "state": "IL", "chamber": "House"}],
                    "latestAction": {"actionDate": "2025-03-01", "text": "Passed House"}
                }
            })))
            .mount(&server)
            .await;
        Mock::given(path("/bill/119/hr/471/committees"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "committees": [
                    {"name": "Committee on Ways and Means"},
                    {"name": "Committee on Ways and Means"},
                    {"name": "Committee on Rules"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(path("/bill/119/hr/471/titles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "titles": [
                    {"titleType": "Official Title as Introduced", "title": "An Act to do a thing"},
                    {"titleType": "Short Title as Passed House", "title": "Example Act"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(path("/bill/119/hr/471/summaries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summaries": [{"text": "<p>This bill requires a thing.</p>"}]
            })))
            .mount(&server)
            .await;

        let client = CongressClient::new(&test_config(&server.uri()));
        let bill = client.full_bill(BillType::Hr, 471).await.unwrap();
        assert_eq!(bill.title, "Example Act");
        assert_eq!(bill.committees.len(), 2);
        assert_eq!(bill.short_title.as_deref(), Some("Example Act"));
        assert_eq!(bill.official_summary.as_deref(), Some("This bill requires a thing."));
        assert_eq!(bill.sponsor.unwrap().display(), "Rep. Jane Doe [D-IL]");
    }

    #[tokio::test]
    async fn roll_call_totals_resolve() {
        let server = MockServer::start().await;
        Mock::given(path("/roll-call-vote/119/house/91"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rollCallVote": {"yea": {"total": 279}, "nay": {"total": 141}}
            })))
            .mount(&server)
            .await;

        let client = CongressClient::new(&test_config(&server.uri()));
        let totals = client.roll_call_totals("House", 91).await;
        assert_eq!(totals, Some(VoteTotals { yea: 279, nay: 141 }));
    }
}
