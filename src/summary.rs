//! Plain-language bill summaries.
//!
//! Summaries come from a chat-completions style generation API when one
//! is configured, and from a deterministic template otherwise. Results
//! are cached per bill so a bill is summarized at most once, with a
//! separate cache entry once it becomes law (the tense changes).

use crate::config::Config;
use crate::store::SummaryStore;
use crate::types::Bill;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Ceiling passed to the generation API; the formatter still enforces
/// the real post budget afterwards
const SUMMARY_CHAR_LIMIT: usize = 160;

pub struct SummaryClient {
    http: reqwest::Client,
    url: String,
    key: String,
    model: String,
}

impl SummaryClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            url: config.generation_url.clone(),
            key: config.generation_key.clone(),
            model: config.generation_model.clone(),
        }
    }

    /// Whether an action text describes a bill that has become law
    pub fn is_enacted(action_text: &str) -> bool {
        let lower = action_text.to_lowercase();
        lower.contains("became public law")
            || lower.contains("signed by president")
            || lower.contains("became law")
    }

    /// Cache key: bills get a fresh summary once enacted
    pub fn cache_key(bill_id: &str, enacted: bool) -> String {
        if enacted {
            format!("{bill_id}:signed")
        } else {
            bill_id.to_string()
        }
    }

    /// Summarize through the cache: hit returns the stored text, miss
    /// generates and stores
    pub async fn summarize_cached(
        &self,
        cache: &mut SummaryStore,
        bill: &Bill,
        enacted: bool,
    ) -> String {
        let key = Self::cache_key(&bill.id(), enacted);
        if let Some(cached) = cache.get(&key) {
            debug!(bill = %bill.id(), "Summary cache hit");
            return cached.clone();
        }
        let summary = self.generate(bill, enacted).await;
        cache.insert(&key, summary.clone());
        summary
    }

    /// Generate a one-sentence summary, falling back to the template on
    /// any transport or parse failure
    pub async fn generate(&self, bill: &Bill, enacted: bool) -> String {
        if self.key.is_empty() {
            return fallback_summary(bill, enacted);
        }
        match self.request_summary(bill, enacted).await {
            Some(summary) if !summary.is_empty() => summary,
            _ => {
                warn!(bill = %bill.id(), "Summary generation failed, using template");
                fallback_summary(bill, enacted)
            }
        }
    }

    async fn request_summary(&self, bill: &Bill, enacted: bool) -> Option<String> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": build_prompt(bill, enacted)}],
            "max_tokens": 120,
            "temperature": 0.3,
        });
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.key)
            .json(&body)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "Generation API returned error status");
            return None;
        }
        let value: Value = response.json().await.ok()?;
        let content = value
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()?;
        Some(content.trim().trim_matches('"').to_string())
    }

    /// Connectivity probe for the generation API
    pub async fn check(&self) -> crate::error::Result<()> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": "ping"}],
            "max_tokens": 1,
        });
        self.http
            .post(&self.url)
            .bearer_auth(&self.key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// The display name a summary sentence opens with
fn summary_name(bill: &Bill) -> &str {
    bill.short_title.as_deref().unwrap_or(&bill.title)
}

fn build_prompt(bill: &Bill, enacted: bool) -> String {
    let name = summary_name(bill);
    let tense = if enacted {
        "present tense, since it is now law (\"the law does X\")"
    } else {
        "conditional mood, since it is not yet law (\"the bill would do X\")"
    };
    let mut prompt = format!(
        "Summarize this bill for a general audience in one sentence of at most \
         {SUMMARY_CHAR_LIMIT} characters. Begin with \"The {name}\". Use {tense}. \
         No hashtags, no links. Title: {title}.",
        title = bill.title,
    );
    if let Some(official) = &bill.official_summary {
        prompt.push_str(" Official summary: ");
        prompt.push_str(official);
    }
    prompt
}

/// Deterministic summary used when generation is unavailable
pub fn fallback_summary(bill: &Bill, enacted: bool) -> String {
    let name = summary_name(bill);
    if enacted {
        format!("The {name} has been signed into law.")
    } else {
        format!("The {name} is moving through Congress.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::store::JsonStore;
    use crate::types::BillType;

    fn bill(short_title: Option<&str>) -> Bill {
        Bill {
            bill_type: BillType::Hr,
            number: 471,
            title: "To protect law enforcement animals, and for other purposes".to_string(),
            short_title: short_title.map(String::from),
            sponsor: None,
            committees: vec![],
            latest_action: None,
            official_summary: None,
        }
    }

    #[test]
    fn enacted_detection() {
        assert!(SummaryClient::is_enacted("Became Public Law No: 119-4."));
        assert!(SummaryClient::is_enacted("Signed by President."));
        assert!(!SummaryClient::is_enacted("Passed House."));
    }

    #[test]
    fn cache_key_splits_on_enactment() {
        assert_eq!(SummaryClient::cache_key("hr471", false), "hr471");
        assert_eq!(SummaryClient::cache_key("hr471", true), "hr471:signed");
    }

    #[test]
    fn prompt_prefers_short_title_and_tense() {
        let prompt = build_prompt(&bill(Some("Lulu Act")), false);
        assert!(prompt.contains("Begin with \"The Lulu Act\""));
        assert!(prompt.contains("conditional mood"));

        let signed = build_prompt(&bill(None), true);
        assert!(signed.contains("present tense"));
        assert!(signed.contains("Begin with \"The To protect law enforcement animals"));
    }

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(
            fallback_summary(&bill(Some("Lulu Act")), false),
            "The Lulu Act is moving through Congress."
        );
        assert_eq!(
            fallback_summary(&bill(Some("Lulu Act")), true),
            "The Lulu Act has been signed into law."
        );
    }

    #[test]
    fn cache_hit_skips_generation() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache: SummaryStore = JsonStore::open(dir.path().join("summaries.json")).unwrap();
        cache.insert("hr471", "The Lulu Act would do a thing.".to_string());

        // No key configured, so a miss would produce the template text
        let config = ConfigBuilder::new(dir.path()).build().unwrap();
        let client = SummaryClient::new(&config);

        tokio_test::block_on(async {
            let summary = client
                .summarize_cached(&mut cache, &bill(Some("Lulu Act")), false)
                .await;
            assert_eq!(summary, "The Lulu Act would do a thing.");

            let mut other = bill(Some("Other Act"));
            other.number = 999;
            let miss = client.summarize_cached(&mut cache, &other, false).await;
            assert_eq!(miss, "The Other Act is moving through Congress.");
            assert!(cache.contains_key("hr999"));
        });
    }
}
