//! Post publication.
//!
//! [`Publisher`] is the seam between rendering and delivery. The live
//! implementation posts to an X-style v2 endpoint with a bearer token;
//! the dry-run implementation prints what would have been posted and
//! reports success.

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a post and return its platform id
    async fn publish(&self, text: &str) -> Result<String>;

    /// Probe credentials/connectivity, returning a short description of
    /// the authenticated identity
    async fn verify(&self) -> Result<String>;

    /// Whether publications actually leave the process
    fn is_live(&self) -> bool {
        true
    }
}

/// Publishes over HTTP with a bearer token
pub struct HttpPublisher {
    http: reqwest::Client,
    url: String,
    verify_url: String,
    token: String,
}

impl HttpPublisher {
    pub fn new(config: &Config) -> Self {
        let url = config.publish_url.clone();
        // The v2 layout puts the identity probe next to the post endpoint
        let verify_url = match url.strip_suffix("/tweets") {
            Some(base) => format!("{base}/users/me"),
            None => url.clone(),
        };
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            url,
            verify_url,
            token: config.publish_token.clone(),
        }
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, text: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&json!({ "text": text }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Publish(format!("Post rejected ({status}): {body}")));
        }
        let value: Value = response.json().await?;
        let id = value
            .get("data")
            .and_then(|d| d.get("id"))
            .and_then(|id| id.as_str())
            .ok_or_else(|| Error::Publish("Post response carried no id".to_string()))?;
        Ok(id.to_string())
    }

    async fn verify(&self) -> Result<String> {
        let response = self
            .http
            .get(&self.verify_url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        let value: Value = response.json().await?;
        let username = value
            .get("data")
            .and_then(|d| d.get("username"))
            .and_then(|u| u.as_str())
            .unwrap_or("unknown");
        Ok(format!("@{username}"))
    }
}

/// Prints posts instead of sending them
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> Result<String> {
        info!(chars = text.chars().count(), "Dry run, not posting");
        println!("---- WOULD POST ({} chars) ----", text.chars().count());
        println!("{text}");
        println!("-------------------------------");
        Ok("dry-run".to_string())
    }

    async fn verify(&self) -> Result<String> {
        Ok("dry run".to_string())
    }

    fn is_live(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher_for(server: &MockServer) -> HttpPublisher {
        let config = ConfigBuilder::new("/tmp/billtracker-test")
            .publish_url(format!("{}/2/tweets", server.uri()))
            .publish_token("token-123")
            .build()
            .unwrap();
        HttpPublisher::new(&config)
    }

    #[tokio::test]
    async fn publish_returns_platform_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header("authorization", "Bearer token-123"))
            .and(body_partial_json(serde_json::json!({"text": "hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": {"id": "1900000000000000001", "text": "hello"}
            })))
            .mount(&server)
            .await;

        let publisher = publisher_for(&server);
        let id = publisher.publish("hello").await.unwrap();
        assert_eq!(id, "1900000000000000001");
        assert!(publisher.is_live());
    }

    #[tokio::test]
    async fn rejected_post_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(403).set_body_string("duplicate"))
            .mount(&server)
            .await;

        let publisher = publisher_for(&server);
        let err = publisher.publish("hello").await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn verify_reports_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"id": "1", "username": "billtracker"}
            })))
            .mount(&server)
            .await;

        let publisher = publisher_for(&server);
        assert_eq!(publisher.verify().await.unwrap(), "@billtracker");
    }

    #[tokio::test]
    async fn dry_run_always_succeeds() {
        let publisher = DryRunPublisher;
        assert_eq!(publisher.publish("anything").await.unwrap(), "dry-run");
        assert!(!publisher.is_live());
    }
}
