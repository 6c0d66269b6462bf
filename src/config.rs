use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Rendering discipline for posts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStyle {
    /// Hard 280-character ceiling with the iterative truncation budget
    Compact,
    /// Long-form platform, no aggressive truncation
    Extended,
}

impl From<&str> for PostStyle {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "extended" => PostStyle::Extended,
            _ => PostStyle::Compact,
        }
    }
}

/// Configuration for one tracker run.
///
/// Everything a component needs is carried here explicitly; there is no
/// process-wide mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Congress number, e.g. 119
    pub congress: u32,
    pub api_base: String,
    pub api_key: String,
    /// Committee meeting XML feed
    pub calendar_feed_url: Option<String>,
    /// Weekly committee schedule page (HTML)
    pub weekly_schedule_url: Option<String>,
    pub publish_url: String,
    pub publish_token: String,
    pub generation_url: String,
    pub generation_key: String,
    pub generation_model: String,
    /// Directory holding the four tracking JSON files
    pub state_dir: PathBuf,
    /// Trailing activity window in days
    pub days_back: u32,
    pub max_bill_posts: usize,
    pub max_meeting_posts: usize,
    pub page_delay_ms: u64,
    pub post_delay_ms: u64,
    pub post_style: PostStyle,
}

impl Config {
    /// Create a new default configuration rooted at the given state directory
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            congress: 119,
            api_base: "https://api.congress.gov/v3".to_string(),
            api_key: String::new(),
            calendar_feed_url: None,
            weekly_schedule_url: None,
            publish_url: "https://api.x.com/2/tweets".to_string(),
            publish_token: String::new(),
            generation_url: "https://api.openai.com/v1/chat/completions".to_string(),
            generation_key: String::new(),
            generation_model: "gpt-4o-mini".to_string(),
            state_dir: state_dir.into(),
            days_back: 1,
            max_bill_posts: 10,
            max_meeting_posts: 6,
            page_delay_ms: 500,
            post_delay_ms: 2000,
            post_style: PostStyle::Compact,
        }
    }

    pub fn posted_path(&self) -> PathBuf {
        self.state_dir.join("posted_actions.json")
    }

    pub fn snapshots_path(&self) -> PathBuf {
        self.state_dir.join("bill_status.json")
    }

    pub fn summaries_path(&self) -> PathBuf {
        self.state_dir.join("summary_cache.json")
    }

    pub fn meetings_path(&self) -> PathBuf {
        self.state_dir.join("meeting_tracking.json")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.congress == 0 {
            return Err(Error::Config("Congress number must be non-zero".to_string()));
        }
        if self.days_back == 0 {
            return Err(Error::Config("days_back must be at least 1".to_string()));
        }
        if self.api_base.is_empty() {
            return Err(Error::Config("API base URL must not be empty".to_string()));
        }
        if self.state_dir.as_os_str().is_empty() {
            return Err(Error::Config("State directory must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(".billtracker")
    }
}

/// Optional fields accepted from a billtracker.yml config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub congress: Option<u32>,
    pub api_base: Option<String>,
    pub calendar_feed_url: Option<String>,
    pub weekly_schedule_url: Option<String>,
    pub publish_url: Option<String>,
    pub generation_url: Option<String>,
    pub generation_model: Option<String>,
    pub state_dir: Option<String>,
    pub days_back: Option<u32>,
    pub max_bill_posts: Option<usize>,
    pub max_meeting_posts: Option<usize>,
    pub post_style: Option<String>,
}

/// Builder for creating configurations
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default settings
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: Config::new(state_dir),
        }
    }

    /// Apply a parsed YAML config file
    pub fn file_config(mut self, file: FileConfig) -> Self {
        if let Some(congress) = file.congress {
            self.config.congress = congress;
        }
        if let Some(api_base) = file.api_base {
            self.config.api_base = api_base;
        }
        if file.calendar_feed_url.is_some() {
            self.config.calendar_feed_url = file.calendar_feed_url;
        }
        if file.weekly_schedule_url.is_some() {
            self.config.weekly_schedule_url = file.weekly_schedule_url;
        }
        if let Some(publish_url) = file.publish_url {
            self.config.publish_url = publish_url;
        }
        if let Some(generation_url) = file.generation_url {
            self.config.generation_url = generation_url;
        }
        if let Some(model) = file.generation_model {
            self.config.generation_model = model;
        }
        if let Some(state_dir) = file.state_dir {
            self.config.state_dir = PathBuf::from(state_dir);
        }
        if let Some(days_back) = file.days_back {
            self.config.days_back = days_back;
        }
        if let Some(max) = file.max_bill_posts {
            self.config.max_bill_posts = max;
        }
        if let Some(max) = file.max_meeting_posts {
            self.config.max_meeting_posts = max;
        }
        if let Some(style) = file.post_style {
            self.config.post_style = PostStyle::from(style.as_str());
        }
        self
    }

    /// Read credentials from the environment:
    /// CONGRESS_API_KEY, PUBLISH_TOKEN, GENERATION_API_KEY
    pub fn env_credentials(mut self) -> Self {
        if let Ok(key) = std::env::var("CONGRESS_API_KEY") {
            self.config.api_key = key;
        }
        if let Ok(token) = std::env::var("PUBLISH_TOKEN") {
            self.config.publish_token = token;
        }
        if let Ok(key) = std::env::var("GENERATION_API_KEY") {
            self.config.generation_key = key;
        }
        self
    }

    pub fn congress(mut self, congress: u32) -> Self {
        self.config.congress = congress;
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn calendar_feed_url(mut self, url: impl Into<String>) -> Self {
        self.config.calendar_feed_url = Some(url.into());
        self
    }

    pub fn weekly_schedule_url(mut self, url: impl Into<String>) -> Self {
        self.config.weekly_schedule_url = Some(url.into());
        self
    }

    pub fn publish_url(mut self, url: impl Into<String>) -> Self {
        self.config.publish_url = url.into();
        self
    }

    pub fn publish_token(mut self, token: impl Into<String>) -> Self {
        self.config.publish_token = token.into();
        self
    }

    pub fn generation_url(mut self, url: impl Into<String>) -> Self {
        self.config.generation_url = url.into();
        self
    }

    pub fn generation_key(mut self, key: impl Into<String>) -> Self {
        self.config.generation_key = key.into();
        self
    }

    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.state_dir = dir.into();
        self
    }

    pub fn days_back(mut self, days: u32) -> Self {
        self.config.days_back = days;
        self
    }

    pub fn max_bill_posts(mut self, max: usize) -> Self {
        self.config.max_bill_posts = max;
        self
    }

    pub fn max_meeting_posts(mut self, max: usize) -> Self {
        self.config.max_meeting_posts = max;
        self
    }

    pub fn page_delay_ms(mut self, delay: u64) -> Self {
        self.config.page_delay_ms = delay;
        self
    }

    pub fn post_delay_ms(mut self, delay: u64) -> Self {
        self.config.post_delay_ms = delay;
        self
    }

    pub fn post_style(mut self, style: PostStyle) -> Self {
        self.config.post_style = style;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Load and parse a billtracker.yml configuration file
pub fn load_file_config(config_path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(config_path)?;
    serde_yaml::from_str(&contents)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", config_path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_validate() {
        let config = ConfigBuilder::new("/tmp/state").build().unwrap();
        assert_eq!(config.congress, 119);
        assert_eq!(config.days_back, 1);
        assert_eq!(config.post_style, PostStyle::Compact);
        assert!(config.posted_path().ends_with("posted_actions.json"));
    }

    #[test]
    fn zero_days_back_rejected() {
        let result = ConfigBuilder::new("/tmp/state").days_back(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn file_config_overrides() {
        let file: FileConfig = serde_yaml::from_str(
            "congress: 118\nmax_bill_posts: 3\npost_style: extended\n",
        )
        .unwrap();
        let config = ConfigBuilder::new("/tmp/state").file_config(file).build().unwrap();
        assert_eq!(config.congress, 118);
        assert_eq!(config.max_bill_posts, 3);
        assert_eq!(config.post_style, PostStyle::Extended);
    }

    #[test]
    fn post_style_from_str() {
        assert_eq!(PostStyle::from("extended"), PostStyle::Extended);
        assert_eq!(PostStyle::from("compact"), PostStyle::Compact);
        assert_eq!(PostStyle::from("anything"), PostStyle::Compact);
    }
}
