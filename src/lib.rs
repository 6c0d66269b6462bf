//! A legislative activity tracker that posts bill and committee-meeting
//! updates to a social platform.
//!
//! Each run polls the legislative data API for recent bill activity,
//! classifies free-text actions against an ordered rule table, diffs the
//! results against persisted JSON tracking documents, and renders
//! bounded-length posts for the significant changes. Two committee
//! calendar sources feed the same pipeline for meeting announcements.

pub mod calendar;
pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod fetch;
pub mod format;
pub mod progress;
pub mod publish;
pub mod run;
pub mod store;
pub mod summary;
pub mod types;

pub use config::{Config, ConfigBuilder, FileConfig, PostStyle};
pub use error::{Error, Result};
pub use run::{RunReport, Tracker};
pub use types::{Bill, BillAction, BillType, Chamber, Meeting, MeetingStatus};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::classify::{classify, extract_vote, is_significant, Classification, Priority};
    pub use crate::config::{Config, ConfigBuilder, PostStyle};
    pub use crate::error::{Error, Result};
    pub use crate::publish::{DryRunPublisher, HttpPublisher, Publisher};
    pub use crate::run::{RunReport, Tracker};
    pub use crate::types::{Bill, BillAction, BillType, Chamber, Meeting, MeetingStatus};
    pub use futures::StreamExt;
}
