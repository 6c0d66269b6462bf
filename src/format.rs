//! Rendering of bill-action and meeting posts.
//!
//! The compact variant enforces the 280-character platform ceiling: the
//! link placeholder and structural characters are budgeted first, the
//! remainder goes to the summary, and the summary is truncated (or dropped
//! entirely when it would fall below a minimum usable length) until the
//! whole post fits. The extended variant targets long-form platforms and
//! skips the truncation loop.

use crate::config::PostStyle;
use crate::detect::MeetingChange;
use crate::types::Meeting;

/// Hard ceiling for compact posts
pub const COMPACT_CEILING: usize = 280;
/// The platform shortens every link to a fixed width
pub const LINK_PLACEHOLDER_LEN: usize = 23;
/// A summary shorter than this is dropped rather than truncated further
pub const MIN_SUMMARY_CHARS: usize = 40;

/// Everything needed to render one bill-action post
#[derive(Debug, Clone)]
pub struct BillPostInput {
    pub display_id: String,
    pub emoji: String,
    pub label: String,
    pub sponsor: Option<String>,
    pub committees: Vec<String>,
    pub whats_next: Option<String>,
    pub summary: Option<String>,
    pub url: String,
}

pub fn render_bill_post(input: &BillPostInput, style: PostStyle) -> String {
    match style {
        PostStyle::Compact => render_compact(input),
        PostStyle::Extended => render_extended(input),
    }
}

/// Post length as the platform counts it: the link collapses to a
/// fixed-width placeholder regardless of its real length.
pub fn effective_len(text: &str, url: &str) -> usize {
    text.chars().count() - url.chars().count() + LINK_PLACEHOLDER_LEN
}

fn assemble(header: &str, summary: Option<&str>, next: Option<&str>, url: &str) -> String {
    let mut lines = vec![header.to_string()];
    if let Some(summary) = summary {
        lines.push(summary.to_string());
    }
    if let Some(next) = next {
        lines.push(next.to_string());
    }
    lines.push(url.to_string());
    lines.join("\n")
}

fn render_compact(input: &BillPostInput) -> String {
    let header = format!("{} {}: {}", input.emoji, input.display_id, input.label);
    let next_line = input.whats_next.as_ref().map(|n| format!("➡️ Next: {}", n));

    // Allot whatever the fixed parts leave over to the summary
    let overhead = effective_len(
        &assemble(&header, None, next_line.as_deref(), &input.url),
        &input.url,
    );
    // The floor only applies when truncation is forced: a short summary
    // that fits whole is kept even under a tight budget
    let mut summary = match (&input.summary, COMPACT_CEILING.checked_sub(overhead + 1)) {
        (Some(text), Some(available))
            if text.chars().count() <= available || available >= MIN_SUMMARY_CHARS =>
        {
            Some(truncate_chars(text, available))
        }
        _ => None,
    };

    // Iterate until the whole post fits; drop the summary before ever
    // emitting a fragment below the minimum.
    loop {
        let text = assemble(&header, summary.as_deref(), next_line.as_deref(), &input.url);
        let length = effective_len(&text, &input.url);
        if length <= COMPACT_CEILING {
            return text;
        }
        match summary.take() {
            Some(current) => {
                let overage = length - COMPACT_CEILING;
                let target = current.chars().count().saturating_sub(overage);
                if target >= MIN_SUMMARY_CHARS {
                    summary = Some(truncate_chars(&current, target));
                }
            }
            None => {
                // Degenerate inputs: keep the ceiling no matter what
                let budget = COMPACT_CEILING - LINK_PLACEHOLDER_LEN - 1;
                let body = truncate_chars(&header, budget);
                return format!("{}\n{}", body, input.url);
            }
        }
    }
}

fn render_extended(input: &BillPostInput) -> String {
    let mut sections = vec![format!("{} {}: {}", input.emoji, input.display_id, input.label)];

    if let Some(summary) = &input.summary {
        sections.push(summary.clone());
    }

    let mut details = Vec::new();
    if let Some(sponsor) = &input.sponsor {
        details.push(format!("Sponsor: {}", sponsor));
    }
    if !input.committees.is_empty() {
        details.push(format!("Committee: {}", input.committees.join(", ")));
    }
    if let Some(next) = &input.whats_next {
        details.push(format!("➡️ Next: {}", next));
    }
    if !details.is_empty() {
        sections.push(details.join("\n"));
    }

    sections.push(input.url.clone());
    sections.join("\n\n")
}

/// Render a post for a meeting change. Meeting posts are short by
/// construction; only the title is bounded.
pub fn render_meeting_post(meeting: &Meeting, change: &MeetingChange) -> Option<String> {
    let title = truncate_chars(&meeting.title, 120);
    let post = match change {
        MeetingChange::New => format!(
            "🗓️ New {} committee meeting: {}\n{}\n📅 {}",
            meeting.chamber.as_str(),
            meeting.committee,
            title,
            meeting.date
        ),
        MeetingChange::Rescheduled { previous_date } => format!(
            "🔁 Rescheduled: {} ({})\n{}\n📅 {} → {}",
            meeting.committee,
            meeting.chamber.as_str(),
            title,
            previous_date,
            meeting.date
        ),
        MeetingChange::Canceled { previous_date } => format!(
            "❌ Canceled: {} ({})\n{}\nWas scheduled for {}",
            meeting.committee,
            meeting.chamber.as_str(),
            title,
            previous_date
        ),
        MeetingChange::Unchanged => return None,
    };
    Some(post)
}

/// Truncate to at most `max_chars` characters, ellipsis included
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
