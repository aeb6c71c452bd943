pub mod webhook;

use crate::domain::post::post_url;
use crate::time::LocalTime;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

pub use webhook::WebhookNotifier;

const ALERT_MARKER: &str = "🚨 New post alert!";

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Announces a post. Delivery failures are logged, never returned.
    async fn notify(&self, shortcode: &str, taken_at: Option<DateTime<FixedOffset>>);
}

/// Who to ping in the alert.
#[derive(Debug, Clone)]
pub struct Mention {
    pub role_id: Option<String>,
    pub fallback: String,
}

impl Mention {
    fn render(&self) -> String {
        match &self.role_id {
            Some(id) => format!("<@&{id}>"),
            None => self.fallback.clone(),
        }
    }
}

/// Everything needed to turn a short code into a chat message.
#[derive(Debug, Clone)]
pub struct MessageFormat {
    pub platform_base_url: String,
    pub mention: Mention,
    pub clock: LocalTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<AllowedMentions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowedMentions {
    pub roles: Vec<String>,
}

impl MessageFormat {
    pub fn build(&self, shortcode: &str, taken_at: Option<DateTime<FixedOffset>>) -> WebhookPayload {
        let content = format!(
            "{ALERT_MARKER}\n\n({})\n\n{}\n{}",
            self.clock.date_time_of(taken_at),
            self.mention.render(),
            post_url(&self.platform_base_url, shortcode),
        );

        WebhookPayload {
            content,
            allowed_mentions: self.mention.role_id.as_ref().map(|id| AllowedMentions {
                roles: vec![id.clone()],
            }),
        }
    }
}

/// Guards against malformed candidates reaching delivery.
pub fn is_deliverable(shortcode: &str) -> bool {
    let s = shortcode.trim();
    !s.is_empty() && !s.eq_ignore_ascii_case("none")
}

/// Logs the message instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    format: MessageFormat,
}

impl LogNotifier {
    pub fn new(format: MessageFormat) -> Self {
        Self { format }
    }
}

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, shortcode: &str, taken_at: Option<DateTime<FixedOffset>>) {
        if !is_deliverable(shortcode) {
            tracing::warn!(shortcode, "empty shortcode; nothing to send");
            return;
        }
        let payload = self.format.build(shortcode, taken_at);
        tracing::info!(dry_run = true, content = %payload.content, "would send webhook");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(role_id: Option<&str>) -> MessageFormat {
        MessageFormat {
            platform_base_url: "https://www.instagram.com".to_string(),
            mention: Mention {
                role_id: role_id.map(str::to_string),
                fallback: "@Mural".to_string(),
            },
            clock: LocalTime::default(),
        }
    }

    fn ts() -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339("2025-03-02T15:04:00Z").ok()
    }

    #[test]
    fn message_with_role_mentions_it_explicitly() {
        let payload = format(Some("123")).build("ABC", ts());
        assert_eq!(
            payload.content,
            "🚨 New post alert!\n\n(02/03/2025 12:04)\n\n<@&123>\nhttps://www.instagram.com/p/ABC/"
        );
        assert_eq!(
            payload.allowed_mentions,
            Some(AllowedMentions {
                roles: vec!["123".to_string()]
            })
        );

        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["allowed_mentions"]["roles"][0], "123");
    }

    #[test]
    fn message_without_role_uses_plain_tag() {
        let payload = format(None).build("ABC", ts());
        assert!(payload.content.contains("\n@Mural\n"));
        assert_eq!(payload.allowed_mentions, None);

        let v = serde_json::to_value(&payload).unwrap();
        assert!(v.get("allowed_mentions").is_none());
    }

    #[test]
    fn undated_posts_still_render_a_date() {
        let payload = format(None).build("ABC", None);
        let line = payload.content.lines().nth(2).unwrap();
        assert!(line.starts_with('(') && line.ends_with(')'));
        assert_eq!(line.len(), "(dd/mm/yyyy hh:mm)".len());
    }

    #[test]
    fn rejects_empty_and_none_shortcodes() {
        assert!(!is_deliverable(""));
        assert!(!is_deliverable("  "));
        assert!(!is_deliverable("None"));
        assert!(!is_deliverable("none"));
        assert!(is_deliverable("ABC"));
    }
}
