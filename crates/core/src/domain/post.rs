use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::sync::LazyLock;

static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(p|reel)/([A-Za-z0-9_-]+)/").expect("shortcode regex must compile")
});

/// The most recent post seen in one scan of the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub shortcode: Option<String>,
    pub taken_at: Option<DateTime<FixedOffset>>,
}

impl Candidate {
    pub fn new(shortcode: impl Into<String>, taken_at: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            shortcode: Some(shortcode.into()),
            taken_at,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

pub fn extract_shortcode(url: &str) -> Option<String> {
    SHORTCODE_RE
        .captures(url)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
}

pub fn post_url(base_url: &str, shortcode: &str) -> String {
    format!("{}/p/{shortcode}/", base_url.trim_end_matches('/'))
}

pub fn profile_url(base_url: &str, handle: &str) -> String {
    format!("{}/{handle}/", base_url.trim_end_matches('/'))
}

pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_string()
}
