pub mod detect;
pub mod domain;
pub mod monitor;
pub mod notify;
pub mod source;
pub mod storage;
pub mod time;

#[cfg(test)]
mod test_support;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_ACCOUNT: &str = "mcdonalds_br";
    pub const DEFAULT_PLATFORM_BASE_URL: &str = "https://www.instagram.com";
    pub const DEFAULT_TIMEZONE: &str = "America/Recife";
    pub const DEFAULT_MENTION_FALLBACK: &str = "@Mural";
    const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
    const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 45;
    const DEFAULT_MAX_CANDIDATE_POSTS: usize = 12;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub webhook_url: Option<String>,
        pub account: String,
        pub check_interval_secs: u64,
        pub send_bootstrap: bool,
        pub session_id: Option<String>,
        pub headless: bool,
        pub only_once_per_day: bool,
        pub mention_role_id: Option<String>,
        pub mention_fallback: String,
        pub timezone: String,
        pub platform_base_url: String,
        pub state_dir: String,
        pub fetch_timeout_secs: u64,
        pub max_candidate_posts: usize,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let account = non_empty("INSTAGRAM_USER")
                .map(|s| crate::domain::post::normalize_handle(&s))
                .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string());

            Ok(Self {
                webhook_url: non_empty("DISCORD_WEBHOOK"),
                account,
                check_interval_secs: parse_or("CHECK_INTERVAL_SECONDS", DEFAULT_CHECK_INTERVAL_SECS)?,
                send_bootstrap: flag("SEND_BOOTSTRAP", false),
                session_id: non_empty("IG_SESSIONID"),
                headless: flag("HEADLESS", true),
                only_once_per_day: flag("ONLY_ONCE_PER_DAY", false),
                mention_role_id: non_empty("MURAL_ROLE_ID"),
                mention_fallback: non_empty("MENTION_FALLBACK")
                    .unwrap_or_else(|| DEFAULT_MENTION_FALLBACK.to_string()),
                timezone: non_empty("MONITOR_TIMEZONE")
                    .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
                platform_base_url: non_empty("PLATFORM_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_PLATFORM_BASE_URL.to_string()),
                state_dir: non_empty("STATE_DIR").unwrap_or_else(|| ".".to_string()),
                fetch_timeout_secs: parse_or("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
                max_candidate_posts: parse_or("MAX_CANDIDATE_POSTS", DEFAULT_MAX_CANDIDATE_POSTS)?,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_webhook_url(&self) -> anyhow::Result<&str> {
            self.webhook_url
                .as_deref()
                .context("DISCORD_WEBHOOK is required")
        }
    }

    fn non_empty(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn flag(key: &str, default: bool) -> bool {
        match non_empty(key) {
            Some(v) => parse_flag(&v),
            None => default,
        }
    }

    pub fn parse_flag(value: &str) -> bool {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "y"
        )
    }

    fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match non_empty(key) {
            Some(s) => s
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("failed to parse {key}='{s}': {e}")),
            None => Ok(default),
        }
    }

}
