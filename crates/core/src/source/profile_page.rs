use crate::config::Settings;
use crate::domain::post::{extract_shortcode, profile_url};
use crate::domain::Candidate;
use crate::source::{html, PostSource};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE, USER_AGENT};
use std::time::Duration;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";
const ACCEPT_LANGUAGE_VALUE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// Reads the profile grid from server-rendered HTML and opens each post for its timestamp.
#[derive(Debug, Clone)]
pub struct ProfilePageSource {
    http: reqwest::Client,
    profile_url: String,
    max_candidates: usize,
}

impl ProfilePageSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if !settings.headless {
            tracing::warn!("HEADLESS=false has no effect: the profile page source does not render pages");
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DESKTOP_USER_AGENT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );
        if let Some(session_id) = &settings.session_id {
            let mut cookie = HeaderValue::from_str(&format!("sessionid={session_id}"))
                .context("IG_SESSIONID is not a valid cookie value")?;
            cookie.set_sensitive(true);
            headers.insert(COOKIE, cookie);
            tracing::info!("session cookie attached to page requests");
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .build()
            .context("failed to build page source http client")?;

        anyhow::ensure!(
            settings.max_candidate_posts >= 1,
            "MAX_CANDIDATE_POSTS must be >= 1"
        );

        Ok(Self {
            http,
            profile_url: profile_url(&settings.platform_base_url, &settings.account),
            max_candidates: settings.max_candidate_posts,
        })
    }

    async fn fetch_post(&self, url: &str) -> Option<(String, Option<DateTime<FixedOffset>>)> {
        let shortcode = extract_shortcode(url)?;
        let taken_at = match self.get_text(url).await {
            Ok((_, body)) => html::find_post_timestamp(&body),
            Err(e) => {
                tracing::debug!(%url, error = %e, "post page fetch failed");
                None
            }
        };
        Some((shortcode, taken_at))
    }

    async fn get_text(&self, url: &str) -> Result<(String, String)> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        let status = res.status();
        let final_url = res.url().to_string();
        anyhow::ensure!(status.is_success(), "GET {url}: HTTP {status}");
        let body = res
            .text()
            .await
            .with_context(|| format!("failed to read body of {url}"))?;
        Ok((final_url, body))
    }
}

#[async_trait::async_trait]
impl PostSource for ProfilePageSource {
    fn source_name(&self) -> &'static str {
        "profile_page"
    }

    async fn latest(&self) -> Result<Candidate> {
        tracing::debug!(url = %self.profile_url, "opening profile");
        let (final_url, body) = self.get_text(&self.profile_url).await?;

        if html::is_login_wall(&final_url, &body) {
            tracing::warn!(%final_url, "profile is behind a login wall; set IG_SESSIONID");
            return Ok(Candidate::none());
        }

        let links = html::collect_post_links(&body, &final_url);
        tracing::debug!(links = links.len(), "post links captured from grid");
        if links.is_empty() {
            tracing::warn!("no /p/ or /reel/ links found on profile");
            return Ok(Candidate::none());
        }

        let mut dated = Vec::with_capacity(self.max_candidates);
        for url in links.iter().take(self.max_candidates) {
            if let Some(entry) = self.fetch_post(url).await {
                dated.push(entry);
            }
        }

        let (shortcode, taken_at) = html::pick_latest(&dated, &links);
        if taken_at.is_none() {
            tracing::warn!("no post timestamps found; falling back to first grid link");
        }

        Ok(Candidate {
            shortcode,
            taken_at,
        })
    }
}
