use crate::notify::{is_deliverable, MessageFormat, Notifier, WebhookPayload};
use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Posts alerts to a Discord-compatible webhook. One attempt per post, no retries.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    webhook_url: String,
    format: MessageFormat,
}

impl WebhookNotifier {
    pub fn new(webhook_url: impl Into<String>, format: MessageFormat) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build webhook http client")?;

        Ok(Self {
            http,
            webhook_url: webhook_url.into(),
            format,
        })
    }

    async fn deliver(&self, payload: &WebhookPayload) -> anyhow::Result<()> {
        let res = self
            .http
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .context("webhook request failed")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("webhook HTTP {status}: {body}");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, shortcode: &str, taken_at: Option<DateTime<FixedOffset>>) {
        if !is_deliverable(shortcode) {
            tracing::warn!(shortcode, "empty shortcode; nothing to send");
            return;
        }

        let payload = self.format.build(shortcode, taken_at);
        match self.deliver(&payload).await {
            Ok(()) => tracing::info!(%shortcode, "webhook notification sent"),
            Err(e) => {
                let error = format!("{e:#}");
                tracing::error!(%shortcode, %error, "webhook notification failed");
            }
        }
    }
}
