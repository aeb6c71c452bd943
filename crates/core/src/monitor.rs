use crate::config::Settings;
use crate::detect::{self, Action, Policy};
use crate::domain::PersistedState;
use crate::notify::{Mention, MessageFormat, Notifier};
use crate::source::PostSource;
use crate::storage::StateStore;
use crate::time::LocalTime;
use rand::Rng;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

pub const MIN_DELAY_SECS: u64 = 20;
const JITTER_SECS: i64 = 5;

/// Everything the poll loop needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub webhook_url: String,
    pub account: String,
    pub check_interval_secs: u64,
    pub policy: Policy,
    pub state_dir: PathBuf,
    pub clock: LocalTime,
    pub message: MessageFormat,
}

impl MonitorConfig {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let webhook_url = settings.require_webhook_url()?.to_string();
        let clock = LocalTime::from_name(&settings.timezone);

        Ok(Self {
            webhook_url,
            account: settings.account.clone(),
            check_interval_secs: settings.check_interval_secs,
            policy: Policy {
                send_bootstrap: settings.send_bootstrap,
                once_per_day: settings.only_once_per_day,
            },
            state_dir: PathBuf::from(&settings.state_dir),
            clock,
            message: MessageFormat {
                platform_base_url: settings.platform_base_url.clone(),
                mention: Mention {
                    role_id: settings.mention_role_id.clone(),
                    fallback: settings.mention_fallback.clone(),
                },
                clock,
            },
        })
    }

    pub fn state_store(&self) -> StateStore {
        StateStore::for_account(&self.state_dir, &self.account)
    }
}

/// Result of one poll iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    Ok(Action),
    Failed(String),
}

pub struct Monitor<S, N> {
    config: MonitorConfig,
    source: S,
    notifier: N,
    store: StateStore,
    state: PersistedState,
}

impl<S: PostSource, N: Notifier> Monitor<S, N> {
    /// Loads persisted state; never fails on a missing or corrupt state file.
    pub async fn new(config: MonitorConfig, source: S, notifier: N) -> Self {
        let store = config.state_store();
        let state = store.load().await;
        tracing::info!(
            account = %config.account,
            state_file = %store.path().display(),
            bootstrapped = state.bootstrapped,
            last_shortcode = ?state.last_shortcode,
            "monitor state loaded"
        );

        Self {
            config,
            source,
            notifier,
            store,
            state,
        }
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub async fn run_iteration(&mut self) -> IterationOutcome {
        match self.try_iteration().await {
            Ok(action) => IterationOutcome::Ok(action),
            Err(e) => {
                let error = format!("{e:#}");
                tracing::error!(
                    account = %self.config.account,
                    source = self.source.source_name(),
                    %error,
                    "poll iteration failed"
                );
                IterationOutcome::Failed(error)
            }
        }
    }

    async fn try_iteration(&mut self) -> anyhow::Result<Action> {
        let candidate = self.source.latest().await?;
        let decision = detect::decide(
            &candidate,
            &self.state,
            self.config.policy,
            &self.config.clock,
        );

        let shortcode = candidate.shortcode.as_deref().unwrap_or_default();
        let taken_at = candidate.taken_at.map(|t| t.to_rfc3339());
        match decision.action {
            Action::NoCandidate => tracing::info!("no post found; will retry"),
            Action::Bootstrap { notify } => tracing::info!(
                %shortcode,
                taken_at = taken_at.as_deref().unwrap_or("undated"),
                notify,
                "bootstrap: latest existing post recorded"
            ),
            Action::NotifyNew => tracing::info!(%shortcode, ?taken_at, "new post detected"),
            Action::SuppressDaily => tracing::info!(
                %shortcode,
                date = ?decision.state.last_notified_date,
                "already notified for this date; skipping"
            ),
            Action::NoChange => tracing::info!(
                last_shortcode = ?self.state.last_shortcode,
                last_dt_iso = ?self.state.last_dt_iso.map(|t| t.to_rfc3339()),
                "no update"
            ),
        }

        if decision.should_notify() {
            self.notifier.notify(shortcode, candidate.taken_at).await;
        }

        if decision.changed {
            self.state = decision.state;
            self.store.save(&self.state).await?;
        }

        Ok(decision.action)
    }

    pub fn next_delay(&self) -> Duration {
        jittered_delay(self.config.check_interval_secs, &mut rand::thread_rng())
    }

    /// Polls until `shutdown` resolves. A failed iteration only delays the next one; shutdown is
    /// observed while sleeping, never in the middle of an iteration.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            account = %self.config.account,
            interval_secs = self.config.check_interval_secs,
            "monitoring started"
        );

        loop {
            self.run_iteration().await;

            let delay = self.next_delay();
            tracing::debug!(delay_secs = delay.as_secs(), "sleeping until next poll");
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!(account = %self.config.account, "monitoring stopped");
    }
}

/// `base ± 5s`, never below [`MIN_DELAY_SECS`].
pub fn jittered_delay<R: Rng + ?Sized>(base_secs: u64, rng: &mut R) -> Duration {
    let jitter = rng.gen_range(-JITTER_SECS..=JITTER_SECS);
    let secs = i64::try_from(base_secs)
        .unwrap_or(i64::MAX)
        .saturating_add(jitter)
        .max(MIN_DELAY_SECS as i64);
    Duration::from_secs(secs as u64)
}
