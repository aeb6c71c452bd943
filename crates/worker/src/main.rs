use clap::Parser;
use postwatch_core::monitor::{IterationOutcome, Monitor, MonitorConfig};
use postwatch_core::notify::{LogNotifier, Notifier, WebhookNotifier};
use postwatch_core::source::{PostSource, ProfilePageSource};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "postwatch_worker")]
struct Args {
    /// Run a single poll iteration and exit.
    #[arg(long)]
    once: bool,

    /// Log the webhook message instead of sending it.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = postwatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let config = MonitorConfig::from_settings(&settings).inspect_err(|e| {
        sentry_anyhow::capture_anyhow(e);
    })?;
    let source = ProfilePageSource::from_settings(&settings)?;

    tracing::info!(
        account = %config.account,
        interval_secs = config.check_interval_secs,
        once_per_day = config.policy.once_per_day,
        send_bootstrap = config.policy.send_bootstrap,
        dry_run = args.dry_run,
        "postwatch worker starting"
    );

    if args.dry_run {
        let notifier = LogNotifier::new(config.message.clone());
        run(config, source, notifier, args.once).await
    } else {
        let notifier = WebhookNotifier::new(config.webhook_url.clone(), config.message.clone())?;
        run(config, source, notifier, args.once).await
    }
}

async fn run<S, N>(config: MonitorConfig, source: S, notifier: N, once: bool) -> anyhow::Result<()>
where
    S: PostSource,
    N: Notifier,
{
    let mut monitor = Monitor::new(config, source, notifier).await;

    if once {
        return match monitor.run_iteration().await {
            IterationOutcome::Ok(action) => {
                tracing::info!(?action, "single poll finished");
                Ok(())
            }
            IterationOutcome::Failed(reason) => Err(anyhow::anyhow!("poll failed: {reason}")),
        };
    }

    monitor.run(shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("interrupt received; exiting");
}

fn init_sentry(settings: &postwatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
