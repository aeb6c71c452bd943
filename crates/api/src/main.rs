use anyhow::Context;
use axum::{routing::get, Json, Router};
use postwatch_core::monitor::{Monitor, MonitorConfig};
use postwatch_core::notify::WebhookNotifier;
use postwatch_core::source::ProfilePageSource;
use serde::Serialize;
use std::future::IntoFuture;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

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

    // Missing webhook is fatal before anything is served.
    let config = MonitorConfig::from_settings(&settings).inspect_err(|e| {
        sentry_anyhow::capture_anyhow(e);
    })?;
    let source = ProfilePageSource::from_settings(&settings)?;
    let notifier = WebhookNotifier::new(config.webhook_url.clone(), config.message.clone())?;

    let monitor = Monitor::new(config, source, notifier).await;
    let monitor_task = tokio::spawn(monitor.run(std::future::pending()));
    tracing::info!("background monitor task started");

    let app = router().layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    supervise(server, monitor_task).await.inspect_err(|e| {
        sentry_anyhow::capture_anyhow(e);
    })
}

/// Runs the server until it stops or the monitor task ends, whichever comes first.
/// A dead monitor fails the process so liveness checks stop reporting ok.
async fn supervise<F>(server: F, mut monitor: JoinHandle<()>) -> anyhow::Result<()>
where
    F: IntoFuture<Output = std::io::Result<()>>,
{
    tokio::select! {
        served = server.into_future() => {
            monitor.abort();
            served.context("api server failed")
        }
        joined = &mut monitor => {
            match joined {
                Ok(()) => tracing::error!("monitor task returned; stopping api"),
                Err(e) => {
                    let error = e.to_string();
                    tracing::error!(%error, panicked = e.is_panic(), "monitor task died; stopping api");
                }
            }
            Err(anyhow::anyhow!("monitor task stopped"))
        }
    }
}

fn router() -> Router {
    Router::new()
        .route("/", get(status))
        .route("/healthz", get(healthz))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct StatusBody {
    status: &'static str,
    msg: &'static str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthBody {
    ok: bool,
}

async fn status() -> Json<StatusBody> {
    Json(StatusBody {
        status: "ok",
        msg: "post monitor running",
    })
}

async fn healthz() -> Json<HealthBody> {
    Json(HealthBody { ok: true })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
