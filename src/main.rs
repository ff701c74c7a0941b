//! channel-news-sync binary entrypoint.
//! Loads config and channels, connects the source, runs one sync and exits.

use channel_news_sync::diagnostics::append_emergency;
use channel_news_sync::ingest::config::load_channels_from;
use channel_news_sync::ingest::providers::client_from_env;
use channel_news_sync::media::transcoder::FfmpegTranscoder;
use channel_news_sync::{run_sync, SyncConfig};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `LOG_FORMAT=json` for machine-readable output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("channel_news_sync=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

/// SIGINT / SIGTERM only flip the token; the channel loop notices it between channels.
fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut term = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = ?e, "SIGTERM handler unavailable");
                    let _ = tokio::signal::ctrl_c().await;
                    cancel.cancel();
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        #[cfg(not(unix))]
        let _ = tokio::signal::ctrl_c().await;

        warn!("stop requested, finishing current channel and saving progress");
        cancel.cancel();
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match SyncConfig::load_default() {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let channels = match load_channels_from(&cfg.channels_path) {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "channel list unavailable");
            return ExitCode::FAILURE;
        }
    };

    let client = match client_from_env().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "could not establish source session");
            return ExitCode::FAILURE;
        }
    };

    info!(
        channels = channels.len(),
        output = %cfg.output_path.display(),
        limit = cfg.limit,
        max_duration_secs = cfg.max_duration_secs,
        "starting fetch"
    );

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());
    let transcoder = FfmpegTranscoder::new(cfg.ffmpeg_path.clone());

    match run_sync(&cfg, &channels, client.as_ref(), &transcoder, &cancel).await {
        Ok(summary) => {
            info!(
                total = summary.stats.total,
                soft_errors = summary.errors.len(),
                "saved merged store"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = ?e, "critical failure");
            append_emergency(&cfg.diagnostics_path(), &e);
            ExitCode::FAILURE
        }
    }
}
