//! Polling loop and process wiring

use anyhow::{Context, Result};
use imgdrop_core::Config;
use imgdrop_processing::ImageValidator;
use imgdrop_storage::{CloudflareImages, ImageHost};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::auth::{AuthGate, JsonFileRosterStore};
use crate::handlers::Bot;
use crate::orchestrator::UploadPipeline;
use crate::pending::PendingUploads;
use crate::transport::{TelegramClient, UpdateSource};

/// Delay before polling again after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polls for updates and handles each one on its own task.
pub struct PollingServer {
    updates: Arc<dyn UpdateSource>,
    bot: Arc<Bot>,
    retry_delay: Duration,
}

impl PollingServer {
    pub fn new(updates: Arc<dyn UpdateSource>, bot: Arc<Bot>) -> Self {
        Self {
            updates,
            bot,
            retry_delay: POLL_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Serve until `shutdown` is cancelled, then wait for in-flight updates.
    pub async fn run(self, shutdown: CancellationToken) {
        let tracker = TaskTracker::new();
        let mut offset = 0i64;

        tracing::info!("Polling for updates");
        loop {
            let batch = tokio::select! {
                () = shutdown.cancelled() => break,
                batch = self.updates.next_updates(offset) => batch,
            };

            match batch {
                Ok(batch) => {
                    offset = batch.next_offset(offset);
                    for update in batch.events {
                        let bot = self.bot.clone();
                        tracker.spawn(async move { bot.handle(update).await });
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch updates, retrying");
                    tokio::select! {
                        () = shutdown.cancelled() => break,
                        () = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        tracker.close();
        tracing::info!(in_flight = tracker.len(), "Waiting for in-flight submissions");
        tracker.wait().await;
        tracing::info!("Polling stopped");
    }
}

/// Wire every component from the configuration and serve until a shutdown signal.
pub async fn run(config: Config) -> Result<()> {
    let telegram = Arc::new(
        TelegramClient::new(&config.telegram, config.http_timeout())
            .context("Failed to create Telegram client")?,
    );
    let host: Arc<dyn ImageHost> = Arc::new(
        CloudflareImages::new(&config.cloudflare, config.http_timeout())
            .context("Failed to create Cloudflare Images client")?,
    );

    let store = Arc::new(JsonFileRosterStore::new(&config.roster_path));
    let auth = Arc::new(
        AuthGate::load(config.admin_id, &config.authorized_users, store)
            .await
            .context("Failed to load authorized users")?,
    );

    let pipeline = UploadPipeline::new(
        telegram.clone(),
        telegram.clone(),
        host,
        ImageValidator::default(),
        config.http_timeout(),
    );
    let bot = Arc::new(Bot::new(
        telegram.clone(),
        auth,
        Arc::new(PendingUploads::new()),
        pipeline,
    ));

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    PollingServer::new(telegram, bot).run(shutdown).await;
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
