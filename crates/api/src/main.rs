use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use domain::services::{mail_queue, GroupService, InviteNotifier};
use group_service_api::app::{create_app, AppState};
use group_service_api::config::Config;
use group_service_api::middleware::{init_logging, init_metrics};
use group_service_api::services::{
    HttpAccountClient, HttpAuthClient, MailInviteNotifier, SmtpMailSender,
};
use persistence::GroupRepository;
use tracing::{info, warn};

/// Upper bound on how long pending mail retries may delay exit.
const MAIL_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging).context("failed to initialize logging")?;
    init_metrics().context("failed to install metrics recorder")?;

    info!("Starting Group Service v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::create_pool(&config.database.pool_config()).await?;

    info!("Running database migrations...");
    persistence::run_migrations(&pool).await?;
    info!("Migrations completed");

    let secret = config.security.internal_secret.clone();
    let accounts = HttpAccountClient::new(&config.services, secret.clone())?;
    let auth = HttpAuthClient::new(&config.services, secret)?;

    let mut groups = GroupService::new(
        Arc::new(GroupRepository::new(pool.clone())),
        Arc::new(accounts),
    )
    .with_link_prefix(config.invite.link_prefix.clone());

    let mail_worker = if config.mail.enabled {
        let (queue, worker) = mail_queue(
            config.mail.queue_capacity,
            config.mail.timespan(),
            Arc::new(SmtpMailSender::new(&config.mail)),
        );
        let notifier: Arc<dyn InviteNotifier> =
            Arc::new(MailInviteNotifier::new(queue, &config.mail)?);
        groups = groups.with_notifier(notifier);
        info!(
            smtp_host = %config.mail.smtp_host,
            timespan_secs = config.mail.timespan_secs,
            "Invite mail enabled"
        );
        Some(tokio::spawn(worker.run()))
    } else {
        info!("Invite mail disabled");
        None
    };

    let addr = config.socket_addr()?;
    let state = AppState::new(config, groups, Arc::new(auth)).with_pool(pool);
    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last queue producers, so the worker now drains and exits.
    if let Some(worker) = mail_worker {
        match tokio::time::timeout(MAIL_DRAIN_TIMEOUT, worker).await {
            Ok(Ok(())) => info!("Mail worker stopped"),
            Ok(Err(e)) => warn!(error = %e, "Mail worker task failed"),
            Err(_) => warn!("Mail worker did not drain in time; pending letters are lost"),
        }
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
