//! `capsync sync` - trigger synchronization and await the terminal outcome

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use capsync_core::{AccessTokenProvider, SyncService};
use capsync_domain::{CapacityReference, Session, SyncState};
use capsync_infra::config;
use capsync_infra::sync::{
    ClusterResolveClient, HttpStatusPoller, HttpSyncSubmitter, PollingPolicy,
};
use capsync_infra::{EnvTokenProvider, HttpClient};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Arguments for the sync command
pub struct SyncArgs {
    pub instance: String,
    pub database: String,
    pub pass_thru: bool,
    pub environment: Option<String>,
    pub account: Option<String>,
}

/// Run the sync command to completion and map the outcome to an exit status.
pub async fn run(args: SyncArgs) -> anyhow::Result<()> {
    let mut config = config::load().context("failed to load configuration")?;
    if let Some(host) = args.environment {
        config.environment.host = host;
    }
    let account = args
        .account
        .or(config.account.clone())
        .unwrap_or_else(|| "default".to_string());

    let reference = CapacityReference::parse(&args.instance)?;
    // A configured environment wins; a URI-form reference that names a
    // different host is rejected by the orchestrator's pre-flight check.
    let environment_host = if config.environment.host.is_empty() {
        reference.environment_host().unwrap_or_default().to_string()
    } else {
        config.environment.host.clone()
    };
    if environment_host.is_empty() {
        anyhow::bail!(
            "no environment configured; pass --environment or set CAPSYNC_ENVIRONMENT_HOST"
        );
    }
    let session = Session::new(account, environment_host);

    // Fail before any network call when no token is available.
    let tokens = Arc::new(EnvTokenProvider::new());
    tokens
        .access_token(&session.account, &session.environment)
        .await
        .context("not authenticated")?;

    let http = HttpClient::builder()
        .timeout(Duration::from_secs(config.http.timeout_seconds))
        .user_agent(concat!("capsync/", env!("CARGO_PKG_VERSION")))
        .build();
    let service = SyncService::new(
        tokens,
        Arc::new(ClusterResolveClient::new(http.clone())),
        Arc::new(HttpSyncSubmitter::new(
            http.clone(),
            config.environment.sync_path_template.clone(),
            Duration::from_secs(config.polling.poll_interval_seconds),
        )),
        Arc::new(HttpStatusPoller::new(http, PollingPolicy::from(&config.polling))),
    );

    // Ctrl-C aborts the current wait or request and yields a terminal outcome.
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; cancelling synchronization");
            interrupt.cancel();
        }
    });

    info!(
        database = args.database,
        capacity = %reference,
        "sending sync request"
    );
    let outcome = service.synchronize(&session, &reference, &args.database, cancel).await?;
    info!(
        correlation_id = %outcome.correlation_id,
        state = ?outcome.state,
        "sync request finished"
    );

    if outcome.state != SyncState::Completed {
        let serialized = serde_json::to_string(&outcome)?;
        anyhow::bail!("synchronization failed: {serialized}");
    }

    if args.pass_thru {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    Ok(())
}
