// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! `conaggd` — one console-aggregator pod replica.
//!
//! Wires the adapters, shared registry, and control loops together and
//! runs them as concurrent tasks until SIGTERM/SIGINT.

use conagg_adapters::{HttpCredentialStore, HttpInventoryClient, HttpOperatorClient, OperatorClient};
use conagg_core::{NodeRegistry, SystemClock};
use conagg_daemon::change_monitor::ChangeMonitor;
use conagg_daemon::config_writer::{ConfigUpdater, ConfigWriter};
use conagg_daemon::health;
use conagg_daemon::heartbeater::Heartbeater;
use conagg_daemon::reconciler::Reconciler;
use conagg_daemon::supervisor::MultiplexerSupervisor;
use conagg_daemon::tailer::{AggregatedLog, LogTailer};
use conagg_daemon::{env, Daemon, Paths};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_new(env::log_filter_directive()).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pod_id = env::pod_id();
    let paths = Paths::default();

    let inventory = Arc::new(HttpInventoryClient::new(env::inventory_base_url()));
    let operator = Arc::new(HttpOperatorClient::new(env::operator_base_url()));
    let credentials = Arc::new(HttpCredentialStore::new(env::credential_base_url(), "/etc/conman-keys"));

    let pod_location = fetch_pod_location(&*operator, &pod_id).await;
    tracing::info!(pod = %pod_id, alias = %pod_location.alias, xname = %pod_location.xname, "resolved pod location");

    let registry = Arc::new(NodeRegistry::new());
    let aggregated_log = Arc::new(AggregatedLog::new(paths.aggregated_log_path.clone()));
    if let Err(e) = aggregated_log.respin() {
        tracing::error!(error = %e, "failed to open aggregated console log at startup");
    }
    let tailer = Arc::new(LogTailer::new(paths.console_log_dir.clone(), aggregated_log));
    let supervisor = Arc::new(MultiplexerSupervisor::new(paths.conf_path.clone(), tailer.clone()));

    let daemon = Arc::new(Daemon::new(
        pod_id.clone(),
        pod_location,
        paths,
        registry.clone(),
        tailer.clone(),
        supervisor.clone(),
        inventory.clone(),
        operator.clone(),
        credentials.clone(),
        SystemClock,
    ));

    let config_writer: Arc<dyn ConfigUpdater> = Arc::new(ConfigWriter::new(
        credentials.clone(),
        registry.clone(),
        tailer.clone(),
        daemon.paths.base_conf_template.clone(),
        daemon.paths.conf_path.clone(),
        daemon.previous_passwords.clone(),
    ));

    let reconciler = Arc::new(Reconciler::new(
        inventory.clone(),
        operator.clone(),
        registry.clone(),
        supervisor.clone(),
        tailer.clone(),
        daemon.pod_id.clone(),
        daemon.pod_location.alias.clone(),
        daemon.pod_location.xname.clone(),
        daemon.paths.target_node_file.clone(),
        env::max_acquire_per_update_rvr(),
        env::max_acquire_per_update_mtn(),
        daemon.target_river.clone(),
        daemon.target_mountain.clone(),
    ));

    let heartbeater = Arc::new(Heartbeater::new(
        inventory.clone(),
        registry.clone(),
        tailer.clone(),
        supervisor.clone(),
        SystemClock,
        daemon.last_heartbeat.clone(),
        daemon.pod_id.clone(),
    ));

    let change_monitor = Arc::new(ChangeMonitor::new(
        credentials.clone(),
        registry.clone(),
        supervisor.clone(),
        daemon.previous_passwords.clone(),
        daemon.previous_key_digests.clone(),
    ));

    let shutdown = daemon.shutdown.clone();

    let mut tasks = JoinSet::new();
    tasks.spawn(reconciler.run(env::node_update_freq(), shutdown.clone()));
    tasks.spawn(heartbeater.run(env::heartbeat_send_freq(), shutdown.clone()));
    tasks.spawn(change_monitor.run(env::change_monitor_freq(), shutdown.clone()));

    let registry_for_has_nodes = registry.clone();
    let has_nodes = move || registry_for_has_nodes.try_is_empty().map(|empty| !empty).unwrap_or(true);
    tasks.spawn(supervisor.clone().run_loop(config_writer, has_nodes, shutdown.clone()));

    let health_addr = env::health_bind_addr();
    let health_daemon = daemon.clone();
    let health_shutdown = shutdown.clone();
    tasks.spawn(async move {
        let listener = match tokio::net::TcpListener::bind(health_addr).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, addr = %health_addr, "failed to bind health endpoint");
                return;
            }
        };
        tracing::info!(addr = %health_addr, "health endpoint listening");
        let app = health::router(health_daemon);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { health_shutdown.cancelled().await })
            .await
            .ok();
    });

    // None of these loops return on their own except in response to
    // `shutdown` or a fatal error (e.g. the supervisor aborting on an
    // unrecoverable config write). A task finishing before the shutdown
    // signal is requested means the latter, and the original daemon
    // treats that as fatal via `log.Fatal` — match that by exiting the
    // process rather than quietly running with a dead control loop.
    tokio::select! {
        result = wait_for_shutdown_signal() => {
            result?;
            tracing::info!("shutdown signal received, stopping control loops");
            shutdown.cancel();
        }
        Some(outcome) = tasks.join_next() => {
            tracing::error!(?outcome, "a control loop exited before shutdown was requested, aborting");
            std::process::exit(1);
        }
    }

    while tasks.join_next().await.is_some() {}
    tailer.stop_all();

    Ok(())
}

/// Resolve this pod's location at startup, retrying forever (matching the
/// original operator client's fixed 30s retry interval) since nothing else
/// can proceed without it.
async fn fetch_pod_location(operator: &impl OperatorClient, pod_id: &str) -> conagg_core::PodLocation {
    loop {
        match operator.pod_location(pod_id).await {
            Ok(loc) => return loc,
            Err(e) => {
                tracing::warn!(error = %e, "failed to resolve pod location, retrying");
                tokio::time::sleep(env::operator_retry_interval()).await;
            }
        }
    }
}

async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
