// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Shared context threaded through the Reconciler, Heartbeater,
//! ChangeMonitor, and ConfigWriter.

use crate::health::{HealthSnapshot, HealthSource};
use crate::supervisor::MultiplexerSupervisor;
use crate::tailer::LogTailer;
use async_trait::async_trait;
use conagg_adapters::{CredentialStore, InventoryClient, OperatorClient};
use conagg_core::node::BmcId;
use conagg_core::{Clock, KeyDigests, NodeRegistry, PodLocation, RiverCredential};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Static filesystem layout this pod writes/reads.
pub struct Paths {
    pub base_conf_template: PathBuf,
    pub conf_path: PathBuf,
    pub console_log_dir: PathBuf,
    pub aggregated_log_path: PathBuf,
    pub target_node_file: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            base_conf_template: PathBuf::from("/app/conman_base.conf"),
            conf_path: PathBuf::from("/etc/conman.conf"),
            console_log_dir: PathBuf::from("/var/log/conman"),
            aggregated_log_path: PathBuf::from("/var/log/console/consoleAgg.log"),
            target_node_file: PathBuf::from("/var/log/console/TargetNodes.txt"),
        }
    }
}

/// Per-replica context shared (by `Arc`) across all of this pod's
/// background tasks.
pub struct Daemon<I, O, C, CK> {
    pub pod_id: String,
    pub pod_location: PodLocation,
    pub paths: Paths,

    pub registry: Arc<NodeRegistry>,
    pub tailer: Arc<LogTailer>,
    pub supervisor: Arc<MultiplexerSupervisor>,

    pub inventory: Arc<I>,
    pub operator: Arc<O>,
    pub credentials: Arc<C>,
    pub clock: CK,

    pub previous_passwords: Arc<parking_lot::Mutex<Option<HashMap<BmcId, RiverCredential>>>>,
    pub previous_key_digests: Arc<parking_lot::Mutex<Option<KeyDigests>>>,
    pub last_heartbeat: Arc<RwLock<Option<String>>>,

    pub target_river: Arc<AtomicI64>,
    pub target_mountain: Arc<AtomicI64>,

    pub shutdown: CancellationToken,
}

impl<I, O, C, CK> Daemon<I, O, C, CK>
where
    I: InventoryClient,
    O: OperatorClient,
    C: CredentialStore,
    CK: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pod_id: String,
        pod_location: PodLocation,
        paths: Paths,
        registry: Arc<NodeRegistry>,
        tailer: Arc<LogTailer>,
        supervisor: Arc<MultiplexerSupervisor>,
        inventory: Arc<I>,
        operator: Arc<O>,
        credentials: Arc<C>,
        clock: CK,
    ) -> Self {
        Self {
            pod_id,
            pod_location,
            paths,
            registry,
            tailer,
            supervisor,
            inventory,
            operator,
            credentials,
            clock,
            previous_passwords: Arc::new(parking_lot::Mutex::new(None)),
            previous_key_digests: Arc::new(parking_lot::Mutex::new(None)),
            last_heartbeat: Arc::new(RwLock::new(None)),
            target_river: Arc::new(AtomicI64::new(0)),
            target_mountain: Arc::new(AtomicI64::new(0)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn health_snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            target_river: self.target_river.load(Ordering::Relaxed),
            target_mountain: self.target_mountain.load(Ordering::Relaxed),
            last_heartbeat: self.last_heartbeat.read().clone(),
        }
    }
}

#[async_trait]
impl<I, O, C, CK> HealthSource for Daemon<I, O, C, CK>
where
    I: InventoryClient,
    O: OperatorClient,
    C: CredentialStore,
    CK: Clock,
{
    fn health_snapshot(&self) -> HealthSnapshot {
        Daemon::health_snapshot(self)
    }

    async fn claimed_counts(&self) -> (usize, usize) {
        use conagg_core::node::Bucket;
        let registry = self.registry.lock().await;
        (registry.count(Bucket::River), registry.count(Bucket::Mountain) + registry.count(Bucket::Paradise))
    }
}
