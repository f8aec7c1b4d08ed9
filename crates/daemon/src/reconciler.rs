// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Periodic claim-count reconciliation against the cluster's target
//! distribution.

use crate::errors::ReconcilerError;
use crate::tailer::LogTailer;
use conagg_adapters::{InventoryClient, OperatorClient};
use conagg_core::node::{Bucket, NodeRecord};
use conagg_core::NodeRegistry;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Net nodes to acquire (positive) or release (negative) for one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Deltas {
    river: i64,
    mountain: i64,
}

const DEAD_BAND: f64 = 1.10;

fn ideal_share(total: i64, pod_count: i64) -> i64 {
    total / pod_count.max(1) + 1
}

fn share_delta(current: i64, ideal: i64) -> i64 {
    if current < ideal || (current as f64) > DEAD_BAND * (ideal as f64) {
        ideal - current
    } else {
        0
    }
}

/// Parses the `River:<n>\nMountain:<n>\n` fallback file the way the
/// original does: plain substring search, not a structured parser — the
/// file has exactly one real consumer.
fn parse_target_file(contents: &str) -> (Option<i64>, Option<i64>) {
    let river = contents
        .lines()
        .find_map(|l| l.strip_prefix("River:"))
        .and_then(|v| v.trim().parse::<i64>().ok());
    let mountain = contents
        .lines()
        .find_map(|l| l.strip_prefix("Mountain:"))
        .and_then(|v| v.trim().parse::<i64>().ok());
    (river, mountain)
}

fn clamp_delta(raw: i64, max_acquire: i64) -> i64 {
    raw.clamp(-max_acquire, max_acquire)
}

pub struct Reconciler<I, O> {
    inventory: Arc<I>,
    operator: Arc<O>,
    registry: Arc<NodeRegistry>,
    supervisor: Arc<crate::supervisor::MultiplexerSupervisor>,
    tailer: Arc<LogTailer>,
    pod_id: String,
    alias: String,
    xname: String,
    target_file: std::path::PathBuf,
    max_acquire_river: i64,
    max_acquire_mountain: i64,
    target_river: Arc<AtomicI64>,
    target_mountain: Arc<AtomicI64>,
}

impl<I, O> Reconciler<I, O>
where
    I: InventoryClient,
    O: OperatorClient,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inventory: Arc<I>,
        operator: Arc<O>,
        registry: Arc<NodeRegistry>,
        supervisor: Arc<crate::supervisor::MultiplexerSupervisor>,
        tailer: Arc<LogTailer>,
        pod_id: String,
        alias: String,
        xname: String,
        target_file: std::path::PathBuf,
        max_acquire_river: i64,
        max_acquire_mountain: i64,
        target_river: Arc<AtomicI64>,
        target_mountain: Arc<AtomicI64>,
    ) -> Self {
        Self {
            inventory,
            operator,
            registry,
            supervisor,
            tailer,
            pod_id,
            alias,
            xname,
            target_file,
            max_acquire_river,
            max_acquire_mountain,
            target_river,
            target_mountain,
        }
    }

    pub async fn run(self: Arc<Self>, period: Duration, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(period) => {}
            }
            if shutdown.is_cancelled() {
                return;
            }
            if let Err(e) = self.reconcile_once().await {
                tracing::error!(error = %e, "reconciler iteration failed");
            }
        }
    }

    async fn compute_deltas(&self, current_river: i64, current_mountain: i64) -> Deltas {
        let targets = self.operator.current_targets().await;
        let pod_count = self.inventory.active_pod_count().await;

        let mut deltas = match (targets, pod_count) {
            (Ok(t), Ok(pods)) => {
                let ideal_r = ideal_share(t.total_river_nodes, pods as i64);
                let ideal_m = ideal_share(t.total_mountain_nodes, pods as i64);
                self.target_river.store(ideal_r, Ordering::Relaxed);
                self.target_mountain.store(ideal_m, Ordering::Relaxed);
                Deltas {
                    river: share_delta(current_river, ideal_r),
                    mountain: share_delta(current_mountain, ideal_m),
                }
            }
            _ => {
                tracing::warn!("operator/inventory targets unavailable, falling back to target file");
                self.deltas_from_file(current_river, current_mountain).await
            }
        };

        if deltas.river == 0 {
            deltas.river = 1;
        }
        deltas
    }

    async fn deltas_from_file(&self, current_river: i64, current_mountain: i64) -> Deltas {
        let contents = match tokio::fs::read_to_string(&self.target_file).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.target_file.display(), "failed to read target-nodes fallback file");
                return Deltas::default();
            }
        };
        let (river_target, mountain_target) = parse_target_file(&contents);
        if let Some(t) = river_target {
            self.target_river.store(t, Ordering::Relaxed);
        }
        if let Some(t) = mountain_target {
            self.target_mountain.store(t, Ordering::Relaxed);
        }
        Deltas {
            river: river_target
                .map(|t| clamp_delta(t - current_river, self.max_acquire_river))
                .unwrap_or(0),
            mountain: mountain_target
                .map(|t| clamp_delta(t - current_mountain, self.max_acquire_mountain))
                .unwrap_or(0),
        }
    }

    pub async fn reconcile_once(&self) -> Result<(), ReconcilerError> {
        let mut registry = self.registry.lock().await;
        let current_river = registry.count(Bucket::River) as i64;
        let current_mountain = (registry.count(Bucket::Mountain) + registry.count(Bucket::Paradise)) as i64;

        let deltas = self.compute_deltas(current_river, current_mountain).await;
        let mut changed = false;
        let mut released: Vec<NodeRecord> = Vec::new();

        if deltas.river > 0 || deltas.mountain > 0 {
            let num_river = clamp_delta(deltas.river.max(0), self.max_acquire_river);
            let num_mountain = clamp_delta(deltas.mountain.max(0), self.max_acquire_mountain);
            // Unmarshal error on the acquire reply: log and treat as an
            // empty grant for this pass rather than aborting reconciliation
            // (request/transport failures still propagate via `?`).
            let granted = match self
                .inventory
                .acquire(&self.pod_id, num_mountain, num_river, &self.alias, &self.xname)
                .await
            {
                Ok(granted) => granted,
                Err(conagg_adapters::AdapterError::Decode { service, source }) => {
                    tracing::warn!(service, error = %source, "acquire response failed to decode, treating as empty grant");
                    Vec::new()
                }
                Err(e) => return Err(e.into()),
            };
            if !granted.is_empty() {
                changed = true;
            }
            for record in granted {
                registry.insert(record);
            }
        }

        if deltas.river < 0 {
            let mut to_release = deltas.river.unsigned_abs() as usize;
            for node_id in registry.ids(Bucket::River) {
                if to_release == 0 {
                    break;
                }
                if let Some(record) = registry.remove(&node_id) {
                    released.push(record);
                    to_release -= 1;
                }
            }
        }

        if deltas.mountain < 0 {
            let mut to_release = deltas.mountain.unsigned_abs() as usize;
            while to_release > 0 {
                let mountain_count = registry.count(Bucket::Mountain);
                let paradise_count = registry.count(Bucket::Paradise);
                if mountain_count == 0 && paradise_count == 0 {
                    break;
                }
                let bucket = if mountain_count >= paradise_count { Bucket::Mountain } else { Bucket::Paradise };
                let Some(node_id) = registry.ids(bucket).into_iter().next() else { break };
                if let Some(record) = registry.remove(&node_id) {
                    released.push(record);
                    to_release -= 1;
                }
            }
        }

        for record in &released {
            self.tailer.stop(&record.node_id);
        }
        if !released.is_empty() {
            changed = true;
            self.inventory.release(&self.pod_id, &released).await?;
        }

        drop(registry);

        if changed {
            if let Err(e) = self.supervisor.signal_restart() {
                tracing::error!(error = %e, "failed to signal conmand restart after reconciliation");
            }
        }

        Ok(())
    }
}

/// Reads the fallback target file at `path`, used by tests that want to
/// exercise `parse_target_file` without constructing a full Reconciler.
#[cfg(test)]
fn read_and_parse(path: &Path) -> (Option<i64>, Option<i64>) {
    let contents = std::fs::read_to_string(path).unwrap_or_default();
    parse_target_file(&contents)
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
