// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Periodic heartbeat to the inventory service and dropped-node eviction.

use crate::errors::HeartbeatError;
use crate::tailer::LogTailer;
use conagg_adapters::{AdapterError, InventoryClient};
use conagg_core::{Clock, NodeRegistry};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Heartbeater<I, CK> {
    inventory: Arc<I>,
    registry: Arc<NodeRegistry>,
    tailer: Arc<LogTailer>,
    supervisor: Arc<crate::supervisor::MultiplexerSupervisor>,
    clock: CK,
    last_heartbeat: Arc<RwLock<Option<String>>>,
    pod_id: String,
}

impl<I, CK> Heartbeater<I, CK>
where
    I: InventoryClient,
    CK: Clock,
{
    pub fn new(
        inventory: Arc<I>,
        registry: Arc<NodeRegistry>,
        tailer: Arc<LogTailer>,
        supervisor: Arc<crate::supervisor::MultiplexerSupervisor>,
        clock: CK,
        last_heartbeat: Arc<RwLock<Option<String>>>,
        pod_id: String,
    ) -> Self {
        Self { inventory, registry, tailer, supervisor, clock, last_heartbeat, pod_id }
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
            if let Err(e) = self.heartbeat_once().await {
                tracing::error!(error = %e, "heartbeat iteration failed");
            }
        }
    }

    pub async fn heartbeat_once(&self) -> Result<(), HeartbeatError> {
        let snapshot = self.registry.lock().await.snapshot();

        *self.last_heartbeat.write() = Some(self.clock.rfc3339_now());

        // An unmarshal error on the heartbeat reply is treated as "no
        // dropped nodes this round" rather than aborting the heartbeat;
        // request/transport failures still propagate.
        let dropped = match self.inventory.heartbeat(&self.pod_id, &snapshot).await {
            Ok(dropped) => dropped,
            Err(AdapterError::Decode { service, source }) => {
                tracing::warn!(service, error = %source, "heartbeat response failed to decode, treating as no dropped nodes");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        if dropped.is_empty() {
            return Ok(());
        }

        let mut any_removed = false;
        {
            let mut registry = self.registry.lock().await;
            for record in &dropped {
                if registry.remove(&record.node_id).is_some() {
                    self.tailer.stop(&record.node_id);
                    any_removed = true;
                } else {
                    tracing::debug!(node = %record.node_id, "heartbeat drop for node we no longer held");
                }
            }
        }

        if any_removed {
            if let Err(e) = self.supervisor.signal_restart() {
                tracing::error!(error = %e, "failed to signal conmand restart after heartbeat drop");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "heartbeater_tests.rs"]
mod tests;
