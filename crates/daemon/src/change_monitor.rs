// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Detects BMC password rotation and SSH console keypair rotation, and
//! triggers a multiplexer restart when either changes.

use crate::errors::ChangeMonitorError;
use conagg_adapters::CredentialStore;
use conagg_core::node::Bucket;
use conagg_core::{KeyDigests, NodeRegistry, RiverCredential};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use conagg_core::node::BmcId;

pub struct ChangeMonitor<C> {
    credentials: Arc<C>,
    registry: Arc<NodeRegistry>,
    supervisor: Arc<crate::supervisor::MultiplexerSupervisor>,
    previous_passwords: Arc<parking_lot::Mutex<Option<HashMap<BmcId, RiverCredential>>>>,
    previous_key_digests: Arc<parking_lot::Mutex<Option<KeyDigests>>>,
}

impl<C> ChangeMonitor<C>
where
    C: CredentialStore,
{
    pub fn new(
        credentials: Arc<C>,
        registry: Arc<NodeRegistry>,
        supervisor: Arc<crate::supervisor::MultiplexerSupervisor>,
        previous_passwords: Arc<parking_lot::Mutex<Option<HashMap<BmcId, RiverCredential>>>>,
        previous_key_digests: Arc<parking_lot::Mutex<Option<KeyDigests>>>,
    ) -> Self {
        Self { credentials, registry, supervisor, previous_passwords, previous_key_digests }
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
            if let Err(e) = self.check_once().await {
                tracing::error!(error = %e, "change-monitor iteration failed");
            }
        }
    }

    pub async fn check_once(&self) -> Result<(), ChangeMonitorError> {
        let (river_bmc_ids, any_mountain) = {
            let registry = self.registry.lock().await;
            let river_bmc_ids: Vec<BmcId> =
                registry.snapshot().into_iter().filter(|r| r.hw_class.is_river()).map(|r| r.bmc_id).collect();
            let any_mountain = registry.count(Bucket::Mountain) > 0 || registry.count(Bucket::Paradise) > 0;
            (river_bmc_ids, any_mountain)
        };

        let mut changed = false;

        // Until a ConfigWriter run has primed `previous_passwords`, we must
        // not claim a password change — `previous.is_none()` covers that.
        if !river_bmc_ids.is_empty() {
            let current = self.credentials.fetch_river_passwords(&river_bmc_ids).await?;
            let mut previous = self.previous_passwords.lock();
            if let Some(prev) = previous.as_ref() {
                for (bmc_id, creds) in &current {
                    match prev.get(bmc_id) {
                        Some(old) if old != creds => {
                            changed = true;
                            break;
                        }
                        Some(_) => {}
                        None => {
                            tracing::debug!(bmc = %bmc_id, "credential fetch has an entry not in the previous snapshot, skipping");
                        }
                    }
                }
            }
        }

        if any_mountain {
            let (private_path, public_path) = self.credentials.mountain_key_paths();
            match self.current_key_digests(&private_path, &public_path) {
                Ok(digests) => {
                    let mut previous = self.previous_key_digests.lock();
                    if let Some(prev) = previous.as_ref() {
                        if prev.private != digests.private || prev.public != digests.public {
                            changed = true;
                        }
                    }
                    *previous = Some(digests);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to hash mountain ssh console keys, treating as no change");
                }
            }
        }

        if changed {
            if let Err(e) = self.supervisor.signal_restart() {
                tracing::error!(error = %e, "failed to signal conmand restart after credential change");
            }
        }

        Ok(())
    }

    fn current_key_digests(&self, private: &Path, public: &Path) -> Result<KeyDigests, ChangeMonitorError> {
        Ok(KeyDigests { private: hash_file(private)?, public: hash_file(public)? })
    }
}

fn hash_file(path: &Path) -> Result<[u8; 32], ChangeMonitorError> {
    let bytes = std::fs::read(path)
        .map_err(|source| ChangeMonitorError::HashFile { path: path.display().to_string(), source })?;
    Ok(Sha256::digest(&bytes).into())
}

#[cfg(test)]
#[path = "change_monitor_tests.rs"]
mod tests;
