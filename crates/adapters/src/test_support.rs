// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! In-memory fakes for the three service traits, used by `conagg-daemon`'s
//! control-loop tests.

use crate::credential::CredentialStore;
use crate::errors::AdapterError;
use crate::inventory::{DroppedNodes, InventoryClient};
use crate::operator::OperatorClient;
use async_trait::async_trait;
use conagg_core::node::{BmcId, NodeRecord};
use conagg_core::target::CurrentTargets;
use conagg_core::{PodLocation, RiverCredential};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

/// One recorded call, for assertions in tests that check call sequencing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryCall {
    Acquire { num_mountain: i64, num_river: i64 },
    Release { count: usize },
    Heartbeat { count: usize },
}

#[derive(Default)]
pub struct FakeInventoryClient {
    pub calls: Mutex<Vec<InventoryCall>>,
    pub acquire_queue: Mutex<VecDeque<Vec<NodeRecord>>>,
    pub heartbeat_dropped: Mutex<VecDeque<DroppedNodes>>,
    pub active_pod_count: Mutex<u32>,
}

impl FakeInventoryClient {
    pub fn new() -> Self {
        Self { active_pod_count: Mutex::new(1), ..Default::default() }
    }
}

#[async_trait]
impl InventoryClient for FakeInventoryClient {
    async fn acquire(
        &self,
        _pod_id: &str,
        num_mountain: i64,
        num_river: i64,
        _alias: &str,
        _xname: &str,
    ) -> Result<Vec<NodeRecord>, AdapterError> {
        self.calls.lock().push(InventoryCall::Acquire { num_mountain, num_river });
        Ok(self.acquire_queue.lock().pop_front().unwrap_or_default())
    }

    async fn release(&self, _pod_id: &str, nodes: &[NodeRecord]) -> Result<(), AdapterError> {
        self.calls.lock().push(InventoryCall::Release { count: nodes.len() });
        Ok(())
    }

    async fn heartbeat(
        &self,
        _pod_id: &str,
        current: &[NodeRecord],
    ) -> Result<DroppedNodes, AdapterError> {
        self.calls.lock().push(InventoryCall::Heartbeat { count: current.len() });
        Ok(self.heartbeat_dropped.lock().pop_front().unwrap_or_default())
    }

    async fn active_pod_count(&self) -> Result<u32, AdapterError> {
        Ok(*self.active_pod_count.lock())
    }
}

pub struct FakeOperatorClient {
    pub pod_location: Mutex<PodLocation>,
    pub current_targets: Mutex<CurrentTargets>,
}

impl Default for FakeOperatorClient {
    fn default() -> Self {
        Self {
            pod_location: Mutex::new(PodLocation {
                pod_name: "cray-console-node-0".into(),
                alias: "0".into(),
                xname: "x3000c0s1b0".into(),
            }),
            current_targets: Mutex::new(CurrentTargets {
                target_num_river_nodes: 0,
                target_num_mountain_nodes: 0,
                total_river_nodes: 0,
                total_mountain_nodes: 0,
                target_num_node_pods: 1,
            }),
        }
    }
}

#[async_trait]
impl OperatorClient for FakeOperatorClient {
    async fn pod_location(&self, _pod_id: &str) -> Result<PodLocation, AdapterError> {
        Ok(self.pod_location.lock().clone())
    }

    async fn current_targets(&self) -> Result<CurrentTargets, AdapterError> {
        Ok(*self.current_targets.lock())
    }
}

pub struct FakeCredentialStore {
    pub passwords: Mutex<HashMap<BmcId, RiverCredential>>,
    pub key_dir: PathBuf,
    pub ensure_calls: Mutex<u32>,
}

impl FakeCredentialStore {
    pub fn new(key_dir: PathBuf) -> Self {
        Self { passwords: Mutex::new(HashMap::new()), key_dir, ensure_calls: Mutex::new(0) }
    }
}

#[async_trait]
impl CredentialStore for FakeCredentialStore {
    async fn fetch_river_passwords(
        &self,
        bmc_xnames: &[BmcId],
    ) -> Result<HashMap<BmcId, RiverCredential>, AdapterError> {
        let passwords = self.passwords.lock();
        Ok(bmc_xnames
            .iter()
            .filter_map(|id| passwords.get(id).map(|c| (id.clone(), c.clone())))
            .collect())
    }

    async fn ensure_mountain_keys_present(&self) -> Result<(), AdapterError> {
        *self.ensure_calls.lock() += 1;
        Ok(())
    }

    fn mountain_key_paths(&self) -> (PathBuf, PathBuf) {
        (self.key_dir.join("ssh-console"), self.key_dir.join("ssh-console.pub"))
    }
}
