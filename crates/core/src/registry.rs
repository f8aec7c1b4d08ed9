// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! In-memory registry of nodes claimed by this pod.
//!
//! Wrapped in [`tokio::sync::Mutex`] rather than `parking_lot::Mutex`
//! because the Reconciler and ConfigWriter hold the guard across `.await`
//! points while talking to the inventory/operator/credential services —
//! see DESIGN.md for why that's intentional rather than an oversight.

use crate::node::{Bucket, NodeId, NodeRecord};
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};

/// The three claimed-node buckets, unguarded. Only reachable through
/// [`NodeRegistry::lock`].
#[derive(Debug, Default)]
pub struct RegistryInner {
    river: HashMap<NodeId, NodeRecord>,
    mountain: HashMap<NodeId, NodeRecord>,
    paradise: HashMap<NodeId, NodeRecord>,
}

impl RegistryInner {
    fn bucket(&self, b: Bucket) -> &HashMap<NodeId, NodeRecord> {
        match b {
            Bucket::River => &self.river,
            Bucket::Mountain => &self.mountain,
            Bucket::Paradise => &self.paradise,
        }
    }

    fn bucket_mut(&mut self, b: Bucket) -> &mut HashMap<NodeId, NodeRecord> {
        match b {
            Bucket::River => &mut self.river,
            Bucket::Mountain => &mut self.mountain,
            Bucket::Paradise => &mut self.paradise,
        }
    }

    /// Insert a claimed node. Fails silently (logged) if the node id is
    /// already claimed in any bucket, rather than overwriting it.
    pub fn insert(&mut self, record: NodeRecord) {
        if self.get(&record.node_id).is_some() {
            tracing::warn!(node = %record.node_id, "insert: node already claimed, skipping");
            return;
        }
        let bucket = record.hw_class.bucket();
        self.bucket_mut(bucket).insert(record.node_id.clone(), record);
    }

    /// Remove a claimed node from whichever bucket holds it. Returns the
    /// removed record, if present.
    pub fn remove(&mut self, node_id: &NodeId) -> Option<NodeRecord> {
        self.river
            .remove(node_id)
            .or_else(|| self.mountain.remove(node_id))
            .or_else(|| self.paradise.remove(node_id))
    }

    /// All claimed node ids in the given bucket.
    pub fn ids(&self, b: Bucket) -> Vec<NodeId> {
        self.bucket(b).keys().cloned().collect()
    }

    /// All claimed River node ids.
    pub fn river_ids(&self) -> Vec<NodeId> {
        self.river.keys().cloned().collect()
    }

    /// Snapshot of every claimed record, river-then-mountain-then-paradise,
    /// mirroring the order `sendSingleHeartbeat` assembles its payload in.
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        self.river
            .values()
            .chain(self.mountain.values())
            .chain(self.paradise.values())
            .cloned()
            .collect()
    }

    pub fn get(&self, node_id: &NodeId) -> Option<&NodeRecord> {
        self.river
            .get(node_id)
            .or_else(|| self.mountain.get(node_id))
            .or_else(|| self.paradise.get(node_id))
    }

    pub fn count(&self, b: Bucket) -> usize {
        self.bucket(b).len()
    }

    pub fn is_empty(&self) -> bool {
        self.river.is_empty() && self.mountain.is_empty() && self.paradise.is_empty()
    }
}

/// Shared, lockable node registry.
#[derive(Default)]
pub struct NodeRegistry {
    inner: Mutex<RegistryInner>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the registry lock. Callers that only need a snapshot should
    /// drop the guard before making any network call; the Reconciler and
    /// ConfigWriter are the sanctioned exceptions that hold it across
    /// `.await` for their whole operation.
    pub async fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().await
    }

    /// Non-blocking emptiness check for callers that can't await the lock
    /// (the supervisor's `has_nodes` poll). Returns `None` if the lock is
    /// currently held elsewhere rather than blocking the caller.
    pub fn try_is_empty(&self) -> Option<bool> {
        self.inner.try_lock().ok().map(|g| g.is_empty())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
