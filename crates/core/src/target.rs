// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Fleet-wide targets reported by the operator service.

use serde::{Deserialize, Serialize};

/// Cluster-wide claim targets, as returned by the operator service's
/// current-targets endpoint. Distinct from the inventory service's
/// active-pod-count call (see [`crate::registry`] callers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTargets {
    #[serde(rename = "targetnumrvrnodes")]
    pub target_num_river_nodes: i64,
    #[serde(rename = "targetnummtnnodes")]
    pub target_num_mountain_nodes: i64,
    #[serde(rename = "totalrvrnodes")]
    pub total_river_nodes: i64,
    #[serde(rename = "totalmtnnodes")]
    pub total_mountain_nodes: i64,
    #[serde(rename = "targetnumnodepods")]
    pub target_num_node_pods: i64,
}
