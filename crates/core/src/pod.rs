// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! This pod's location within the cluster, fetched once at startup.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodLocation {
    #[serde(rename = "podname")]
    pub pod_name: String,
    pub alias: String,
    pub xname: String,
}
