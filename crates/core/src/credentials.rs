// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Credential shapes shared between `ConfigWriter` (writer) and
//! `ChangeMonitor` (reader) across their common `previous_*` cells.

use serde::{Deserialize, Serialize};

/// BMC username/password pair for a River node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiverCredential {
    pub username: String,
    pub password: String,
}

/// SHA-256 digests of the Mountain/Paradise ssh keypair files, used to
/// detect rotation without keeping the key material itself in memory
/// any longer than the digest computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDigests {
    pub private: [u8; 32],
    pub public: [u8; 32],
}
