// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Per-component error types for the control loops and process
//! supervision, mirroring the disposition table: logged-and-retried,
//! logged-and-skipped, or fatal.

use conagg_adapters::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("inventory service error: {0}")]
    Inventory(#[from] AdapterError),

    #[error("failed to read target-nodes fallback file: {0}")]
    TargetFile(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum HeartbeatError {
    #[error("inventory service error: {0}")]
    Inventory(#[from] AdapterError),
}

#[derive(Debug, Error)]
pub enum ChangeMonitorError {
    #[error("credential service error: {0}")]
    Credential(#[from] AdapterError),

    #[error("failed to hash key file {path}: {source}")]
    HashFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Config-write failures are fatal by policy (see DESIGN.md); still a
/// typed error so the caller can log context before the process exits.
#[derive(Debug, Error)]
pub enum ConfigWriterError {
    #[error("credential service error: {0}")]
    Credential(#[from] AdapterError),

    #[error("failed to open base config template {path}: {source}")]
    OpenBase {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write conman config file {path}: {source}")]
    WriteConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("passwords unavailable after {attempts} retries")]
    PasswordsUnavailable { attempts: u32 },
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn conmand: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to signal conmand (pid {pid}): {source}")]
    Signal {
        pid: i32,
        #[source]
        source: nix::Error,
    },
}
