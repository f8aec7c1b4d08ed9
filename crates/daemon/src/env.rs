// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Centralized environment variable access for the daemon crate.

use std::time::Duration;

/// Read an env var as an integer, clamped to `[lo, hi]`, falling back to
/// `default` if unset or unparseable. Mirrors the original's
/// `readSingleEnvVarInt` clamp-with-default behavior.
fn clamped_int(name: &str, lo: i64, hi: i64, default: i64) -> i64 {
    let Some(raw) = std::env::var(name).ok() else {
        return default;
    };
    match raw.trim().parse::<i64>() {
        Ok(v) => v.clamp(lo, hi),
        Err(_) => {
            tracing::warn!(env = name, value = %raw, "failed to parse env var, using default");
            default
        }
    }
}

pub fn heartbeat_send_freq() -> Duration {
    Duration::from_secs(clamped_int("HEARTBEAT_SEND_FREQ_SEC", 5, 300, 30) as u64)
}

pub fn node_update_freq() -> Duration {
    Duration::from_secs(clamped_int("NODE_UPDATE_FREQ_SEC", 10, 600, 30) as u64)
}

pub fn max_acquire_per_update_mtn() -> i64 {
    clamped_int("MAX_ACQUIRE_PER_UPDATE_MTN", 5, 2000, 500)
}

pub fn max_acquire_per_update_rvr() -> i64 {
    clamped_int("MAX_ACQUIRE_PER_UPDATE_RVR", 5, 4000, 200)
}

pub fn change_monitor_freq() -> Duration {
    Duration::from_secs(clamped_int("CHANGE_MONITOR_FREQ_SEC", 5, 300, 30) as u64)
}

pub fn pod_id() -> String {
    std::env::var("POD_ID").unwrap_or_else(|_| "cray-console-node-0".to_string())
}

pub fn pod_name() -> String {
    std::env::var("POD_NAME").unwrap_or_else(|_| pod_id())
}

pub fn inventory_base_url() -> String {
    std::env::var("INVENTORY_ADDR_BASE").unwrap_or_else(|_| "http://cray-console-data/v1".to_string())
}

pub fn operator_base_url() -> String {
    std::env::var("OPERATOR_ADDR_BASE")
        .unwrap_or_else(|_| "http://cray-console-operator/console-operator".to_string())
}

pub fn credential_base_url() -> String {
    std::env::var("CREDENTIAL_ADDR_BASE").unwrap_or_else(|_| "http://cray-console-data/v1".to_string())
}

/// Retry interval for the startup-time pod-location lookup, matching the
/// original operator client's fixed 30s `operatorRetryInterval`.
pub fn operator_retry_interval() -> Duration {
    Duration::from_secs(30)
}

pub fn health_bind_addr() -> std::net::SocketAddr {
    let port = clamped_int("HEALTH_PORT", 1, 65535, 8080) as u16;
    std::net::SocketAddr::from(([0, 0, 0, 0], port))
}

/// Log level string as set by the operator, mapped onto a tracing filter
/// directive. FATAL/PANIC (inherited from the original's zap levels) have
/// no tracing equivalent and clamp down to `error`.
pub fn log_filter_directive() -> String {
    let raw = std::env::var("LOG_LEVEL").unwrap_or_default().to_uppercase();
    match raw.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" | "FATAL" | "PANIC" => "error",
        _ => "info",
    }
    .to_string()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
