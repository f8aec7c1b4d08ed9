// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Liveness/readiness/health HTTP endpoints served by this replica.
//!
//! `axum`'s `MethodRouter` already answers non-GET requests with
//! `405 Method Not Allowed` plus an `Allow: GET` header, so the handlers
//! below only need to cover the GET case.

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::sync::Arc;

/// Point-in-time values the health endpoint reports, read without
/// touching the registry mutex (these are small cached counters, not a
/// live recomputation).
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub target_river: i64,
    pub target_mountain: i64,
    pub last_heartbeat: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    num_mtn: String,
    num_rvr: String,
    target_mtn: String,
    target_rvr: String,
    last_heartbeat: String,
}

#[async_trait]
pub trait HealthSource: Send + Sync + 'static {
    fn health_snapshot(&self) -> HealthSnapshot;
    async fn claimed_counts(&self) -> (usize, usize);
}

pub fn router<S: HealthSource>(source: Arc<S>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .route("/liveness", get(liveness))
        .route("/readiness", get(readiness))
        .with_state(source)
}

async fn health<S: HealthSource>(State(source): State<Arc<S>>) -> Json<serde_json::Value> {
    let snapshot = source.health_snapshot();
    let (num_river, num_mountain) = source.claimed_counts().await;
    let body = HealthResponse {
        num_mtn: num_mountain.to_string(),
        num_rvr: num_river.to_string(),
        target_mtn: snapshot.target_mountain.to_string(),
        target_rvr: snapshot.target_river.to_string(),
        last_heartbeat: snapshot.last_heartbeat.unwrap_or_default(),
    };
    Json(serde_json::to_value(body).unwrap_or(serde_json::Value::Null))
}

async fn liveness() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn readiness() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
