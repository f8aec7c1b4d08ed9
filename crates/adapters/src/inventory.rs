// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Client for the inventory service: node acquisition, release, heartbeat,
//! and active-pod-count queries.

use crate::errors::AdapterError;
use async_trait::async_trait;
use conagg_core::node::NodeRecord;
use serde::{Deserialize, Serialize};

/// Nodes returned as dropped by the inventory service's heartbeat reply.
pub type DroppedNodes = Vec<NodeRecord>;

#[async_trait]
pub trait InventoryClient: Send + Sync + 'static {
    /// Ask the inventory service to hand this pod up to `num_mountain` +
    /// `num_paradise` Mountain-bucket nodes and `num_river` River nodes.
    async fn acquire(
        &self,
        pod_id: &str,
        num_mountain: i64,
        num_river: i64,
        alias: &str,
        xname: &str,
    ) -> Result<Vec<NodeRecord>, AdapterError>;

    /// Tell the inventory service this pod no longer holds the given nodes.
    async fn release(&self, pod_id: &str, nodes: &[NodeRecord]) -> Result<(), AdapterError>;

    /// Report the currently claimed node set; returns any nodes the
    /// inventory service has reassigned away from this pod.
    async fn heartbeat(
        &self,
        pod_id: &str,
        current: &[NodeRecord],
    ) -> Result<DroppedNodes, AdapterError>;

    /// Number of console-aggregator pods with at least one active node,
    /// used as the denominator in the ideal-share calculation.
    async fn active_pod_count(&self) -> Result<u32, AdapterError>;
}

#[derive(Debug, Serialize)]
struct AcquireRequest<'a> {
    nummtn: i64,
    numrvr: i64,
    alias: &'a str,
    xname: &'a str,
}

#[derive(Debug, Deserialize)]
struct ActivePodCountResponse {
    count: u32,
}

pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInventoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn acquire(
        &self,
        pod_id: &str,
        num_mountain: i64,
        num_river: i64,
        alias: &str,
        xname: &str,
    ) -> Result<Vec<NodeRecord>, AdapterError> {
        let url = self.url(&format!("/consolepod/{pod_id}/acquire"));
        let body = AcquireRequest { nummtn: num_mountain, numrvr: num_river, alias, xname };
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url: url.clone(), source })?;
        if !resp.status().is_success() {
            return Err(AdapterError::UnexpectedStatus {
                service: "inventory",
                url,
                status: resp.status().as_u16(),
            });
        }
        resp.json().await.map_err(|source| AdapterError::Decode { service: "inventory", source })
    }

    async fn release(&self, pod_id: &str, nodes: &[NodeRecord]) -> Result<(), AdapterError> {
        let url = self.url(&format!("/consolepod/{pod_id}/release"));
        self.client
            .post(&url)
            .json(nodes)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url, source })?;
        Ok(())
    }

    async fn heartbeat(
        &self,
        pod_id: &str,
        current: &[NodeRecord],
    ) -> Result<DroppedNodes, AdapterError> {
        let url = self.url(&format!("/consolepod/{pod_id}/heartbeat"));
        let resp = self
            .client
            .post(&url)
            .json(current)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url: url.clone(), source })?;
        if !resp.status().is_success() {
            return Err(AdapterError::UnexpectedStatus {
                service: "inventory",
                url,
                status: resp.status().as_u16(),
            });
        }
        resp.json().await.map_err(|source| AdapterError::Decode { service: "inventory", source })
    }

    async fn active_pod_count(&self) -> Result<u32, AdapterError> {
        let url = self.url("/activepods");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url: url.clone(), source })?;
        if !resp.status().is_success() {
            return Err(AdapterError::UnexpectedStatus {
                service: "inventory",
                url,
                status: resp.status().as_u16(),
            });
        }
        let body: ActivePodCountResponse =
            resp.json().await.map_err(|source| AdapterError::Decode { service: "inventory", source })?;
        Ok(body.count)
    }
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
