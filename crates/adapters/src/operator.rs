// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Client for the operator service: pod location lookup and fleet-wide
//! current-targets queries.

use crate::errors::AdapterError;
use async_trait::async_trait;
use conagg_core::target::CurrentTargets;
use conagg_core::PodLocation;

#[async_trait]
pub trait OperatorClient: Send + Sync + 'static {
    /// Resolve this pod's location (alias/xname), called once at startup.
    async fn pod_location(&self, pod_id: &str) -> Result<PodLocation, AdapterError>;

    /// Fleet-wide target counts, used as the primary source for the
    /// Reconciler's ideal-share calculation.
    async fn current_targets(&self) -> Result<CurrentTargets, AdapterError>;
}

pub struct HttpOperatorClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOperatorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl OperatorClient for HttpOperatorClient {
    async fn pod_location(&self, pod_id: &str) -> Result<PodLocation, AdapterError> {
        let url = self.url(&format!("/location/{pod_id}"));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url: url.clone(), source })?;
        if !resp.status().is_success() {
            return Err(AdapterError::UnexpectedStatus {
                service: "operator",
                url,
                status: resp.status().as_u16(),
            });
        }
        resp.json().await.map_err(|source| AdapterError::Decode { service: "operator", source })
    }

    async fn current_targets(&self) -> Result<CurrentTargets, AdapterError> {
        let url = self.url("/currentTargets");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url: url.clone(), source })?;
        if !resp.status().is_success() {
            return Err(AdapterError::UnexpectedStatus {
                service: "operator",
                url,
                status: resp.status().as_u16(),
            });
        }
        resp.json().await.map_err(|source| AdapterError::Decode { service: "operator", source })
    }
}

#[cfg(test)]
#[path = "operator_tests.rs"]
mod tests;
