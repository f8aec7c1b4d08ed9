// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Client for the credential store: River BMC passwords and Mountain
//! ssh-console keypair provisioning.

use crate::errors::AdapterError;
use async_trait::async_trait;
use conagg_core::node::BmcId;
use conagg_core::RiverCredential;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Single-shot password lookup for the given BMC xnames. Callers that
    /// need retries (config writing) loop over this themselves; this
    /// method never retries so it never blocks the caller's lock holder
    /// longer than one round trip (mirrors `getPasswords`, the no-retry
    /// sibling of `getPasswordsWithRetries`).
    async fn fetch_river_passwords(
        &self,
        bmc_xnames: &[BmcId],
    ) -> Result<HashMap<BmcId, RiverCredential>, AdapterError>;

    /// Block (async) until a Mountain ssh-console keypair exists on disk
    /// and on the Mountain BMCs, provisioning one if necessary.
    async fn ensure_mountain_keys_present(&self) -> Result<(), AdapterError>;

    /// Local filesystem paths of the (private, public) Mountain keypair,
    /// used by `ChangeMonitor` to hash the files for rotation detection.
    fn mountain_key_paths(&self) -> (PathBuf, PathBuf);
}

pub struct HttpCredentialStore {
    client: reqwest::Client,
    base_url: String,
    private_key_path: PathBuf,
    public_key_path: PathBuf,
}

impl HttpCredentialStore {
    pub fn new(base_url: impl Into<String>, key_dir: impl AsRef<Path>) -> Self {
        let key_dir = key_dir.as_ref();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            private_key_path: key_dir.join("ssh-console"),
            public_key_path: key_dir.join("ssh-console.pub"),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct PasswordEntry {
    xname: String,
    username: String,
    password: String,
}

#[async_trait]
impl CredentialStore for HttpCredentialStore {
    async fn fetch_river_passwords(
        &self,
        bmc_xnames: &[BmcId],
    ) -> Result<HashMap<BmcId, RiverCredential>, AdapterError> {
        let url = format!("{}/credentials/bmc", self.base_url);
        let xnames: Vec<&str> = bmc_xnames.iter().map(BmcId::as_str).collect();
        let resp = self
            .client
            .post(&url)
            .json(&xnames)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url: url.clone(), source })?;
        if !resp.status().is_success() {
            return Err(AdapterError::UnexpectedStatus {
                service: "credentials",
                url,
                status: resp.status().as_u16(),
            });
        }
        let entries: Vec<PasswordEntry> =
            resp.json().await.map_err(|source| AdapterError::Decode { service: "credentials", source })?;
        Ok(entries
            .into_iter()
            .map(|e| (BmcId::new(e.xname), RiverCredential { username: e.username, password: e.password }))
            .collect())
    }

    async fn ensure_mountain_keys_present(&self) -> Result<(), AdapterError> {
        let url = format!("{}/credentials/mountain-keys/ensure", self.base_url);
        self.client
            .post(&url)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url, source })?;
        Ok(())
    }

    fn mountain_key_paths(&self) -> (PathBuf, PathBuf) {
        (self.private_key_path.clone(), self.public_key_path.clone())
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
