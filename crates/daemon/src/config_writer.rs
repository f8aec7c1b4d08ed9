// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Regenerates the multiplexer configuration file from the claimed node
//! set plus freshly fetched River BMC credentials.

use crate::errors::ConfigWriterError;
use crate::tailer::LogTailer;
use async_trait::async_trait;
use conagg_adapters::CredentialStore;
use conagg_core::node::{BmcId, NodeRecord};
use conagg_core::{NodeRegistry, RiverCredential};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Object-safe facade so [`crate::supervisor::MultiplexerSupervisor`]
/// can call back into a `ConfigWriter<C>` without itself being generic
/// over the credential store implementation.
#[async_trait]
pub trait ConfigUpdater: Send + Sync + 'static {
    async fn update(&self, force: bool) -> Result<(), ConfigWriterError>;
}

const PASSWORD_RETRY_ATTEMPTS: u32 = 15;
const PASSWORD_RETRY_SLEEP: Duration = Duration::from_secs(10);
const MARKER_PROBE_BYTES: usize = 50;
const MARKER: &str = "UPDATE_CONFIG=";

pub struct ConfigWriter<C> {
    credentials: Arc<C>,
    registry: Arc<NodeRegistry>,
    tailer: Arc<LogTailer>,
    base_template: PathBuf,
    conf_path: PathBuf,
    previous_passwords: Arc<parking_lot::Mutex<Option<HashMap<BmcId, RiverCredential>>>>,
}

impl<C> ConfigWriter<C>
where
    C: CredentialStore,
{
    pub fn new(
        credentials: Arc<C>,
        registry: Arc<NodeRegistry>,
        tailer: Arc<LogTailer>,
        base_template: PathBuf,
        conf_path: PathBuf,
        previous_passwords: Arc<parking_lot::Mutex<Option<HashMap<BmcId, RiverCredential>>>>,
    ) -> Self {
        Self { credentials, registry, tailer, base_template, conf_path, previous_passwords }
    }

    /// `force` is true only on the daemon's first supervisor iteration;
    /// thereafter the base template's own `UPDATE_CONFIG=` marker governs
    /// whether a regeneration is allowed to proceed.
    pub async fn update(&self, force: bool) -> Result<(), ConfigWriterError> {
        let registry = self.registry.lock().await;

        let mut base = std::fs::File::open(&self.base_template)
            .map_err(|source| ConfigWriterError::OpenBase { path: self.base_template.display().to_string(), source })?;

        if !force && locked_by_marker(&mut base)? {
            tracing::info!("UPDATE_CONFIG=F marker present, skipping config regeneration");
            return Ok(());
        }

        let records = registry.snapshot();
        let river_records: Vec<&NodeRecord> = records.iter().filter(|r| r.hw_class.is_river()).collect();
        let other_records: Vec<&NodeRecord> = records.iter().filter(|r| !r.hw_class.is_river()).collect();

        let passwords = self.fetch_passwords_with_retry(&river_records).await?;
        *self.previous_passwords.lock() = Some(passwords.clone());

        self.write_conf_file(&river_records, &other_records, &passwords)
            .map_err(|source| ConfigWriterError::WriteConfig { path: self.conf_path.display().to_string(), source })?;

        for record in &records {
            self.tailer.start(&record.node_id);
        }

        if !other_records.is_empty() {
            self.credentials.ensure_mountain_keys_present().await?;
        }

        Ok(())
    }

    async fn fetch_passwords_with_retry(
        &self,
        river_records: &[&NodeRecord],
    ) -> Result<HashMap<BmcId, RiverCredential>, ConfigWriterError> {
        if river_records.is_empty() {
            return Ok(HashMap::new());
        }
        let bmc_ids: Vec<BmcId> = river_records.iter().map(|r| r.bmc_id.clone()).collect();

        for attempt in 1..=PASSWORD_RETRY_ATTEMPTS {
            match self.credentials.fetch_river_passwords(&bmc_ids).await {
                Ok(passwords) if !passwords.is_empty() => return Ok(passwords),
                Ok(_) => {
                    tracing::warn!(attempt, "credential store returned no passwords yet, retrying");
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "credential store fetch failed, retrying");
                }
            }
            if attempt < PASSWORD_RETRY_ATTEMPTS {
                tokio::time::sleep(PASSWORD_RETRY_SLEEP).await;
            }
        }
        Err(ConfigWriterError::PasswordsUnavailable { attempts: PASSWORD_RETRY_ATTEMPTS })
    }

    fn write_conf_file(
        &self,
        river_records: &[&NodeRecord],
        other_records: &[&NodeRecord],
        passwords: &HashMap<BmcId, RiverCredential>,
    ) -> std::io::Result<()> {
        let mut base = std::fs::File::open(&self.base_template)?;
        let mut template = String::new();
        base.read_to_string(&mut template)?;

        let mut out = std::fs::File::options().create(true).write(true).truncate(true).open(&self.conf_path)?;
        out.write_all(template.as_bytes())?;

        for record in river_records {
            if let Some(cred) = passwords.get(&record.bmc_id) {
                writeln!(
                    out,
                    r#"console name="{}" dev="ipmi:{}" ipmiopts="U:{},P:{},W:solpayloadsize""#,
                    record.node_id, record.bmc_host, cred.username, cred.password
                )?;
            } else {
                tracing::warn!(node = %record.node_id, "no credentials available for river node, omitting from config");
            }
        }

        for record in other_records {
            writeln!(out, r#"console name="{}" dev="/usr/bin/ssh-console {}""#, record.node_id, record.node_id)?;
        }

        Ok(())
    }
}

/// Mirrors `willUpdateConfig`: read up to the first 50 bytes, and treat
/// the config as locked if the marker is present and immediately followed
/// by `F`/`f`.
fn locked_by_marker(base: &mut std::fs::File) -> Result<bool, ConfigWriterError> {
    let mut buf = [0u8; MARKER_PROBE_BYTES];
    let n = base
        .read(&mut buf)
        .map_err(|source| ConfigWriterError::OpenBase { path: "<marker probe>".to_string(), source })?;
    let probe = String::from_utf8_lossy(&buf[..n]);
    let Some(idx) = probe.find(MARKER) else {
        return Ok(false);
    };
    let after = &probe[idx + MARKER.len()..];
    Ok(matches!(after.chars().next(), Some('F') | Some('f')))
}

#[async_trait]
impl<C> ConfigUpdater for ConfigWriter<C>
where
    C: CredentialStore,
{
    async fn update(&self, force: bool) -> Result<(), ConfigWriterError> {
        ConfigWriter::update(self, force).await
    }
}

#[cfg(test)]
#[path = "config_writer_tests.rs"]
mod tests;
