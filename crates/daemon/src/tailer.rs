// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Per-node console log tailing and the single aggregated output log.
//!
//! Hand-rolled poll loop rather than an inotify-based crate: the upstream
//! behavior this replaces explicitly configures polling (`Poll: true`) so
//! it keeps working across bind-mount log directories where inotify
//! events don't reliably fire.

use conagg_core::node::NodeId;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

struct TailerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Tracks one tailed file's read position and identity, so rotation
/// (inode change) can be detected across polls.
struct TailState {
    path: PathBuf,
    file: Option<BufReader<File>>,
    inode: Option<u64>,
    /// Bytes read past the last complete line, carried across polls until
    /// a trailing `\n` arrives to complete it.
    pending: String,
}

impl TailState {
    fn new(path: PathBuf) -> Self {
        Self { path, file: None, inode: None, pending: String::new() }
    }

    /// Open (or reopen after rotation) the file, seeking to its current
    /// end on first open so only new lines are forwarded.
    fn ensure_open(&mut self) {
        if self.file.is_some() {
            return;
        }
        if let Ok(f) = File::open(&self.path) {
            if let Ok(meta) = f.metadata() {
                self.inode = Some(meta.ino());
            }
            let mut reader = BufReader::new(f);
            let _ = reader.seek(SeekFrom::End(0));
            self.file = Some(reader);
        }
    }

    /// Check whether the file at `path` has been replaced (rotated) since
    /// we opened it, and if so, force a reopen from the beginning.
    fn check_rotation(&mut self) {
        let Ok(meta) = std::fs::metadata(&self.path) else {
            return;
        };
        if self.inode.is_some() && self.inode != Some(meta.ino()) {
            self.file = None;
        }
    }

    fn read_new_lines(&mut self) -> Vec<String> {
        self.check_rotation();
        self.ensure_open();
        let Some(reader) = self.file.as_mut() else {
            return Vec::new();
        };
        let mut lines = Vec::new();
        loop {
            let mut buf = String::new();
            match reader.read_line(&mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if let Some(stripped) = buf.strip_suffix('\n') {
                        let mut full = std::mem::take(&mut self.pending);
                        full.push_str(stripped.trim_end_matches('\r'));
                        lines.push(full);
                    } else {
                        // Partial line (no trailing \n yet): persist what
                        // was read so far and retry from here next poll.
                        self.pending.push_str(&buf);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        lines
    }
}

/// Single append-only aggregated console log, guarded by a brief
/// synchronous lock (never held across an `.await`).
pub struct AggregatedLog {
    path: PathBuf,
    file: SyncMutex<Option<File>>,
}

impl AggregatedLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path, file: SyncMutex::new(None) }
    }

    /// (Re)open the log file, truncating it, used at startup and whenever
    /// the MultiplexerSupervisor triggers a rotation-driven respin.
    pub fn respin(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let f = File::options().create(true).write(true).truncate(true).open(&self.path)?;
        *self.file.lock() = Some(f);
        Ok(())
    }

    pub fn write_node_line(&self, node_id: &NodeId, line: &str) {
        self.write_raw_line(&format!("console.hostname: {node_id} {line}"));
    }

    pub fn write_raw_line(&self, line: &str) {
        let mut guard = self.file.lock();
        if let Some(f) = guard.as_mut() {
            let _ = writeln!(f, "{line}");
        }
    }
}

/// Per-node tailers plus the shared aggregated log they write into.
pub struct LogTailer {
    console_log_dir: PathBuf,
    tailers: SyncMutex<HashMap<NodeId, TailerHandle>>,
    aggregated: std::sync::Arc<AggregatedLog>,
}

impl LogTailer {
    pub fn new(console_log_dir: PathBuf, aggregated: std::sync::Arc<AggregatedLog>) -> Self {
        Self { console_log_dir, tailers: SyncMutex::new(HashMap::new()), aggregated }
    }

    /// Idempotently start tailing a node's console log file. No-op if
    /// already tailing.
    pub fn start(&self, node_id: &NodeId) -> bool {
        if self.tailers.lock().contains_key(node_id) {
            return false;
        }
        let path = self.console_log_dir.join(format!("console.{}", node_id.as_str()));
        let cancel = CancellationToken::new();
        let child_cancel = cancel.clone();
        let aggregated = self.aggregated.clone();
        let node_id_owned = node_id.clone();
        let join = tokio::spawn(async move {
            let mut state = TailState::new(path);
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            loop {
                tokio::select! {
                    _ = child_cancel.cancelled() => {
                        tracing::debug!(node = %node_id_owned, "tail task exiting gracefully");
                        return;
                    }
                    _ = interval.tick() => {
                        for line in state.read_new_lines() {
                            aggregated.write_node_line(&node_id_owned, &line);
                        }
                    }
                }
            }
        });
        self.tailers.lock().insert(node_id.clone(), TailerHandle { cancel, join });
        true
    }

    /// Stop tailing a node, cancelling its poll task.
    pub fn stop(&self, node_id: &NodeId) {
        if let Some(handle) = self.tailers.lock().remove(node_id) {
            handle.cancel.cancel();
            handle.join.abort();
        } else {
            tracing::debug!(node = %node_id, "stop_tailing: node was not being tailed");
        }
    }

    pub fn stop_all(&self) {
        let handles: Vec<_> = self.tailers.lock().drain().collect();
        for (_, handle) in handles {
            handle.cancel.cancel();
            handle.join.abort();
        }
    }

    pub fn is_tailing(&self, node_id: &NodeId) -> bool {
        self.tailers.lock().contains_key(node_id)
    }

    /// Recreate the aggregated log file (called after SIGHUP-triggered
    /// log rotation).
    pub fn respin_aggregate_log(&self) -> std::io::Result<()> {
        self.aggregated.respin()
    }

    /// Forward a line from conmand's own stdout/stderr pipe into the
    /// aggregated log, unprefixed.
    pub fn log_pipe_line(&self, line: &str) {
        self.aggregated.write_raw_line(line);
    }
}

#[cfg(test)]
#[path = "tailer_tests.rs"]
mod tests;
