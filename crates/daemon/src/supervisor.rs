// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Supervises the `conmand` child process: starts it, restarts it on
//! exit, and relays restart/reload signals requested by the other
//! control loops.

use crate::config_writer::ConfigUpdater;
use crate::errors::SupervisorError;
use crate::tailer::LogTailer;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

const NO_NODES_PAUSE: Duration = Duration::from_secs(30);
const EXIT_PAUSE: Duration = Duration::from_secs(15);
const BETWEEN_ITERATIONS_PAUSE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SupervisorState {
    Idle,
    Running(i32),
    Stopping,
}

/// Owns the lifecycle of the `conmand` child process. A separate
/// `run_loop` task holds the actual `tokio::process::Child`; other tasks
/// signal it by PID via [`MultiplexerSupervisor::signal_restart`] /
/// [`signal_reload`], since `Child` isn't `Clone` and can't be shared
/// directly with callers that just want to send a signal.
pub struct MultiplexerSupervisor {
    state: Mutex<SupervisorState>,
    conf_path: PathBuf,
    tailer: Arc<LogTailer>,
    first_iteration: AtomicBool,
}

impl MultiplexerSupervisor {
    pub fn new(conf_path: PathBuf, tailer: Arc<LogTailer>) -> Self {
        Self { state: Mutex::new(SupervisorState::Idle), conf_path, tailer, first_iteration: AtomicBool::new(true) }
    }

    /// Send SIGTERM to the running conmand, if any, forcing a full
    /// reconfiguration and restart.
    pub fn signal_restart(&self) -> Result<(), SupervisorError> {
        self.signal(Signal::SIGTERM)
    }

    /// Send SIGHUP to the running conmand, if any, telling it to
    /// re-open its log files (used after log rotation).
    pub fn signal_reload(&self) -> Result<(), SupervisorError> {
        self.signal(Signal::SIGHUP)
    }

    fn signal(&self, sig: Signal) -> Result<(), SupervisorError> {
        let pid = match *self.state.lock() {
            SupervisorState::Running(pid) => pid,
            _ => {
                tracing::warn!("attempted to signal conmand process when not running");
                return Ok(());
            }
        };
        signal::kill(Pid::from_raw(pid), sig).map_err(|source| SupervisorError::Signal { pid, source })
    }

    /// Run forever: regenerate the config, start conmand, wait for it to
    /// exit, and restart, pausing between iterations. `has_nodes` is
    /// polled from the caller before each start attempt since running
    /// conmand with zero nodes configured is pointless. `force` is passed
    /// to the config writer only on this supervisor's first iteration;
    /// thereafter the base template's own marker governs skipping.
    pub async fn run_loop(
        self: Arc<Self>,
        config_writer: Arc<dyn ConfigUpdater>,
        has_nodes: impl Fn() -> bool + Send + Sync + 'static,
        shutdown: CancellationToken,
    ) {
        loop {
            if shutdown.is_cancelled() {
                return;
            }

            let force = self.first_iteration.swap(false, Ordering::SeqCst);
            if let Err(e) = config_writer.update(force).await {
                tracing::error!(error = %e, "config write failed, aborting");
                return;
            }

            if !has_nodes() {
                tracing::info!("no console nodes claimed yet, deferring conmand start");
                if Self::sleep_or_shutdown(NO_NODES_PAUSE, &shutdown).await {
                    return;
                }
                continue;
            }

            match self.spawn_and_wait(&shutdown).await {
                Ok(()) => {}
                Err(e) => {
                    tracing::error!(error = %e, "conmand exited with error");
                    if Self::sleep_or_shutdown(EXIT_PAUSE, &shutdown).await {
                        return;
                    }
                }
            }

            if Self::sleep_or_shutdown(BETWEEN_ITERATIONS_PAUSE, &shutdown).await {
                return;
            }
        }
    }

    async fn sleep_or_shutdown(d: Duration, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(d) => false,
            _ = shutdown.cancelled() => true,
        }
    }

    async fn spawn_and_wait(&self, shutdown: &CancellationToken) -> Result<(), SupervisorError> {
        tracing::info!("starting a new instance of conmand");
        let mut child = Command::new("conmand")
            .arg("-F")
            .arg("-v")
            .arg("-c")
            .arg(&self.conf_path)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(SupervisorError::Spawn)?;

        let pid = child.id().map(|p| p as i32);
        if let Some(pid) = pid {
            *self.state.lock() = SupervisorState::Running(pid);
        }

        if let Some(stdout) = child.stdout.take() {
            let tailer = self.tailer.clone();
            tokio::spawn(Self::log_pipe_task(stdout, tailer, "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            let tailer = self.tailer.clone();
            tokio::spawn(Self::log_pipe_task(stderr, tailer, "stderr"));
        }

        let wait_result = tokio::select! {
            result = child.wait() => Some(result),
            _ = shutdown.cancelled() => {
                tracing::info!("shutdown requested, sending SIGTERM to conmand");
                *self.state.lock() = SupervisorState::Stopping;
                if let Some(pid) = pid {
                    let _ = signal::kill(Pid::from_raw(pid), Signal::SIGTERM);
                }
                Some(child.wait().await)
            }
        };

        *self.state.lock() = SupervisorState::Idle;
        tracing::info!("conmand process has exited");

        match wait_result {
            Some(Ok(status)) if status.success() => Ok(()),
            Some(Ok(status)) => {
                Err(SupervisorError::Spawn(std::io::Error::other(format!("conmand exited: {status}"))))
            }
            Some(Err(e)) => Err(SupervisorError::Spawn(e)),
            None => Ok(()),
        }
    }

    async fn log_pipe_task(
        pipe: impl tokio::io::AsyncRead + Unpin,
        tailer: Arc<LogTailer>,
        desc: &'static str,
    ) {
        tracing::debug!(desc, "starting log of conmand output");
        let mut lines = BufReader::new(pipe).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => tailer.log_pipe_line(&line),
                Ok(None) | Err(_) => {
                    tracing::debug!(desc, "conmand pipe closed");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
