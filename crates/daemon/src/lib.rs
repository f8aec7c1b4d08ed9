// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Control loops, process supervision, and HTTP surface for one
//! console-aggregator replica. `conaggd` (`src/main.rs`) wires these
//! together; everything here is independently testable against the fake
//! adapters in `conagg_adapters::test_support`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod change_monitor;
pub mod config_writer;
pub mod context;
pub mod env;
pub mod errors;
pub mod health;
pub mod heartbeater;
pub mod reconciler;
pub mod supervisor;
pub mod tailer;

pub use context::{Daemon, Paths};
