// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! HTTP clients for the external services this pod depends on: inventory
//! (hardware claims), operator (fleet-wide targets), and credentials
//! (BMC passwords and SSH key provisioning).

pub mod credential;
pub mod errors;
pub mod inventory;
pub mod operator;

#[cfg(feature = "test-support")]
pub mod test_support;

pub use credential::{CredentialStore, HttpCredentialStore};
pub use errors::AdapterError;
pub use inventory::{HttpInventoryClient, InventoryClient};
pub use operator::{HttpOperatorClient, OperatorClient};
