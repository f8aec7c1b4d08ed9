// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Node identity and classification.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque node identifier assigned by the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Opaque BMC identifier, distinct from [`NodeId`] since a handful of
/// River BMCs multiplex several node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BmcId(pub String);

impl BmcId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BmcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BmcId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BmcId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for BmcId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Hardware class reported by the inventory service. Wire values are
/// capitalized (`"River"`, `"Mountain"`, `"Hill"`, `"Paradise"`), matching
/// the inventory service's `Class` field verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HwClass {
    River,
    Mountain,
    Hill,
    Paradise,
}

/// The three registry buckets. Hill nodes share the Mountain bucket
/// (both use BMC-mediated ssh-console access).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    River,
    Mountain,
    Paradise,
}

impl HwClass {
    pub fn bucket(self) -> Bucket {
        match self {
            HwClass::River => Bucket::River,
            HwClass::Mountain | HwClass::Hill => Bucket::Mountain,
            HwClass::Paradise => Bucket::Paradise,
        }
    }

    pub fn is_river(self) -> bool {
        matches!(self, HwClass::River)
    }

    pub fn is_mountain(self) -> bool {
        matches!(self, HwClass::Mountain | HwClass::Hill)
    }

    pub fn is_paradise(self) -> bool {
        matches!(self, HwClass::Paradise)
    }
}

/// Everything the daemon needs to know about one claimed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub bmc_id: BmcId,
    pub bmc_host: String,
    pub hw_class: HwClass,
    pub nid: i64,
    pub role: String,
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
