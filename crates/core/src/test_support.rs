// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

//! Builders and proptest strategies shared by other crates' test suites.

use crate::node::{BmcId, HwClass, NodeId, NodeRecord};
use proptest::prelude::*;

pub fn node_record(id: &str, class: HwClass) -> NodeRecord {
    NodeRecord {
        node_id: NodeId::new(id),
        bmc_id: BmcId::new(format!("{id}-bmc")),
        bmc_host: format!("{id}-bmc.local"),
        hw_class: class,
        nid: 1,
        role: "Compute".into(),
    }
}

pub fn arb_hw_class() -> impl Strategy<Value = HwClass> {
    prop_oneof![
        Just(HwClass::River),
        Just(HwClass::Mountain),
        Just(HwClass::Hill),
        Just(HwClass::Paradise),
    ]
}

pub fn arb_node_record() -> impl Strategy<Value = NodeRecord> {
    ("[a-z0-9]{8,12}", arb_hw_class()).prop_map(|(id, class)| node_record(&id, class))
}
