use super::*;
use conagg_adapters::test_support::FakeInventoryClient;
use conagg_core::node::{Bucket, HwClass};
use conagg_core::test_support::node_record;
use conagg_core::FakeClock;
use std::sync::Arc;
use tempfile::tempdir;

fn new_heartbeater(
    inventory: Arc<FakeInventoryClient>,
    registry: Arc<NodeRegistry>,
) -> (Heartbeater<FakeInventoryClient, FakeClock>, Arc<LogTailer>) {
    let dir = tempdir().expect("tempdir");
    let agg = Arc::new(crate::tailer::AggregatedLog::new(dir.path().join("agg.log")));
    let tailer = Arc::new(LogTailer::new(dir.path().to_path_buf(), agg));
    let supervisor =
        Arc::new(crate::supervisor::MultiplexerSupervisor::new(dir.path().join("conman.conf"), tailer.clone()));
    let last_heartbeat = Arc::new(RwLock::new(None));
    let hb = Heartbeater::new(
        inventory,
        registry,
        tailer.clone(),
        supervisor,
        FakeClock::new(),
        last_heartbeat,
        "pod-0".into(),
    );
    (hb, tailer)
}

#[tokio::test]
async fn heartbeat_records_timestamp_before_dispatching() {
    let inventory = Arc::new(FakeInventoryClient::new());
    let registry = Arc::new(NodeRegistry::new());
    let (hb, _tailer) = new_heartbeater(inventory, registry);

    assert!(hb.last_heartbeat.read().is_none());
    hb.heartbeat_once().await.expect("heartbeat");
    assert!(hb.last_heartbeat.read().is_some());
}

#[tokio::test]
async fn dropped_nodes_are_removed_and_tailer_stopped() {
    let inventory = Arc::new(FakeInventoryClient::new());
    let dropped = node_record("nA", HwClass::River);
    inventory.heartbeat_dropped.lock().push_back(vec![dropped.clone()]);

    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(dropped.clone());

    let (hb, tailer) = new_heartbeater(inventory, registry.clone());
    tailer.start(&dropped.node_id);
    assert!(tailer.is_tailing(&dropped.node_id));

    hb.heartbeat_once().await.expect("heartbeat");

    assert_eq!(registry.lock().await.count(Bucket::River), 0);
    assert!(!tailer.is_tailing(&dropped.node_id));
}

#[tokio::test]
async fn empty_dropped_list_is_a_noop() {
    let inventory = Arc::new(FakeInventoryClient::new());
    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(node_record("nA", HwClass::River));
    let (hb, _tailer) = new_heartbeater(inventory, registry.clone());

    hb.heartbeat_once().await.expect("heartbeat");

    assert_eq!(registry.lock().await.count(Bucket::River), 1);
}
