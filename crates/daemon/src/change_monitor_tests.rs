use super::*;
use conagg_adapters::test_support::FakeCredentialStore;
use conagg_core::node::HwClass;
use conagg_core::test_support::node_record;
use tempfile::tempdir;

fn new_monitor(
    credentials: Arc<FakeCredentialStore>,
    registry: Arc<NodeRegistry>,
) -> (
    ChangeMonitor<FakeCredentialStore>,
    Arc<parking_lot::Mutex<Option<HashMap<BmcId, RiverCredential>>>>,
    Arc<parking_lot::Mutex<Option<KeyDigests>>>,
) {
    let dir = tempdir().expect("tempdir");
    let agg = Arc::new(crate::tailer::AggregatedLog::new(dir.path().join("agg.log")));
    let tailer = Arc::new(crate::tailer::LogTailer::new(dir.path().to_path_buf(), agg));
    let supervisor =
        Arc::new(crate::supervisor::MultiplexerSupervisor::new(dir.path().join("conman.conf"), tailer));
    let previous_passwords = Arc::new(parking_lot::Mutex::new(None));
    let previous_key_digests = Arc::new(parking_lot::Mutex::new(None));
    let monitor = ChangeMonitor::new(
        credentials,
        registry,
        supervisor,
        previous_passwords.clone(),
        previous_key_digests.clone(),
    );
    (monitor, previous_passwords, previous_key_digests)
}

#[tokio::test]
async fn first_observation_never_signals_changed() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("ssh-console"), b"priv-v1").expect("write");
    std::fs::write(dir.path().join("ssh-console.pub"), b"pub-v1").expect("write");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));
    credentials.passwords.lock().insert(BmcId::new("nA-bmc"), RiverCredential { username: "u".into(), password: "p".into() });

    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(node_record("nA", HwClass::River));
    registry.lock().await.insert(node_record("nM", HwClass::Mountain));

    let (monitor, _pw, digests) = new_monitor(credentials, registry);
    monitor.check_once().await.expect("check");

    // Key digests get primed on first observation but must not have
    // triggered a restart signal; password comparison is skipped entirely
    // since previous_passwords starts as None (ConfigWriter hasn't primed it).
    assert!(digests.lock().is_some());
}

#[tokio::test]
async fn password_rotation_is_detected_once_primed() {
    let dir = tempdir().expect("tempdir");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));
    let bmc = BmcId::new("nA-bmc");
    credentials.passwords.lock().insert(bmc.clone(), RiverCredential { username: "u".into(), password: "p2".into() });

    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(node_record("nA", HwClass::River));

    let (monitor, previous_passwords, _digests) = new_monitor(credentials, registry);
    let mut primed = HashMap::new();
    primed.insert(bmc, RiverCredential { username: "u".into(), password: "p1".into() });
    *previous_passwords.lock() = Some(primed);

    monitor.check_once().await.expect("check");
    // change detection doesn't itself mutate previous_passwords (ConfigWriter
    // owns the write side) so we only assert it didn't error; the restart
    // signal path is covered indirectly via supervisor state in practice.
}

#[tokio::test]
async fn key_rotation_is_detected_on_second_pass() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("ssh-console"), b"priv-v1").expect("write");
    std::fs::write(dir.path().join("ssh-console.pub"), b"pub-v1").expect("write");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));

    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(node_record("nM", HwClass::Mountain));

    let (monitor, _pw, digests) = new_monitor(credentials, registry);
    monitor.check_once().await.expect("first pass");
    let first = digests.lock().clone().expect("primed");

    std::fs::write(dir.path().join("ssh-console"), b"priv-v2").expect("rewrite");
    monitor.check_once().await.expect("second pass");
    let second = digests.lock().clone().expect("updated");

    assert_ne!(first.private, second.private);
}

#[tokio::test]
async fn no_river_or_mountain_nodes_is_a_noop() {
    let dir = tempdir().expect("tempdir");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));
    let registry = Arc::new(NodeRegistry::new());
    let (monitor, _pw, digests) = new_monitor(credentials, registry);

    monitor.check_once().await.expect("check");
    assert!(digests.lock().is_none());
}
