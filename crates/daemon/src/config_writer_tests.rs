use super::*;
use conagg_adapters::test_support::FakeCredentialStore;
use conagg_core::node::{HwClass, NodeId};
use conagg_core::test_support::node_record;
use tempfile::tempdir;

fn new_writer(
    dir: &tempfile::TempDir,
    credentials: Arc<FakeCredentialStore>,
    registry: Arc<NodeRegistry>,
) -> ConfigWriter<FakeCredentialStore> {
    let base = dir.path().join("base.conf");
    if !base.exists() {
        std::fs::write(&base, "# base template\n").expect("write base");
    }
    let agg = Arc::new(crate::tailer::AggregatedLog::new(dir.path().join("agg.log")));
    let tailer = Arc::new(LogTailer::new(dir.path().to_path_buf(), agg));
    ConfigWriter::new(
        credentials,
        registry,
        tailer,
        base,
        dir.path().join("conman.conf"),
        Arc::new(parking_lot::Mutex::new(None)),
    )
}

// S1 — cold start, claim two River nodes.
#[tokio::test]
async fn emits_ipmi_lines_for_river_nodes() {
    let dir = tempdir().expect("tempdir");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));
    credentials
        .passwords
        .lock()
        .insert(BmcId::new("nA-bmc"), RiverCredential { username: "u1".into(), password: "p1".into() });
    credentials
        .passwords
        .lock()
        .insert(BmcId::new("nB-bmc"), RiverCredential { username: "u2".into(), password: "p2".into() });

    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(node_record("nA", HwClass::River));
    registry.lock().await.insert(node_record("nB", HwClass::River));

    let writer = new_writer(&dir, credentials, registry);
    writer.update(true).await.expect("update");

    let contents = std::fs::read_to_string(dir.path().join("conman.conf")).expect("read conf");
    assert!(contents.contains(r#"console name="nA" dev="ipmi:nA-bmc.local" ipmiopts="U:u1,P:p1,W:solpayloadsize""#));
    assert!(contents.contains(r#"console name="nB" dev="ipmi:nB-bmc.local" ipmiopts="U:u2,P:p2,W:solpayloadsize""#));
    assert!(contents.starts_with("# base template"));
}

#[tokio::test]
async fn emits_ssh_console_lines_for_mountain_nodes() {
    let dir = tempdir().expect("tempdir");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));
    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(node_record("mA", HwClass::Mountain));

    let writer = new_writer(&dir, credentials.clone(), registry);
    writer.update(true).await.expect("update");

    let contents = std::fs::read_to_string(dir.path().join("conman.conf")).expect("read conf");
    assert!(contents.contains(r#"console name="mA" dev="/usr/bin/ssh-console mA""#));
    assert_eq!(*credentials.ensure_calls.lock(), 1);
}

// S4 — base template locked with `UPDATE_CONFIG=F`.
#[tokio::test]
async fn locked_marker_prevents_unforced_regeneration() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("base.conf"), "# UPDATE_CONFIG=F\n").expect("write base");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));
    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(node_record("mA", HwClass::Mountain));

    let writer = new_writer(&dir, credentials, registry);
    writer.update(true).await.expect("forced first pass");
    assert!(dir.path().join("conman.conf").exists());

    std::fs::remove_file(dir.path().join("conman.conf")).expect("remove");
    writer.update(false).await.expect("unforced pass skips");
    assert!(!dir.path().join("conman.conf").exists(), "marker should have blocked regeneration");
}

#[tokio::test]
async fn marker_with_lowercase_f_also_locks() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("base.conf"), "UPDATE_CONFIG=f\n").expect("write base");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));
    let registry = Arc::new(NodeRegistry::new());

    let writer = new_writer(&dir, credentials, registry);
    writer.update(false).await.expect("unforced pass skips");
    assert!(!dir.path().join("conman.conf").exists());
}

#[tokio::test]
async fn marker_absent_allows_regeneration() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("base.conf"), "# no marker here\n").expect("write base");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));
    let registry = Arc::new(NodeRegistry::new());

    let writer = new_writer(&dir, credentials, registry);
    writer.update(false).await.expect("update");
    assert!(dir.path().join("conman.conf").exists());
}

#[tokio::test]
async fn update_starts_tailers_for_all_claimed_nodes() {
    let dir = tempdir().expect("tempdir");
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().to_path_buf()));
    credentials
        .passwords
        .lock()
        .insert(BmcId::new("nA-bmc"), RiverCredential { username: "u".into(), password: "p".into() });
    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(node_record("nA", HwClass::River));

    let writer = new_writer(&dir, credentials, registry);
    writer.update(true).await.expect("update");
    assert!(writer.tailer.is_tailing(&NodeId::new("nA")));
}
