use super::*;
use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;

use crate::context::{Daemon, Paths};
use crate::reconciler::Reconciler;
use conagg_adapters::test_support::{FakeCredentialStore, FakeInventoryClient, FakeOperatorClient};
use conagg_core::node::HwClass;
use conagg_core::test_support::node_record;
use conagg_core::{FakeClock, NodeRegistry, PodLocation};

struct FakeSource;

#[async_trait::async_trait]
impl HealthSource for FakeSource {
    fn health_snapshot(&self) -> HealthSnapshot {
        HealthSnapshot { target_river: 3, target_mountain: 2, last_heartbeat: Some("2026-01-01T00:00:00Z".into()) }
    }

    async fn claimed_counts(&self) -> (usize, usize) {
        (3, 1)
    }
}

#[tokio::test]
async fn health_returns_expected_fields() {
    let app = router(Arc::new(FakeSource));
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn liveness_returns_no_content() {
    let app = router(Arc::new(FakeSource));
    let resp = app
        .oneshot(Request::builder().uri("/liveness").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// Exercises the real `Daemon` (not `FakeSource`) end to end: the
// reconciler stores its computed ideal share into the daemon's atomics,
// and the health body must reflect that, not a hardcoded value.
#[tokio::test]
async fn health_reflects_reconciler_computed_targets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let agg = Arc::new(crate::tailer::AggregatedLog::new(dir.path().join("agg.log")));
    let tailer = Arc::new(crate::tailer::LogTailer::new(dir.path().to_path_buf(), agg));
    let supervisor =
        Arc::new(crate::supervisor::MultiplexerSupervisor::new(dir.path().join("conman.conf"), tailer.clone()));
    let registry = Arc::new(NodeRegistry::new());
    registry.lock().await.insert(node_record("r1", HwClass::River));

    let inventory = Arc::new(FakeInventoryClient::new());
    let operator = Arc::new(FakeOperatorClient::default());
    operator.current_targets.lock().total_river_nodes = 5; // ideal = 5/1 + 1 = 6
    operator.current_targets.lock().total_mountain_nodes = 11; // ideal = 11/1 + 1 = 12
    let credentials = Arc::new(FakeCredentialStore::new(dir.path().join("keys")));

    let daemon = Arc::new(Daemon::new(
        "pod-0".into(),
        PodLocation { pod_name: "cray-console-node-0".into(), alias: "0".into(), xname: "x3000c0s1b0".into() },
        Paths {
            base_conf_template: dir.path().join("base.conf"),
            conf_path: dir.path().join("conman.conf"),
            console_log_dir: dir.path().to_path_buf(),
            aggregated_log_path: dir.path().join("agg.log"),
            target_node_file: dir.path().join("TargetNodes.txt"),
        },
        registry.clone(),
        tailer.clone(),
        supervisor.clone(),
        inventory.clone(),
        operator.clone(),
        credentials,
        FakeClock::new(),
    ));

    let reconciler = Reconciler::new(
        inventory,
        operator,
        registry,
        supervisor,
        tailer,
        "pod-0".into(),
        "0".into(),
        "x3000c0s1b0".into(),
        dir.path().join("TargetNodes.txt"),
        200,
        200,
        daemon.target_river.clone(),
        daemon.target_mountain.clone(),
    );
    reconciler.reconcile_once().await.expect("reconcile");

    let app = router(daemon);
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(json["target_rvr"], "6");
    assert_eq!(json["target_mtn"], "12");
}

#[tokio::test]
async fn non_get_returns_405_with_allow_header() {
    let app = router(Arc::new(FakeSource));
    let resp = app
        .oneshot(Request::builder().method("POST").uri("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers().get("allow").expect("allow header"), "GET");
}
