use super::*;

#[test]
fn acquire_request_serializes_with_lowercase_keys() {
    let req = AcquireRequest { nummtn: 3, numrvr: 7, alias: "0", xname: "x3000c0s1b0" };
    let json = serde_json::to_value(&req).expect("serialize");
    assert_eq!(json["nummtn"], 3);
    assert_eq!(json["numrvr"], 7);
    assert_eq!(json["xname"], "x3000c0s1b0");
}

#[test]
fn url_joins_base_and_path() {
    let client = HttpInventoryClient::new("http://cray-console-data/v1");
    assert_eq!(client.url("/activepods"), "http://cray-console-data/v1/activepods");
}

#[test]
fn active_pod_count_response_decodes() {
    let body = serde_json::json!({"count": 4});
    let parsed: ActivePodCountResponse = serde_json::from_value(body).expect("decode");
    assert_eq!(parsed.count, 4);
}
