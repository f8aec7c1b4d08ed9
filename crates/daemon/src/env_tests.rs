use super::*;
use serial_test::serial;

#[test]
#[serial]
fn clamps_below_range_to_minimum() {
    std::env::set_var("HEARTBEAT_SEND_FREQ_SEC", "1");
    assert_eq!(heartbeat_send_freq(), Duration::from_secs(5));
    std::env::remove_var("HEARTBEAT_SEND_FREQ_SEC");
}

#[test]
#[serial]
fn clamps_above_range_to_maximum() {
    std::env::set_var("HEARTBEAT_SEND_FREQ_SEC", "10000");
    assert_eq!(heartbeat_send_freq(), Duration::from_secs(300));
    std::env::remove_var("HEARTBEAT_SEND_FREQ_SEC");
}

#[test]
#[serial]
fn unset_uses_default() {
    std::env::remove_var("HEARTBEAT_SEND_FREQ_SEC");
    assert_eq!(heartbeat_send_freq(), Duration::from_secs(30));
}

#[test]
#[serial]
fn unparseable_uses_default() {
    std::env::set_var("NODE_UPDATE_FREQ_SEC", "not-a-number");
    assert_eq!(node_update_freq(), Duration::from_secs(30));
    std::env::remove_var("NODE_UPDATE_FREQ_SEC");
}

#[test]
#[serial]
fn log_level_maps_fatal_and_panic_to_error() {
    std::env::set_var("LOG_LEVEL", "fatal");
    assert_eq!(log_filter_directive(), "error");
    std::env::set_var("LOG_LEVEL", "PANIC");
    assert_eq!(log_filter_directive(), "error");
    std::env::remove_var("LOG_LEVEL");
}

#[test]
#[serial]
fn log_level_defaults_to_info() {
    std::env::remove_var("LOG_LEVEL");
    assert_eq!(log_filter_directive(), "info");
}

#[test]
#[serial]
fn health_bind_addr_defaults_to_8080() {
    std::env::remove_var("HEALTH_PORT");
    assert_eq!(health_bind_addr().port(), 8080);
}

#[test]
#[serial]
fn health_bind_addr_reads_port_override() {
    std::env::set_var("HEALTH_PORT", "9100");
    assert_eq!(health_bind_addr().port(), 9100);
    std::env::remove_var("HEALTH_PORT");
}
