use super::*;

#[test]
fn mountain_key_paths_join_key_dir() {
    let store = HttpCredentialStore::new("http://cray-console-data/v1", "/etc/conman-keys");
    let (private, public) = store.mountain_key_paths();
    assert_eq!(private, std::path::PathBuf::from("/etc/conman-keys/ssh-console"));
    assert_eq!(public, std::path::PathBuf::from("/etc/conman-keys/ssh-console.pub"));
}

#[test]
fn password_entry_decodes_from_wire_shape() {
    let body = serde_json::json!({"xname": "x3000c0s1b0", "username": "root", "password": "hunter2"});
    let parsed: PasswordEntry = serde_json::from_value(body).expect("decode");
    assert_eq!(parsed.xname, "x3000c0s1b0");
    assert_eq!(parsed.password, "hunter2");
}
