//! Tests for the telemetry state file

use super::*;
use tempfile::TempDir;

const ID: &str = "0b4ad0a4-5a0c-4a2f-9a40-2f8e1f7bcb5e";

#[test]
fn test_load_missing_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let state = TelemetryState::load(&temp_dir.path().join("telemetry_uuid")).unwrap();
    assert!(state.is_empty());
}

#[test]
fn test_load_directory_is_storage_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = TelemetryState::load(temp_dir.path());
    assert!(matches!(result, Err(TelemetryError::Storage { .. })));
}

#[test]
fn test_parse_trims_both_sides() {
    let state = TelemetryState::parse(&format!("  instanceId :  {ID}  \nPRODUCT_FAMILY_PS:1\n"));
    assert_eq!(state.instance_id(), Some(ID));
    assert_eq!(state.get("PRODUCT_FAMILY_PS"), Some("1"));
    assert_eq!(state.len(), 2);
}

#[test]
fn test_parse_skips_empty_keys() {
    let state = TelemetryState::parse("\n   \n:orphan\n  : also orphan\nPRODUCT_FAMILY_PXC:1\n");
    assert_eq!(state.len(), 1);
    assert_eq!(state.get("PRODUCT_FAMILY_PXC"), Some("1"));
}

#[test]
fn test_parse_keeps_malformed_lines() {
    let state = TelemetryState::parse("no separator here\nurl:https://example.com:8443/x\n");
    assert_eq!(state.get("no separator here"), Some(""));
    // Only the first colon separates key from value
    assert_eq!(state.get("url"), Some("https://example.com:8443/x"));
}

#[test]
fn test_parse_last_duplicate_wins() {
    let state = TelemetryState::parse("PRODUCT_FAMILY_PS:1\nPRODUCT_FAMILY_PS:2\n");
    assert_eq!(state.get("PRODUCT_FAMILY_PS"), Some("2"));
}

#[test]
fn test_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("telemetry_uuid");

    let mut state = TelemetryState::new();
    state.insert(INSTANCE_ID_KEY, ID);
    state.mark_reported("PRODUCT_FAMILY_PS");
    state.mark_reported("PRODUCT_FAMILY_PBM");
    state.save(&path).unwrap();

    let loaded = TelemetryState::load(&path).unwrap();
    assert_eq!(loaded, state);
}

#[test]
fn test_save_overwrites_previous_content() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("telemetry_uuid");
    fs::write(&path, "stale:entry\nPRODUCT_FAMILY_PS:1\n").unwrap();

    let mut state = TelemetryState::new();
    state.insert(INSTANCE_ID_KEY, ID);
    state.save(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, format!("instanceId:{ID}\n"));
}

#[cfg(unix)]
#[test]
fn test_save_keeps_existing_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("telemetry_uuid");
    fs::write(&path, format!("instanceId:{ID}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

    let mut state = TelemetryState::load(&path).unwrap();
    state.mark_reported("PRODUCT_FAMILY_PS");
    state.save(&path).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
}

#[cfg(unix)]
#[test]
fn test_save_new_file_is_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("telemetry_uuid");

    TelemetryState::parse("a:1\n").save(&path).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
}

#[test]
fn test_save_leaves_no_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("telemetry_uuid");

    TelemetryState::parse("a:1\nb:2\n").save(&path).unwrap();

    let files: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_save_into_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing").join("telemetry_uuid");

    let result = TelemetryState::new().save(&path);
    assert!(matches!(result, Err(TelemetryError::Storage { .. })));
}

#[test]
fn test_reported_families_excludes_instance_id() {
    let state = TelemetryState::parse(&format!("instanceId:{ID}\nA:1\nB:1\n"));
    let families: Vec<_> = state.reported_families().collect();
    assert_eq!(families, vec!["A", "B"]);
}

#[test]
fn test_probe_creates_directory_and_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("percona").join("telemetry_uuid");

    probe_writable(&path).unwrap();

    assert!(path.exists());
    assert!(TelemetryState::load(&path).unwrap().is_empty());
}

#[test]
fn test_probe_appends_harmless_line() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("telemetry_uuid");
    let original = format!("instanceId:{ID}\nPRODUCT_FAMILY_PS:1\n");
    fs::write(&path, &original).unwrap();

    probe_writable(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with(&original));
    assert!(content.len() > original.len());
    assert_eq!(
        TelemetryState::load(&path).unwrap(),
        TelemetryState::parse(&original)
    );
}

#[test]
fn test_probe_fails_when_parent_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let result = probe_writable(&blocker.join("telemetry_uuid"));
    assert!(matches!(result, Err(TelemetryError::Storage { .. })));
}
