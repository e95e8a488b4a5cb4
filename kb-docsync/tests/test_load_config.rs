use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use kb_docsync::load_config::{
    load_config, COZE_TOKEN_VAR, DATASET_ID_VAR, GITHUB_TOKEN_VAR, TEST_DATASET_ID_VAR,
};

fn set_required_env() {
    env::set_var(GITHUB_TOKEN_VAR, "ghp-test-token");
    env::set_var(COZE_TOKEN_VAR, "pat-test-token");
    env::set_var(DATASET_ID_VAR, "7400000000000000001");
    env::set_var(TEST_DATASET_ID_VAR, "7400000000000000002");
}

/// A static config file plus the required env vars produce a complete SyncConfig.
#[tokio::test]
#[serial]
async fn test_load_config_success_injects_env() {
    let config_yaml = r#"
repo:
  owner: alibaba
  name: formily
  branch: v2
snapshot_path: ./tmp/valid_path_list.json
name_prefix: formily_docs
endpoints:
  knowledge_base: "http://127.0.0.1:9000"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();
    set_required_env();

    let config = load_config(Some(config_file.path())).expect("Config should load");

    assert_eq!(config.repo.owner, "alibaba");
    assert_eq!(config.repo.branch, "v2");
    assert_eq!(config.snapshot_path, PathBuf::from("./tmp/valid_path_list.json"));
    assert_eq!(config.name_prefix, "formily_docs");
    // Unset keys keep their defaults.
    assert_eq!(config.test_name_prefix, "formily_test");
    assert_eq!(config.list_page_size, 100);
    assert_eq!(config.endpoints.knowledge_base, "http://127.0.0.1:9000");
    assert_eq!(config.endpoints.github_api, "https://api.github.com");

    // Secrets and dataset ids come from the environment.
    assert_eq!(config.repo_token, "ghp-test-token");
    assert_eq!(config.kb_token, "pat-test-token");
    assert_eq!(config.dataset_id(false), "7400000000000000001");
    assert_eq!(config.dataset_id(true), "7400000000000000002");
}

#[tokio::test]
#[serial]
async fn test_load_config_without_file_uses_defaults() {
    set_required_env();

    let config = load_config(None).expect("Config should load");

    assert_eq!(config.repo.slug(), "alibaba/formily");
    assert_eq!(config.repo.branch, "formily_next");
    assert_eq!(config.snapshot_path, PathBuf::from("valid_path_list.json"));
}

/// Missing required env vars make the loader fail and name the variable.
#[tokio::test]
#[serial]
async fn test_load_config_errors_on_missing_env() {
    set_required_env();
    env::remove_var(COZE_TOKEN_VAR);

    let err = load_config(None).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains(COZE_TOKEN_VAR), "Must error for missing env var, got: {msg}");

    set_required_env();
    env::set_var(TEST_DATASET_ID_VAR, "  ");
    let msg = load_config(None).unwrap_err().to_string();
    assert!(msg.contains(TEST_DATASET_ID_VAR), "Must error for empty env var, got: {msg}");
}

#[tokio::test]
#[serial]
async fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();
    set_required_env();

    let msg = load_config(Some(config_file.path())).unwrap_err().to_string();
    assert!(msg.contains("parse") || msg.contains("YAML"), "Parse error expected, got: {msg}");

    write(config_file.path(), b"dataset: 12\n").unwrap();
    let msg = load_config(Some(config_file.path())).unwrap_err().to_string();
    assert!(msg.contains("YAML"), "Unknown keys must be rejected, got: {msg}");

    let missing = config_file.path().with_extension("does-not-exist");
    let msg = load_config(Some(missing.as_path())).unwrap_err().to_string();
    assert!(msg.contains("Failed to read config file"), "got: {msg}");
}
