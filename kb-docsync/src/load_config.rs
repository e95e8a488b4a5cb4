/// `load_config` module: reads the optional YAML config file and injects secrets from the
/// environment to produce the [`SyncConfig`] every command runs with.
///
/// # Sources
/// - YAML file (no secrets): repository, snapshot path, name prefixes, endpoints. Every key
///   is optional; missing keys fall back to the defaults in `kb_docsync_core::config`.
/// - Environment (after loading `.env` when present): `GITHUB_ACCESS_TOKEN`,
///   `COZE_ACCESS_TOKEN`, `COZE_DATASET_ID`, `COZE_TEST_DATASET_ID`.
///
/// # Errors
/// All errors use `anyhow::Error` and name the file or variable at fault; they surface at the
/// CLI boundary.
use anyhow::Result;
use kb_docsync_core::config::{
    Endpoints, RepoSource, SyncConfig, DEFAULT_LIST_PAGE_SIZE, DEFAULT_NAME_PREFIX,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SNAPSHOT_PATH, DEFAULT_TEST_NAME_PREFIX,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const GITHUB_TOKEN_VAR: &str = "GITHUB_ACCESS_TOKEN";
pub const COZE_TOKEN_VAR: &str = "COZE_ACCESS_TOKEN";
pub const DATASET_ID_VAR: &str = "COZE_DATASET_ID";
pub const TEST_DATASET_ID_VAR: &str = "COZE_TEST_DATASET_ID";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub repo: RepoSource,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default = "default_test_name_prefix")]
    pub test_name_prefix: String,
    #[serde(default = "default_list_page_size")]
    pub list_page_size: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            repo: RepoSource::default(),
            snapshot_path: default_snapshot_path(),
            name_prefix: default_name_prefix(),
            test_name_prefix: default_test_name_prefix(),
            list_page_size: default_list_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            endpoints: Endpoints::default(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_PATH)
}

fn default_name_prefix() -> String {
    DEFAULT_NAME_PREFIX.to_string()
}

fn default_test_name_prefix() -> String {
    DEFAULT_TEST_NAME_PREFIX.to_string()
}

fn default_list_page_size() -> u32 {
    DEFAULT_LIST_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => {
            error!(var = name, "Environment variable is empty");
            Err(anyhow::anyhow!("{name} environment variable is empty"))
        }
        Err(e) => {
            error!(error = ?e, var = name, "Environment variable not set");
            Err(anyhow::anyhow!("{name} environment variable not set: {e}"))
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let config_content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    // An empty file means "all defaults".
    if config_content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Loads the optional YAML config and merges in the secrets and dataset ids from the environment.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    dotenvy::dotenv().ok();

    let file = match path {
        Some(path) => read_file_config(path)?,
        None => {
            info!("No config file given, using defaults");
            FileConfig::default()
        }
    };

    if file.list_page_size == 0 {
        anyhow::bail!("list_page_size must be greater than zero");
    }

    let config = SyncConfig {
        repo_token: required_env(GITHUB_TOKEN_VAR)?,
        kb_token: required_env(COZE_TOKEN_VAR)?,
        dataset_id: required_env(DATASET_ID_VAR)?,
        test_dataset_id: required_env(TEST_DATASET_ID_VAR)?,
        repo: file.repo,
        snapshot_path: file.snapshot_path,
        name_prefix: file.name_prefix,
        test_name_prefix: file.test_name_prefix,
        list_page_size: file.list_page_size,
        request_timeout_secs: file.request_timeout_secs,
        endpoints: file.endpoints,
    };
    config.trace_loaded();
    Ok(config)
}
