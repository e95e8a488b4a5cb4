use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_RAW_CONTENT: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_KNOWLEDGE_BASE: &str = "https://api.coze.cn";
pub const DEFAULT_SNAPSHOT_PATH: &str = "valid_path_list.json";
pub const DEFAULT_NAME_PREFIX: &str = "formily";
pub const DEFAULT_TEST_NAME_PREFIX: &str = "formily_test";
/// The list endpoint is read as a single page of this size.
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything a run needs: credentials, dataset ids, the repository to mirror
/// and where the snapshot lives. Built once at process start and passed down.
#[derive(Clone)]
pub struct SyncConfig {
    pub repo_token: String,
    pub kb_token: String,
    pub dataset_id: String,
    pub test_dataset_id: String,
    pub repo: RepoSource,
    pub snapshot_path: PathBuf,
    pub name_prefix: String,
    pub test_name_prefix: String,
    pub list_page_size: u32,
    pub request_timeout_secs: u64,
    pub endpoints: Endpoints,
}

impl SyncConfig {
    /// Credentials and dataset ids with every other field at its default.
    pub fn new(
        repo_token: impl Into<String>,
        kb_token: impl Into<String>,
        dataset_id: impl Into<String>,
        test_dataset_id: impl Into<String>,
    ) -> Self {
        Self {
            repo_token: repo_token.into(),
            kb_token: kb_token.into(),
            dataset_id: dataset_id.into(),
            test_dataset_id: test_dataset_id.into(),
            repo: RepoSource::default(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            test_name_prefix: DEFAULT_TEST_NAME_PREFIX.to_string(),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            endpoints: Endpoints::default(),
        }
    }

    /// Selects the test or production dataset.
    pub fn dataset_id(&self, is_test: bool) -> &str {
        if is_test {
            &self.test_dataset_id
        } else {
            &self.dataset_id
        }
    }

    pub fn name_prefix(&self, is_test: bool) -> &str {
        if is_test {
            &self.test_name_prefix
        } else {
            &self.name_prefix
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            repo = %self.repo.slug(),
            branch = %self.repo.branch,
            snapshot_path = %self.snapshot_path.display(),
            dataset_id = %self.dataset_id,
            test_dataset_id = %self.test_dataset_id,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("repo_token_set", &!self.repo_token.is_empty())
            .field("kb_token_set", &!self.kb_token.is_empty())
            .field("dataset_id", &self.dataset_id)
            .field("test_dataset_id", &self.test_dataset_id)
            .field("repo", &self.repo)
            .field("snapshot_path", &self.snapshot_path)
            .field("name_prefix", &self.name_prefix)
            .field("test_name_prefix", &self.test_name_prefix)
            .field("list_page_size", &self.list_page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

/// The GitHub repository and branch whose documentation tree is mirrored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepoSource {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl Default for RepoSource {
    fn default() -> Self {
        Self {
            owner: "alibaba".to_string(),
            name: "formily".to_string(),
            branch: "formily_next".to_string(),
        }
    }
}

impl RepoSource {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Recursive Git trees endpoint for the configured branch.
    pub fn tree_url(&self, api_base: &str) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            api_base.trim_end_matches('/'),
            self.owner,
            self.name,
            self.branch
        )
    }

    /// Raw-content URL of a file; this is the identity of a registered document.
    pub fn raw_url(&self, raw_base: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/refs/heads/{}/{}",
            raw_base.trim_end_matches('/'),
            self.owner,
            self.name,
            self.branch,
            path
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub github_api: String,
    pub raw_content: String,
    pub knowledge_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github_api: DEFAULT_GITHUB_API.to_string(),
            raw_content: DEFAULT_RAW_CONTENT.to_string(),
            knowledge_base: DEFAULT_KNOWLEDGE_BASE.to_string(),
        }
    }
}
