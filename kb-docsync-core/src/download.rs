use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{RepositoryTree, TreeEntry};
use crate::error::SyncError;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("kb-docsync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Option<Vec<TreeEntry>>,
    #[serde(default)]
    truncated: bool,
}

/// Reads the recursive Git tree of the configured branch from the GitHub REST API.
pub struct GithubTreeClient {
    client: Client,
    url: String,
    token: String,
}

impl GithubTreeClient {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let url = config.repo.tree_url(&config.endpoints.github_api);
        info!(url = %url, token_set = !config.repo_token.is_empty(), "Initialized GithubTreeClient");
        Ok(Self {
            client,
            url,
            token: config.repo_token.clone(),
        })
    }
}

#[async_trait::async_trait]
impl RepositoryTree for GithubTreeClient {
    async fn fetch_tree(&self) -> Result<Vec<TreeEntry>, SyncError> {
        info!(url = %self.url, "Fetching repository tree");
        let response = self
            .client
            .get(&self.url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %self.url, "Failed to fetch repository tree");
                SyncError::Http(e)
            })?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!(status = %status, url = %self.url, "GitHub API returned error. Response body: {text}");
            return Err(SyncError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: TreeResponse = serde_json::from_str(&text)?;
        let Some(tree) = body.tree else {
            return Err(SyncError::Decode(
                "repository tree response has no `tree` field".to_string(),
            ));
        };
        if tree.is_empty() {
            return Err(SyncError::EmptyTree);
        }
        if body.truncated {
            warn!(
                entries = tree.len(),
                "Repository tree was truncated by GitHub, some paths are missing"
            );
        }
        debug!(entries = tree.len(), "Fetched repository tree");
        Ok(tree)
    }
}
