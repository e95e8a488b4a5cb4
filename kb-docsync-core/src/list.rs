//! Path Lister: repository tree + existing documents -> snapshot of documentation paths.
//!
//! Fetches the recursive tree and the dataset's document list together, keeps the
//! paths matching the documentation pattern, marks every path whose raw URL is
//! not registered yet, and persists the result as the snapshot file.

use std::collections::HashSet;

use regex::Regex;
use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::contract::{KnowledgeBase, RepositoryTree, TreeEntry};
use crate::error::SyncError;
use crate::snapshot::{write_snapshot, PathEntry, Snapshot};

/// Markdown under `packages/{core,react,reactive}/docs` or the top-level `docs`.
pub const DOC_PATH_PATTERN: &str = r"^((packages/(core|react|reactive)/docs)|(docs))(.|/)*\.md$";

/// Same roots, only the zh-CN variants.
pub const ZH_DOC_PATH_PATTERN: &str =
    r"^((packages/(core|react|reactive)/docs)|(docs))(.|/)*\.zh-CN.md$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    /// Keep only zh-CN documents.
    pub zh_only: bool,
    /// Diff against the test dataset and use the test name prefix.
    pub is_test: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            zh_only: true,
            is_test: false,
        }
    }
}

pub struct PathFilter {
    pattern: Regex,
}

impl PathFilter {
    pub fn new(zh_only: bool) -> Result<Self, SyncError> {
        let pattern = if zh_only {
            ZH_DOC_PATH_PATTERN
        } else {
            DOC_PATH_PATTERN
        };
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// Display name of a document: prefix plus the path with separators flattened.
pub fn document_name(prefix: &str, path: &str) -> String {
    format!("{}_{}", prefix, path.replace('/', "_"))
}

/// Filter `tree` and mark each surviving path against `registered_urls`.
pub fn collect_entries(
    config: &SyncConfig,
    filter: &PathFilter,
    tree: &[TreeEntry],
    registered_urls: &HashSet<&str>,
    is_test: bool,
) -> Vec<PathEntry> {
    let prefix = config.name_prefix(is_test);
    tree.iter()
        .filter(|item| filter.matches(&item.path))
        .map(|item| {
            let web_url = config
                .repo
                .raw_url(&config.endpoints.raw_content, &item.path);
            let is_new_current_run = !registered_urls.contains(web_url.as_str());
            PathEntry {
                path: item.path.clone(),
                name: document_name(prefix, &item.path),
                web_url,
                is_new_current_run,
            }
        })
        .collect()
}

/// Fetch both listings concurrently and build the snapshot. Nothing is written.
pub async fn build_snapshot<T, K>(
    config: &SyncConfig,
    tree: &T,
    kb: &K,
    options: ListOptions,
) -> Result<Snapshot, SyncError>
where
    T: RepositoryTree + ?Sized,
    K: KnowledgeBase + ?Sized,
{
    let filter = PathFilter::new(options.zh_only)?;
    let dataset_id = config.dataset_id(options.is_test);

    info!(
        repo = %config.repo.slug(),
        branch = %config.repo.branch,
        dataset_id,
        zh_only = options.zh_only,
        "[LIST] Fetching repository tree and registered documents"
    );
    let (tree_entries, documents) =
        futures::try_join!(tree.fetch_tree(), kb.list_documents(dataset_id))?;
    debug!(
        tree_entries = tree_entries.len(),
        documents = documents.len(),
        "[LIST] Fetched listings"
    );

    let registered_urls: HashSet<&str> = documents.iter().map(|d| d.web_url.as_str()).collect();
    let entries = collect_entries(config, &filter, &tree_entries, &registered_urls, options.is_test);
    let snapshot = Snapshot::new(entries);

    info!(
        date = snapshot.date,
        valid_path_count = snapshot.valid_path_list.len(),
        new_path_count = snapshot.new_entry_count(),
        "[LIST] Built path list"
    );
    Ok(snapshot)
}

/// Build the snapshot and persist it to `config.snapshot_path`.
///
/// Failures are logged and turned into `None`; in that case the previous
/// snapshot file, if any, is left exactly as it was.
pub async fn generate_doc_list<T, K>(
    config: &SyncConfig,
    tree: &T,
    kb: &K,
    options: ListOptions,
) -> Option<Snapshot>
where
    T: RepositoryTree + ?Sized,
    K: KnowledgeBase + ?Sized,
{
    let snapshot = match build_snapshot(config, tree, kb, options).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, "[LIST][ERROR] Listing failed, snapshot not written");
            return None;
        }
    };

    if let Err(e) = write_snapshot(&config.snapshot_path, &snapshot) {
        error!(
            error = %e,
            path = %config.snapshot_path.display(),
            "[LIST][ERROR] Failed to write snapshot"
        );
        return None;
    }
    Some(snapshot)
}
