//! Document Registrar: submit the new entries of a snapshot to the knowledge base.
//!
//! New entries are split into batches of at most [`MAX_BATCH_SIZE`] (the create
//! endpoint refuses more per request) and every batch is sent at once. A batch
//! that fails counts as zero successes; its siblings carry on.

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{ChunkStrategy, CreateDocumentsRequest, DocumentBase, KnowledgeBase};
use crate::error::SyncError;
use crate::snapshot::{read_snapshot, PathEntry, Snapshot};

pub const MAX_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub batch_index: usize,
    /// Returned documents whose status is not the processing-failure code.
    pub success_count: usize,
    /// Paths submitted in this batch.
    pub chunk_path_count: usize,
    /// Web URLs that failed processing, or the whole batch when the request failed.
    pub failed_web_urls: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrationReport {
    pub batches: Vec<BatchReport>,
    pub total_success_count: usize,
    pub total_count: usize,
}

impl RegistrationReport {
    pub fn failed_web_urls(&self) -> impl Iterator<Item = &str> {
        self.batches
            .iter()
            .flat_map(|b| b.failed_web_urls.iter().map(String::as_str))
    }
}

/// Consecutive batches of at most `size` entries, in input order.
pub fn partition_batches(entries: &[PathEntry], size: usize) -> Vec<Vec<PathEntry>> {
    entries
        .chunks(size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

fn create_request(dataset_id: &str, batch: &[PathEntry]) -> CreateDocumentsRequest {
    CreateDocumentsRequest {
        dataset_id: dataset_id.to_string(),
        document_bases: batch
            .iter()
            .map(|entry| DocumentBase::web_page(&entry.name, &entry.web_url))
            .collect(),
        chunk_strategy: ChunkStrategy::automatic(),
    }
}

/// Submit one batch. Never fails: errors become a zero-success report.
pub async fn register_batch<K>(
    kb: &K,
    dataset_id: &str,
    batch: &[PathEntry],
    batch_index: usize,
) -> BatchReport
where
    K: KnowledgeBase + ?Sized,
{
    let chunk_path_count = batch.len();
    match kb.create_documents(create_request(dataset_id, batch)).await {
        Ok(documents) => {
            let failed_web_urls: Vec<String> = documents
                .iter()
                .filter(|doc| doc.failed_processing())
                .map(|doc| doc.web_url.clone())
                .collect();
            let success_count = documents.len() - failed_web_urls.len();
            debug!(
                batch_index,
                success_count,
                chunk_path_count,
                "[REGISTER] Batch submitted"
            );
            if !failed_web_urls.is_empty() {
                warn!(
                    batch_index,
                    failed = ?failed_web_urls,
                    "[REGISTER] Documents failed processing, re-upload them"
                );
            }
            BatchReport {
                batch_index,
                success_count,
                chunk_path_count,
                failed_web_urls,
                error: None,
            }
        }
        Err(e) => {
            error!(batch_index, error = %e, "[REGISTER][ERROR] Batch request failed");
            BatchReport {
                batch_index,
                success_count: 0,
                chunk_path_count,
                failed_web_urls: batch.iter().map(|entry| entry.web_url.clone()).collect(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Register every new entry of `snapshot`, all batches concurrently.
pub async fn register_snapshot<K>(
    kb: &K,
    dataset_id: &str,
    snapshot: &Snapshot,
) -> RegistrationReport
where
    K: KnowledgeBase + ?Sized,
{
    let new_entries = snapshot.new_entries();
    let batches = partition_batches(&new_entries, MAX_BATCH_SIZE);
    info!(
        dataset_id,
        new_path_count = new_entries.len(),
        batch_count = batches.len(),
        "[REGISTER] Submitting batches"
    );

    let batches = join_all(
        batches
            .iter()
            .enumerate()
            .map(|(index, batch)| register_batch(kb, dataset_id, batch, index)),
    )
    .await;

    let total_success_count = batches.iter().map(|b| b.success_count).sum();
    let report = RegistrationReport {
        batches,
        total_success_count,
        total_count: new_entries.len(),
    };

    info!(
        total_success_count = report.total_success_count,
        total_count = report.total_count,
        "[REGISTER] Registration finished"
    );
    let failed: Vec<&str> = report.failed_web_urls().collect();
    if !failed.is_empty() {
        warn!(failed_count = failed.len(), failed = ?failed, "[REGISTER] Some documents were not registered");
    }
    report
}

/// Read the snapshot file and register its new entries.
pub async fn create_documents<K>(
    config: &SyncConfig,
    kb: &K,
    is_test: bool,
) -> Result<RegistrationReport, SyncError>
where
    K: KnowledgeBase + ?Sized,
{
    let snapshot = read_snapshot(&config.snapshot_path)?;
    Ok(register_snapshot(kb, config.dataset_id(is_test), &snapshot).await)
}
