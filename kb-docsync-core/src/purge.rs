//! Document Purger: delete every document of a dataset in one request.
//!
//! Meant for cleaning up the test dataset by hand; there is no confirmation step.

use tracing::{info, warn};

use crate::contract::KnowledgeBase;
use crate::error::SyncError;

/// List the dataset and bulk-delete all of it. Returns the delete response body
/// verbatim, or `None` when the dataset was already empty and nothing was sent.
pub async fn batch_delete_documents<K>(
    kb: &K,
    dataset_id: &str,
) -> Result<Option<serde_json::Value>, SyncError>
where
    K: KnowledgeBase + ?Sized,
{
    let documents = kb.list_documents(dataset_id).await?;
    if documents.is_empty() {
        warn!(dataset_id, "[PURGE] Dataset has no documents, nothing to delete");
        return Ok(None);
    }

    let document_ids: Vec<String> = documents.into_iter().map(|d| d.document_id).collect();
    info!(dataset_id, count = document_ids.len(), "[PURGE] Deleting documents");

    let response = kb.delete_documents(document_ids).await?;
    info!(response = %response, "[PURGE] Delete response");
    Ok(Some(response))
}
