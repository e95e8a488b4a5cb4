//! # contract: the two remote services a sync run talks to
//!
//! [`RepositoryTree`] lists the files of the mirrored repository and
//! [`KnowledgeBase`] lists, creates and deletes documents in a dataset.
//! Everything in [`crate::list`], [`crate::register`] and [`crate::purge`] is
//! written against these traits, so tests can drive them with the generated
//! `MockRepositoryTree` / `MockKnowledgeBase`.
//!
//! The request types serialize to the exact body the knowledge-base create
//! endpoint expects.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SyncError;

/// Processing-failure status on a created document: accepted, but not ingested.
pub const STATUS_PROCESSING_FAILED: i64 = 9;

/// One entry of the recursive repository tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
}

impl TreeEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// A document as the knowledge base reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    #[serde(deserialize_with = "string_or_number")]
    pub document_id: String,
    #[serde(default)]
    pub web_url: String,
    #[serde(default, deserialize_with = "int_or_string")]
    pub status: i64,
}

impl RemoteDocument {
    pub fn failed_processing(&self) -> bool {
        self.status == STATUS_PROCESSING_FAILED
    }
}

/// Body of one create request: a batch of web pages for a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDocumentsRequest {
    pub dataset_id: String,
    pub document_bases: Vec<DocumentBase>,
    pub chunk_strategy: ChunkStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentBase {
    pub name: String,
    pub source_info: SourceInfo,
    pub update_rule: UpdateRule,
}

impl DocumentBase {
    /// An online web page, re-fetched weekly by the knowledge base.
    pub fn web_page(name: impl Into<String>, web_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_info: SourceInfo {
                web_url: web_url.into(),
                document_source: SourceInfo::WEB_PAGE,
            },
            update_rule: UpdateRule::weekly(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInfo {
    pub web_url: String,
    pub document_source: u8,
}

impl SourceInfo {
    pub const WEB_PAGE: u8 = 1;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRule {
    pub update_type: u8,
    /// Hours between automatic refreshes.
    pub update_interval: u32,
}

impl UpdateRule {
    pub const AUTOMATIC: u8 = 1;

    pub fn weekly() -> Self {
        Self {
            update_type: Self::AUTOMATIC,
            update_interval: 7 * 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkStrategy {
    pub chunk_type: u8,
}

impl ChunkStrategy {
    pub fn automatic() -> Self {
        Self { chunk_type: 0 }
    }
}

/// Lists the files of the mirrored repository.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryTree: Send + Sync {
    /// Fetch every entry of the repository tree, recursively.
    async fn fetch_tree(&self) -> Result<Vec<TreeEntry>, SyncError>;
}

/// Reads and writes documents in a knowledge-base dataset.
///
/// Implementors own transport, authentication and response decoding; every
/// failure is mapped into a [`SyncError`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// List the documents currently registered in `dataset_id`.
    async fn list_documents(&self, dataset_id: &str) -> Result<Vec<RemoteDocument>, SyncError>;

    /// Register one batch of documents. Returns the created records, each with
    /// its processing status.
    async fn create_documents(
        &self,
        req: CreateDocumentsRequest,
    ) -> Result<Vec<RemoteDocument>, SyncError>;

    /// Delete documents by id. The raw response body is handed back untouched.
    async fn delete_documents(
        &self,
        document_ids: Vec<String>,
    ) -> Result<serde_json::Value, SyncError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
    Uint(u64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Int(n) => n.to_string(),
        StringOrNumber::Uint(n) => n.to_string(),
    })
}

fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Int(n) => Ok(n),
        StringOrNumber::Uint(n) => i64::try_from(n).map_err(serde::de::Error::custom),
        StringOrNumber::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remote_document_accepts_stringified_ids_and_status() {
        let doc: RemoteDocument = serde_json::from_value(json!({
            "document_id": "7391234567890123456",
            "web_url": "https://example.com/a.md",
            "status": "9"
        }))
        .unwrap();
        assert_eq!(doc.document_id, "7391234567890123456");
        assert!(doc.failed_processing());

        let doc: RemoteDocument = serde_json::from_value(json!({
            "document_id": 42,
            "status": 1
        }))
        .unwrap();
        assert_eq!(doc.document_id, "42");
        assert_eq!(doc.web_url, "");
        assert!(!doc.failed_processing());
    }

    #[test]
    fn create_request_matches_wire_shape() {
        let req = CreateDocumentsRequest {
            dataset_id: "ds".to_string(),
            document_bases: vec![DocumentBase::web_page("formily_docs_a.md", "https://x/a.md")],
            chunk_strategy: ChunkStrategy::automatic(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "dataset_id": "ds",
                "document_bases": [{
                    "name": "formily_docs_a.md",
                    "source_info": { "web_url": "https://x/a.md", "document_source": 1 },
                    "update_rule": { "update_type": 1, "update_interval": 168 }
                }],
                "chunk_strategy": { "chunk_type": 0 }
            })
        );
    }
}
