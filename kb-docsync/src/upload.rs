#![doc = "Knowledge-base client for the CLI: implements the core `KnowledgeBase` trait against the Coze open API."]
//
//! # Knowledge-base Integration (CLI <-> Core)
//!
//! [`CozeClient`] is the networked implementation of
//! [`kb_docsync_core::contract::KnowledgeBase`] used by every CLI command.
//!
//! - Construct it from a loaded [`SyncConfig`] (token, base URL, page size, timeout).
//! - All requests are `POST` with a bearer token and the `Agw-Js-Conv: str` header, which
//!   makes the gateway render int64 ids as strings.
//! - Responses share an envelope `{ code, msg, document_infos }`. A non-zero `code` is a
//!   [`SyncError::Api`]; a missing `document_infos` is a [`SyncError::Decode`].

use async_trait::async_trait;
use kb_docsync_core::config::SyncConfig;
use kb_docsync_core::contract::{CreateDocumentsRequest, KnowledgeBase, RemoteDocument};
use kb_docsync_core::error::SyncError;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const LIST_PATH: &str = "/open_api/knowledge/document/list";
pub const CREATE_PATH: &str = "/open_api/knowledge/document/create";
pub const DELETE_PATH: &str = "/open_api/knowledge/document/delete";

const JS_CONV_HEADER: &str = "Agw-Js-Conv";
const LOG_ID_HEADER: &str = "x-tt-logid";

#[derive(Debug, Deserialize)]
struct DocumentsEnvelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    document_infos: Option<Vec<RemoteDocument>>,
    /// May arrive as a number or a string depending on the gateway conversion.
    #[serde(default)]
    total: Option<serde_json::Value>,
}

impl DocumentsEnvelope {
    fn total(&self) -> Option<i64> {
        match self.total.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn into_documents(self) -> Result<Vec<RemoteDocument>, SyncError> {
        if self.code != 0 {
            return Err(SyncError::Api {
                code: self.code,
                msg: self.msg,
            });
        }
        self.document_infos.ok_or_else(|| {
            SyncError::Decode("knowledge base response has no `document_infos` field".to_string())
        })
    }
}

#[derive(Debug, Serialize)]
struct ListDocumentsBody<'a> {
    dataset_id: &'a str,
    page: u32,
    size: u32,
}

#[derive(Debug, Serialize)]
struct DeleteDocumentsBody {
    document_ids: Vec<String>,
}

pub struct CozeClient {
    client: Client,
    base_url: String,
    token: String,
    page_size: u32,
}

impl CozeClient {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        tracing::info!(
            base_url = %config.endpoints.knowledge_base,
            token_set = !config.kb_token.is_empty(),
            page_size = config.list_page_size,
            "Initialized CozeClient"
        );
        Ok(CozeClient {
            client,
            base_url: config.endpoints.knowledge_base.trim_end_matches('/').to_string(),
            token: config.kb_token.clone(),
            page_size: config.list_page_size,
        })
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response, SyncError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(JS_CONV_HEADER, "str")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, url = %url, "Knowledge base request failed");
                SyncError::Http(e)
            })?;

        tracing::debug!(
            url = %url,
            status = %response.status(),
            log_id = response
                .headers()
                .get(LOG_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            "Knowledge base responded"
        );

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, url = %url, "Knowledge base returned error. Response body: {body}");
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, SyncError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.post(path, body).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl KnowledgeBase for CozeClient {
    async fn list_documents(&self, dataset_id: &str) -> Result<Vec<RemoteDocument>, SyncError> {
        tracing::info!(dataset_id, "Listing knowledge base documents");
        let body = ListDocumentsBody {
            dataset_id,
            page: 0,
            size: self.page_size,
        };
        let envelope: DocumentsEnvelope = self.post_json(LIST_PATH, &body).await?;
        let total = envelope.total();
        let documents = envelope.into_documents()?;

        if let Some(total) = total {
            if total > documents.len() as i64 {
                tracing::warn!(
                    total,
                    returned = documents.len(),
                    "Dataset holds more documents than one page, registered paths may be listed as new"
                );
            }
        }
        tracing::info!(count = documents.len(), "Fetched knowledge base documents");
        Ok(documents)
    }

    async fn create_documents(
        &self,
        req: CreateDocumentsRequest,
    ) -> Result<Vec<RemoteDocument>, SyncError> {
        tracing::info!(
            dataset_id = %req.dataset_id,
            count = req.document_bases.len(),
            "Creating knowledge base documents"
        );
        let envelope: DocumentsEnvelope = self.post_json(CREATE_PATH, &req).await?;
        let documents = envelope.into_documents()?;
        tracing::debug!(count = documents.len(), "Created knowledge base documents");
        Ok(documents)
    }

    async fn delete_documents(
        &self,
        document_ids: Vec<String>,
    ) -> Result<serde_json::Value, SyncError> {
        tracing::info!(count = document_ids.len(), "Deleting knowledge base documents");
        let body = DeleteDocumentsBody { document_ids };
        self.post_json(DELETE_PATH, &body).await
    }
}
