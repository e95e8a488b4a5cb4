use thiserror::Error;

/// Errors raised while talking to the repository or the knowledge base, or while
/// reading and writing the snapshot file.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success HTTP status.
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The knowledge base accepted the request but reported a non-zero code.
    #[error("knowledge base API error {code}: {msg}")]
    Api { code: i64, msg: String },

    /// The response parsed as JSON but did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The repository tree came back without a single entry.
    #[error("repository tree is empty")]
    EmptyTree,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("snapshot schema version {found} is newer than supported version {supported}")]
    UnsupportedSnapshotVersion { found: u32, supported: u32 },
}

impl From<tempfile::PersistError> for SyncError {
    fn from(e: tempfile::PersistError) -> Self {
        SyncError::Io(e.error)
    }
}
