//! High-level pipeline: list the repository's documentation, then register what is new.
//!
//! # Steps
//! 1. [`generate_doc_list`]: fetch the tree and the registered documents, write the snapshot.
//! 2. [`register_snapshot`]: submit the snapshot's new entries in concurrent batches.
//!
//! The snapshot produced in step 1 is handed to step 2 in memory. When listing
//! fails, registration is skipped instead of replaying whatever stale snapshot
//! is still on disk.
//!
//! # Error Handling
//! Nothing here returns an error. Every failure is logged where it happens and
//! shows up in the [`SynchroniseReport`].

use tracing::{error, info};

use crate::config::SyncConfig;
use crate::contract::{KnowledgeBase, RepositoryTree};
use crate::list::{generate_doc_list, ListOptions};
use crate::register::{register_snapshot, RegistrationReport};

#[derive(Debug)]
pub struct SynchroniseReport {
    /// Entries in the written snapshot; `None` when listing failed.
    pub valid_path_count: Option<usize>,
    pub new_path_count: Option<usize>,
    /// `None` when registration was skipped.
    pub registration: Option<RegistrationReport>,
}

impl SynchroniseReport {
    pub fn listing_failed(&self) -> bool {
        self.valid_path_count.is_none()
    }
}

pub async fn synchronise<T, K>(
    config: &SyncConfig,
    tree: &T,
    kb: &K,
    options: ListOptions,
) -> SynchroniseReport
where
    T: RepositoryTree + ?Sized,
    K: KnowledgeBase + ?Sized,
{
    info!(
        zh_only = options.zh_only,
        is_test = options.is_test,
        "[SYNC] Starting synchronisation"
    );

    let Some(snapshot) = generate_doc_list(config, tree, kb, options).await else {
        error!("[SYNC][ERROR] Listing failed, registration skipped");
        return SynchroniseReport {
            valid_path_count: None,
            new_path_count: None,
            registration: None,
        };
    };

    let registration = register_snapshot(kb, config.dataset_id(options.is_test), &snapshot).await;
    info!(
        valid_path_count = snapshot.valid_path_list.len(),
        total_success_count = registration.total_success_count,
        total_count = registration.total_count,
        "[SYNC] Synchronisation complete"
    );

    SynchroniseReport {
        valid_path_count: Some(snapshot.valid_path_list.len()),
        new_path_count: Some(snapshot.new_entry_count()),
        registration: Some(registration),
    }
}
