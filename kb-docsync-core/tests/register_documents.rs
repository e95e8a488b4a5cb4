use kb_docsync_core::config::SyncConfig;
use kb_docsync_core::contract::{
    CreateDocumentsRequest, MockKnowledgeBase, RemoteDocument, STATUS_PROCESSING_FAILED,
};
use kb_docsync_core::error::SyncError;
use kb_docsync_core::register::{create_documents, register_batch, register_snapshot, MAX_BATCH_SIZE};
use kb_docsync_core::snapshot::{write_snapshot, PathEntry, Snapshot};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn entry(i: usize, is_new: bool) -> PathEntry {
    PathEntry {
        path: format!("docs/page{i}.zh-CN.md"),
        name: format!("formily_docs_page{i}.zh-CN.md"),
        web_url: format!("https://raw.example/docs/page{i}.zh-CN.md"),
        is_new_current_run: is_new,
    }
}

/// Echo every submitted document back with status 1.
fn accepted(req: &CreateDocumentsRequest) -> Vec<RemoteDocument> {
    req.document_bases
        .iter()
        .enumerate()
        .map(|(i, doc)| RemoteDocument {
            document_id: format!("{}-{i}", doc.name),
            web_url: doc.source_info.web_url.clone(),
            status: 1,
        })
        .collect()
}

#[tokio::test]
async fn test_twenty_three_new_paths_are_sent_as_10_10_3() {
    let mut entries: Vec<PathEntry> = (0..23).map(|i| entry(i, true)).collect();
    // Already registered entries never reach the create endpoint.
    entries.insert(5, entry(100, false));
    entries.push(entry(101, false));
    let snapshot = Snapshot::new(entries);

    let seen: Arc<Mutex<Vec<CreateDocumentsRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in_mock = seen.clone();

    let mut kb = MockKnowledgeBase::new();
    kb.expect_create_documents().times(3).returning(move |req| {
        let docs = accepted(&req);
        seen_in_mock.lock().unwrap().push(req);
        Ok(docs)
    });

    let report = register_snapshot(&kb, "prod-dataset", &snapshot).await;

    let sizes: Vec<usize> = report.batches.iter().map(|b| b.chunk_path_count).collect();
    assert_eq!(sizes, vec![10, 10, 3]);
    let indices: Vec<usize> = report.batches.iter().map(|b| b.batch_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(report.total_success_count, 23);
    assert_eq!(report.total_count, 23);
    assert_eq!(report.failed_web_urls().count(), 0);

    let seen = seen.lock().unwrap();
    let mut submitted: Vec<String> = Vec::new();
    for req in seen.iter() {
        assert_eq!(req.dataset_id, "prod-dataset");
        assert!(req.document_bases.len() <= MAX_BATCH_SIZE);
        assert_eq!(req.chunk_strategy.chunk_type, 0);
        for doc in &req.document_bases {
            assert_eq!(doc.source_info.document_source, 1);
            assert_eq!(doc.update_rule.update_type, 1);
            assert_eq!(doc.update_rule.update_interval, 168);
            submitted.push(doc.name.clone());
        }
    }
    submitted.sort();
    let mut expected: Vec<String> = (0..23).map(|i| entry(i, true).name).collect();
    expected.sort();
    assert_eq!(submitted, expected);
}

#[tokio::test]
async fn test_processing_failures_are_counted_and_identified() {
    let batch: Vec<PathEntry> = (0..4).map(|i| entry(i, true)).collect();

    let mut kb = MockKnowledgeBase::new();
    kb.expect_create_documents().return_once(|req| {
        let mut docs = accepted(&req);
        docs[1].status = STATUS_PROCESSING_FAILED;
        docs[3].status = STATUS_PROCESSING_FAILED;
        Ok(docs)
    });

    let report = register_batch(&kb, "prod-dataset", &batch, 7).await;

    assert_eq!(report.batch_index, 7);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.chunk_path_count, 4);
    assert_eq!(
        report.failed_web_urls,
        vec![batch[1].web_url.clone(), batch[3].web_url.clone()]
    );
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_failed_batch_counts_zero_without_aborting_siblings() {
    let snapshot = Snapshot::new((0..25).map(|i| entry(i, true)).collect());

    let mut kb = MockKnowledgeBase::new();
    kb.expect_create_documents().times(3).returning(|req| {
        // The batch holding page10..page19 blows up.
        if req.document_bases[0].name == "formily_docs_page10.zh-CN.md" {
            return Err(SyncError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        let mut docs = accepted(&req);
        if let Some(last) = docs.last_mut() {
            last.status = STATUS_PROCESSING_FAILED;
        }
        Ok(docs)
    });

    let report = register_snapshot(&kb, "prod-dataset", &snapshot).await;

    assert_eq!(report.batches.len(), 3);
    assert_eq!(report.batches[0].success_count, 9);
    assert_eq!(report.batches[1].success_count, 0);
    assert!(report.batches[1].error.as_deref().unwrap().contains("502"));
    assert_eq!(report.batches[1].failed_web_urls.len(), 10);
    assert_eq!(report.batches[2].success_count, 4);
    assert_eq!(report.total_success_count, 13);
    assert_eq!(report.total_count, 25);
    assert_eq!(report.failed_web_urls().count(), 12);
}

#[tokio::test]
async fn test_nothing_new_sends_no_requests() {
    let snapshot = Snapshot::new((0..3).map(|i| entry(i, false)).collect());
    let kb = MockKnowledgeBase::new();

    let report = register_snapshot(&kb, "prod-dataset", &snapshot).await;

    assert!(report.batches.is_empty());
    assert_eq!(report.total_success_count, 0);
    assert_eq!(report.total_count, 0);
}

#[tokio::test]
async fn test_create_documents_reads_snapshot_file_for_test_dataset() {
    let dir = tempdir().unwrap();
    let mut config = SyncConfig::new("gh", "kb", "prod-dataset", "test-dataset");
    config.snapshot_path = dir.path().join("valid_path_list.json");
    let snapshot = Snapshot::new(vec![entry(0, true), entry(1, false), entry(2, true)]);
    write_snapshot(&config.snapshot_path, &snapshot).unwrap();

    let mut kb = MockKnowledgeBase::new();
    kb.expect_create_documents().times(1).returning(|req| {
        assert_eq!(req.dataset_id, "test-dataset");
        Ok(accepted(&req))
    });

    let report = create_documents(&config, &kb, true).await.unwrap();
    assert_eq!(report.total_success_count, 2);
    assert_eq!(report.total_count, 2);
}

#[tokio::test]
async fn test_create_documents_fails_without_snapshot() {
    let dir = tempdir().unwrap();
    let mut config = SyncConfig::new("gh", "kb", "prod-dataset", "test-dataset");
    config.snapshot_path = dir.path().join("missing.json");
    let kb = MockKnowledgeBase::new();

    let err = create_documents(&config, &kb, false).await.unwrap_err();
    assert!(matches!(err, SyncError::Io(_)));

    std::fs::write(&config.snapshot_path, "{ not json").unwrap();
    let err = create_documents(&config, &kb, false).await.unwrap_err();
    assert!(matches!(err, SyncError::Json(_)));
}
