//! Backfill driver tests: best-effort sweep, manifest skips, and listing
//! filters.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use bytes::Bytes;

use kiosk_core::storage::{MemoryBackend, StorageBackend};
use kiosk_core::warehouse::{MemoryWarehouse, Warehouse};

use kiosk_loader::{
    BackfillDriver, BackfillReport, Classification, Family, Loader, LoaderConfig, classify,
};
use kiosk_test_utils::{archive_record, most_popular_record, ndjson};

fn test_config() -> LoaderConfig {
    LoaderConfig {
        bucket: "news-bucket".into(),
        root_prefix: "nyt-ingest".into(),
        staging_dataset: "staging".into(),
        metadata_dataset: "metadata".into(),
        prod_dataset: "prod".into(),
    }
}

async fn setup() -> (Arc<MemoryBackend>, Arc<MemoryWarehouse>, Loader) {
    let storage = Arc::new(MemoryBackend::new());
    let warehouse = Arc::new(MemoryWarehouse::new());
    let loader = Loader::new(storage.clone(), warehouse.clone(), test_config());
    loader.ensure_tables().await.expect("ensure tables");
    (storage, warehouse, loader)
}

#[tokio::test]
async fn test_one_failing_file_does_not_abort_the_sweep() {
    let (storage, warehouse, loader) = setup().await;

    for month in 1..=5u32 {
        let path = format!("nyt-ingest/archive_slim/2020/{month:02}.ndjson");
        let body = if month == 3 {
            // File #3 is corrupt: its load raises and must be isolated.
            Bytes::from("this is not json\n")
        } else {
            ndjson(&[archive_record(
                &format!("a{month}"),
                "2020-01-01T00:00:00+0000",
            )])
        };
        storage.put(&path, body).await.unwrap();
    }

    let report = BackfillDriver::new(loader).run().await.unwrap();

    assert_eq!(report.archive_loaded, 4);
    assert_eq!(report.errors, 1);
    assert!(report.has_errors());

    // Files after the failing one were still attempted.
    let final_rows = warehouse
        .scan(&test_config().final_table(Family::Archive))
        .await
        .unwrap();
    let ids: Vec<_> = final_rows
        .iter()
        .filter_map(|r| r.get("article_id").and_then(serde_json::Value::as_str))
        .collect();
    assert!(ids.contains(&"a4"));
    assert!(ids.contains(&"a5"));
}

#[tokio::test]
async fn test_manifested_files_are_skipped_without_work() {
    let (storage, _warehouse, loader) = setup().await;

    let first = "nyt-ingest/archive_slim/2020/01.ndjson";
    let second = "nyt-ingest/archive_slim/2020/02.ndjson";
    storage
        .put(first, ndjson(&[archive_record("a1", "2020-01-01T00:00:00+0000")]))
        .await
        .unwrap();
    storage
        .put(second, ndjson(&[archive_record("a2", "2020-02-01T00:00:00+0000")]))
        .await
        .unwrap();

    // Load the first file through the normal unit, then sweep.
    let Classification::File(file) = classify("nyt-ingest", first).unwrap() else {
        panic!("should classify");
    };
    loader.load_file(&file).await.unwrap();

    let report = BackfillDriver::new(loader).run().await.unwrap();
    assert_eq!(report.archive_skipped, 1);
    assert_eq!(report.archive_loaded, 1);
    assert!(!report.has_errors());
}

#[tokio::test]
async fn test_listing_filters() {
    let (storage, _warehouse, loader) = setup().await;

    // Counted: one archive file, one most-popular file.
    storage
        .put(
            "nyt-ingest/archive_slim/2020/01.ndjson",
            ndjson(&[archive_record("a1", "2020-01-01T00:00:00+0000")]),
        )
        .await
        .unwrap();
    storage
        .put(
            "nyt-ingest/most_popular_slim/2026-02-19/viewed_30.ndjson",
            ndjson(&[most_popular_record(1)]),
        )
        .await
        .unwrap();
    // Ignored: wrong extension, unknown prefix, undateable most-popular path.
    storage
        .put("nyt-ingest/archive_slim/2020/01.json", Bytes::from("{}"))
        .await
        .unwrap();
    storage
        .put("nyt-ingest/other/x.ndjson", Bytes::from("{}\n"))
        .await
        .unwrap();
    storage
        .put(
            "nyt-ingest/most_popular_slim/viewed_30.ndjson",
            ndjson(&[most_popular_record(2)]),
        )
        .await
        .unwrap();

    let report = BackfillDriver::new(loader).run().await.unwrap();

    assert_eq!(
        report,
        BackfillReport {
            archive_loaded: 1,
            archive_skipped: 0,
            most_popular_loaded: 1,
            most_popular_skipped: 0,
            errors: 0,
        }
    );
}

#[tokio::test]
async fn test_empty_prefix_is_a_clean_run() {
    let (_storage, _warehouse, loader) = setup().await;

    let report = BackfillDriver::new(loader).run().await.unwrap();
    assert_eq!(report, BackfillReport::default());
    assert!(!report.has_errors());
}

#[test]
fn test_report_summary_format() {
    let report = BackfillReport {
        archive_loaded: 3,
        archive_skipped: 2,
        most_popular_loaded: 1,
        most_popular_skipped: 0,
        errors: 1,
    };
    assert_eq!(
        report.to_string(),
        "archive_slim=3 (skipped=2), most_popular_slim=1 (skipped=0), errors=1"
    );
}
