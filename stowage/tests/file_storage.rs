//! Integration tests for the file storage service
//!
//! Runs the service against the filesystem backend and a SQLite record store.

use std::sync::Arc;
use stowage::config::StowageConfig;
use stowage::naming::NamingPolicy;
use stowage::prelude::*;
use stowage::testing::create_test_png;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    root: std::path::PathBuf,
    service: FileStorageService,
}

async fn fixture_with(config: &StowageConfig) -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("blobs");
    std::fs::create_dir_all(&root).unwrap();

    let blobs = LocalBlobStorage::new(root.clone()).unwrap();
    let db_url = format!("sqlite://{}", dir.path().join("stowage.db").display());
    let records = SqliteRecordStore::connect(&db_url).await.unwrap();
    records.migrate().await.unwrap();

    let service =
        FileStorageService::new(Arc::new(blobs), Arc::new(records)).with_config(config);
    Fixture {
        _dir: dir,
        root,
        service,
    }
}

async fn fixture() -> Fixture {
    fixture_with(&StowageConfig::default()).await
}

fn pdf(name: &str, path: &str) -> StoreRequest {
    StoreRequest::new(
        FileSource::upload(name, "application/pdf", b"%PDF-1.7 test".to_vec()),
        path,
    )
}

fn png(name: &str, width: u32, height: u32) -> FileSource {
    FileSource::upload(name, "image/png", create_test_png(width, height))
}

#[tokio::test]
async fn test_store_then_get_round_trip() {
    let fx = fixture().await;

    let stored = fx
        .service
        .store(pdf("Quarterly Report.pdf", "reports/2024").title("Q3 numbers"))
        .await
        .unwrap();
    let fetched = fx.service.get(&stored.uuid).await.unwrap();

    assert_eq!(fetched.uuid, stored.uuid);
    assert_eq!(fetched.name, "q3-numbers.pdf");
    assert_eq!(fetched.path, "reports/2024");
    assert_eq!(fetched.title.as_deref(), Some("Q3 numbers"));
    assert!(fx.root.join("reports/2024/q3-numbers.pdf").is_file());
}

#[tokio::test]
async fn test_identical_names_get_increasing_suffixes() {
    let fx = fixture().await;

    let first = fx.service.store(pdf("Test File.pdf", "a/b")).await.unwrap();
    let second = fx.service.store(pdf("Test File.pdf", "a/b")).await.unwrap();
    let third = fx.service.store(pdf("Test File.pdf", "a/b")).await.unwrap();

    assert_eq!(first.name, "test-file.pdf");
    assert_eq!(second.name, "test-file_1.pdf");
    assert_eq!(third.name, "test-file_2.pdf");
    assert_ne!(first.uuid, second.uuid);
}

#[tokio::test]
async fn test_delete_leaves_siblings_untouched() {
    let fx = fixture().await;

    let first = fx.service.store(pdf("Test File.pdf", "a/b")).await.unwrap();
    let second = fx.service.store(pdf("Test File.pdf", "a/b")).await.unwrap();

    fx.service.delete(&first.uuid).await.unwrap();

    assert!(!fx.root.join("a/b/test-file.pdf").exists());
    assert!(fx.root.join("a/b/test-file_1.pdf").is_file());
    assert!(fx.service.get(&first.uuid).await.unwrap_err().is_not_found());
    assert!(fx.service.get(&second.uuid).await.is_ok());
}

#[tokio::test]
async fn test_images_get_thumbnails_documents_do_not() {
    let fx = fixture().await;

    let image = fx
        .service
        .store(StoreRequest::new(png("photo.png", 40, 40), "media"))
        .await
        .unwrap();
    let doc = fx.service.store(pdf("doc.pdf", "media")).await.unwrap();

    assert!(fx.root.join("media/photo.png").is_file());
    assert!(fx.root.join("media/thumbs/photo.png").is_file());
    assert!(fx.root.join("media/doc.pdf").is_file());
    assert!(!fx.root.join("media/thumbs/doc.pdf").exists());

    assert!(fx.service.has_thumbnail(&image).await.unwrap());
    assert!(!fx.service.has_thumbnail(&doc).await.unwrap());
}

#[tokio::test]
async fn test_thumbnail_dimensions() {
    let fx = fixture().await;
    let processor = ImageProcessor::new();

    fx.service
        .store(StoreRequest::new(png("photo.png", 400, 800), "media"))
        .await
        .unwrap();
    let thumb = std::fs::read(fx.root.join("media/thumbs/photo.png")).unwrap();
    assert_eq!(processor.dimensions(&thumb).unwrap(), (300, 600));

    fx.service
        .store(StoreRequest::new(png("small.png", 100, 50), "media"))
        .await
        .unwrap();
    let thumb = std::fs::read(fx.root.join("media/thumbs/small.png")).unwrap();
    assert_eq!(processor.dimensions(&thumb).unwrap(), (100, 50));
}

#[tokio::test]
async fn test_delete_removes_blob_thumbnail_and_record() {
    let fx = fixture().await;

    let record = fx
        .service
        .store(StoreRequest::new(png("photo.png", 40, 40), "media"))
        .await
        .unwrap();
    fx.service.delete(&record.uuid).await.unwrap();

    assert!(!fx.root.join("media/photo.png").exists());
    assert!(!fx.root.join("media/thumbs/photo.png").exists());
    assert!(fx.service.get(&record.uuid).await.unwrap_err().is_not_found());
    assert!(fx.service.delete(&record.uuid).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_mismatched_image_content_is_rejected() {
    let fx = fixture().await;

    let err = fx
        .service
        .store(StoreRequest::new(
            FileSource::upload("photo.jpg", "image/jpeg", b"plain text".to_vec()),
            "media",
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, FileStorageError::InvalidSource(_)));
    assert!(!fx.root.join("media").exists());
    assert!(fx
        .service
        .search(&RecordFilter::new())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_adopting_an_existing_blob() {
    let fx = fixture().await;
    std::fs::create_dir_all(fx.root.join("inbox")).unwrap();
    std::fs::write(fx.root.join("inbox/Scan 2024.png"), create_test_png(600, 300)).unwrap();

    let record = fx
        .service
        .store(StoreRequest::new(
            FileSource::existing_blob("inbox/Scan 2024.png"),
            "archive",
        ))
        .await
        .unwrap();

    assert_eq!(record.name, "scan-2024.png");
    assert!(!fx.root.join("inbox/Scan 2024.png").exists());
    assert!(fx.root.join("archive/scan-2024.png").is_file());
    assert!(fx.root.join("archive/thumbs/scan-2024.png").is_file());
}

#[tokio::test]
async fn test_reject_policy_refuses_collisions() {
    let mut config = StowageConfig::default();
    config.naming.policy = NamingPolicy::Reject;
    let fx = fixture_with(&config).await;

    fx.service.store(pdf("a.pdf", "p")).await.unwrap();
    let err = fx.service.store(pdf("a.pdf", "p")).await.unwrap_err();

    assert!(matches!(err, FileStorageError::AlreadyExists { .. }));
    assert_eq!(fx.service.search(&RecordFilter::new()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_and_update() {
    let fx = fixture().await;

    let a = fx.service.store(pdf("a.pdf", "one")).await.unwrap();
    fx.service.store(pdf("b.pdf", "one")).await.unwrap();
    fx.service.store(pdf("a.pdf", "two")).await.unwrap();

    let in_one = fx
        .service
        .search(&RecordFilter::new().path("one"))
        .await
        .unwrap();
    assert_eq!(in_one.len(), 2);

    let named_a = fx
        .service
        .search(&RecordFilter::new().name("a.pdf"))
        .await
        .unwrap();
    assert_eq!(named_a.len(), 2);

    fx.service
        .update(&a.uuid, &RecordPatch::new().title("Alpha"))
        .await
        .unwrap();
    let by_title = fx
        .service
        .search(&RecordFilter::new().title("Alpha"))
        .await
        .unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].uuid, a.uuid);
    assert!(by_title[0].updated_at >= by_title[0].created_at);
}

#[tokio::test]
async fn test_concurrent_stores_pick_distinct_names() {
    let fx = Arc::new(fixture().await);

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let fx = Arc::clone(&fx);
            tokio::spawn(async move { fx.service.store(pdf("same.pdf", "p")).await.unwrap() })
        })
        .collect();

    let mut names = Vec::new();
    for handle in handles {
        names.push(handle.await.unwrap().name);
    }
    names.sort();

    assert_eq!(
        names,
        vec!["same.pdf", "same_1.pdf", "same_2.pdf", "same_3.pdf", "same_4.pdf"]
    );
}

#[tokio::test]
async fn test_url_and_size_helpers() {
    let fx = fixture().await;

    let record = fx.service.store(pdf("doc.pdf", "docs")).await.unwrap();

    assert_eq!(fx.service.url(&record).await.unwrap(), "/storage/docs/doc.pdf");
    assert_eq!(fx.service.size(&record).await.unwrap(), 13);
    assert_eq!(fx.service.human_size(&record).await.unwrap().to_string(), "13 B");
    assert_eq!(fx.service.mime_type(&record).await.unwrap(), "application/pdf");
    assert_eq!(fx.service.thumbnail_url(&record).await.unwrap(), None);
}

fn plain(name: &str, path: &str) -> StoreRequest {
    StoreRequest::new(FileSource::upload(name, "text/plain", b"notes".to_vec()), path)
}

#[tokio::test]
async fn test_file_named_like_thumbnail_dir_after_an_image() {
    let fx = fixture().await;

    let image = fx
        .service
        .store(StoreRequest::new(png("photo.png", 40, 40), "media"))
        .await
        .unwrap();
    let notes = fx.service.store(plain("Thumbs", "media")).await.unwrap();

    assert_eq!(notes.name, "thumbs_1");
    assert!(fx.root.join("media/thumbs_1").is_file());
    assert!(fx.root.join("media/thumbs/photo.png").is_file());
    assert!(fx.service.has_thumbnail(&image).await.unwrap());
}

#[tokio::test]
async fn test_image_after_file_named_like_thumbnail_dir() {
    let fx = fixture().await;

    let notes = fx.service.store(plain("thumbs", "media")).await.unwrap();
    let image = fx
        .service
        .store(StoreRequest::new(png("photo.png", 40, 40), "media"))
        .await
        .unwrap();

    assert_eq!(notes.name, "thumbs_1");
    assert_eq!(image.name, "photo.png");
    assert!(fx.root.join("media/thumbs/photo.png").is_file());
    assert!(fx.service.has_thumbnail(&image).await.unwrap());
    assert_eq!(fx.service.get(&notes.uuid).await.unwrap().name, "thumbs_1");
}
