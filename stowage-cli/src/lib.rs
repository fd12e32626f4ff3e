//! stowage CLI library

#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

pub mod commands;
pub mod output;

use anyhow::{Context, Result};
use std::sync::Arc;
use stowage::config::StowageConfig;
use stowage::records::SqliteRecordStore;
use stowage::service::FileStorageService;
use stowage::storage::LocalBlobStorage;

pub use commands::FilesCommand;

/// Opens the filesystem-backed service described by `config`
///
/// Creates the storage root and database if needed and applies pending
/// migrations.
///
/// # Errors
///
/// Returns an error if the storage root is not a usable directory, the
/// database cannot be opened, or a migration fails
pub async fn open_service(config: &StowageConfig) -> Result<FileStorageService> {
    let root = &config.storage.root;
    tokio::fs::create_dir_all(root)
        .await
        .with_context(|| format!("Failed to create storage root {}", root.display()))?;

    let blobs = LocalBlobStorage::new(root.clone())?
        .with_url_prefix(config.storage.url_prefix.clone());

    let records = open_records(config).await?;

    tracing::debug!(root = %root.display(), "opened file storage");
    Ok(FileStorageService::new(Arc::new(blobs), Arc::new(records)).with_config(config))
}

/// Connects to the configured database and applies pending migrations
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a migration fails
pub async fn open_records(config: &StowageConfig) -> Result<SqliteRecordStore> {
    let records = SqliteRecordStore::connect(&config.database.url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    records
        .migrate()
        .await
        .context("Failed to apply database migrations")?;
    Ok(records)
}
