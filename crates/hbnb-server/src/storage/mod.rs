//! Storage layer
//!
//! Two engines behind the `Storage` port: a JSON file (default) and an
//! embedded SQLite database. Both keep the same in-memory index.

pub mod db;
pub mod file;
pub mod index;

pub use db::DbStorage;
pub use file::FileStorage;
pub use index::Index;

use crate::config::{ServerConfig, StorageType};
use hbnb_core::{Result, Storage};
use std::sync::Arc;

/// Open the engine selected by configuration and load its contents.
pub async fn open(config: &ServerConfig) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.type_storage {
        StorageType::File => Arc::new(FileStorage::open(&config.file_path)),
        StorageType::Db => Arc::new(DbStorage::open(&config.database_path).await?),
    };
    storage.reload().await?;
    Ok(storage)
}
