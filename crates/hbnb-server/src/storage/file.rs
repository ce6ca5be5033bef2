//! JSON file storage engine
//!
//! The whole index is serialized as one JSON object of
//! `"<Class>.<id>"` -> entity, rewritten in full on every save.

use super::index::Index;
use async_trait::async_trait;
use hbnb_core::{Entity, HbnbError, Kind, Result, Storage};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct FileStorage {
    path: PathBuf,
    index: RwLock<Index>,
    writer: Mutex<()>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            index: RwLock::new(Index::new()),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "storage.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Storage for FileStorage {
    fn name(&self) -> &'static str {
        "file"
    }

    fn all(&self, kind: Option<Kind>) -> Vec<Entity> {
        self.index.read().values(kind)
    }

    fn get(&self, kind: Kind, id: &str) -> Option<Entity> {
        self.index.read().get(kind, id).cloned()
    }

    fn new(&self, entity: Entity) {
        self.index.write().insert(entity);
    }

    fn delete(&self, entity: &Entity) {
        self.index.write().remove(entity.kind(), entity.id());
    }

    fn count(&self, kind: Option<Kind>) -> usize {
        self.index.read().count(kind)
    }

    fn has_back_references(&self) -> bool {
        false
    }

    fn back_references(&self, _parent: &Entity, _kind: Kind) -> Vec<Entity> {
        Vec::new()
    }

    async fn save(&self) -> Result<()> {
        // Hold the writer lock across snapshot and rename so the last
        // completed write always reflects the latest index.
        let _guard = self.writer.lock().await;
        let entities = self.index.read().values(None);

        let mut objects = Map::new();
        for entity in &entities {
            objects.insert(entity.key(), serde_json::to_value(entity)?);
        }
        let content = serde_json::to_vec(&Value::Object(objects))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.temp_path();
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&content).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!(
            "Saved {} objects to {}",
            entities.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No storage file at {}, starting empty", self.path.display());
                self.index.write().replace_all(Vec::new());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            self.index.write().replace_all(Vec::new());
            return Ok(());
        }

        let objects: Map<String, Value> = serde_json::from_str(&content)?;
        let mut entities = Vec::with_capacity(objects.len());
        for (key, value) in objects {
            let entity: Entity = serde_json::from_value(value)
                .map_err(|e| HbnbError::Serialization(format!("{}: {}", key, e)))?;
            if entity.key() != key {
                warn!("Stored key {} does not match object {}", key, entity.key());
            }
            entities.push(entity);
        }

        info!(
            "Loaded {} objects from {}",
            entities.len(),
            self.path.display()
        );
        self.index.write().replace_all(entities);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
