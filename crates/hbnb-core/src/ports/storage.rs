//! Storage port for entity persistence

use crate::types::{Entity, Kind, Model};
use crate::Result;
use async_trait::async_trait;

/// Authoritative store of every entity, keyed by `"<Class>.<id>"`.
///
/// `new` and `delete` only touch the in-memory index; nothing is durable
/// until `save` rewrites the backing medium as a whole.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &'static str;

    /// Every stored entity in insertion order, optionally restricted to one kind.
    fn all(&self, kind: Option<Kind>) -> Vec<Entity>;

    fn get(&self, kind: Kind, id: &str) -> Option<Entity>;

    /// Insert or replace an entity in the index. Does not persist.
    fn new(&self, entity: Entity);

    /// Remove an entity from the index if present. Does not persist.
    fn delete(&self, entity: &Entity);

    fn count(&self, kind: Option<Kind>) -> usize;

    /// Whether the engine maintains a live back-reference index.
    fn has_back_references(&self) -> bool;

    /// Live dependents of `parent` in insertion order. Only meaningful when
    /// `has_back_references` is true; other engines return nothing.
    fn back_references(&self, parent: &Entity, kind: Kind) -> Vec<Entity>;

    /// Rewrite the backing medium from the in-memory index.
    async fn save(&self) -> Result<()>;

    /// Repopulate the index from the backing medium.
    async fn reload(&self) -> Result<()>;

    /// Release per-request resources.
    async fn close(&self) -> Result<()>;
}

/// Typed lookup: `get` followed by a downcast to the model.
pub fn fetch<T: Model>(storage: &dyn Storage, id: &str) -> Option<T> {
    storage.get(T::KIND, id).and_then(T::from_entity)
}
