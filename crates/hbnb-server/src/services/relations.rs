//! Relationship resolver: parent -> dependents (State -> Cities,
//! City -> Places, Place -> Reviews)

use hbnb_core::{Entity, Kind, Storage};
use std::sync::Arc;
use tracing::debug;

/// How dependents are found, fixed when the resolver is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Read the engine's live back-reference index.
    BackReference,
    /// Filter every entity of the dependent kind by foreign key.
    Scan,
}

pub struct RelationResolver {
    storage: Arc<dyn Storage>,
    strategy: Strategy,
}

impl RelationResolver {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let strategy = if storage.has_back_references() {
            Strategy::BackReference
        } else {
            Strategy::Scan
        };
        debug!(
            "Relation resolver for {} storage uses {:?}",
            storage.name(),
            strategy
        );
        Self { storage, strategy }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Dependents of `parent` of the given kind, in insertion order.
    pub fn children(&self, parent: &Entity, kind: Kind) -> Vec<Entity> {
        match self.strategy {
            Strategy::BackReference => self.storage.back_references(parent, kind),
            Strategy::Scan => scan(&*self.storage, parent, kind),
        }
    }
}

/// Every entity of `kind` whose foreign key names `parent`.
pub fn scan(storage: &dyn Storage, parent: &Entity, kind: Kind) -> Vec<Entity> {
    storage
        .all(Some(kind))
        .into_iter()
        .filter(|child| child.parent() == Some((parent.kind(), parent.id())))
        .collect()
}
