//! In-memory entity index shared by the storage engines

use hbnb_core::{composite_key, Entity, Kind};
use std::collections::HashMap;

/// Entities keyed by `"<Class>.<id>"`, remembering insertion order.
///
/// With back-references enabled the index also tracks, for every parent key,
/// the keys of the entities pointing at it, in insertion order.
pub struct Index {
    entries: HashMap<String, Slot>,
    next_seq: u64,
    back_refs: Option<HashMap<String, Vec<String>>>,
}

struct Slot {
    seq: u64,
    entity: Entity,
}

impl Index {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
            back_refs: None,
        }
    }

    pub fn with_back_references() -> Self {
        Self {
            back_refs: Some(HashMap::new()),
            ..Self::new()
        }
    }

    pub fn has_back_references(&self) -> bool {
        self.back_refs.is_some()
    }

    /// Insert or replace. A replaced entity keeps its position.
    pub fn insert(&mut self, entity: Entity) {
        let key = entity.key();
        let new_parent = parent_key(&entity);

        match self.entries.get_mut(&key) {
            Some(slot) => {
                let old_parent = parent_key(&slot.entity);
                slot.entity = entity;
                if old_parent != new_parent {
                    self.unlink(old_parent.as_deref(), &key);
                    self.link(new_parent, key);
                }
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.insert(key.clone(), Slot { seq, entity });
                self.link(new_parent, key);
            }
        }
    }

    pub fn remove(&mut self, kind: Kind, id: &str) -> Option<Entity> {
        let key = composite_key(kind, id);
        let slot = self.entries.remove(&key)?;
        self.unlink(parent_key(&slot.entity).as_deref(), &key);
        Some(slot.entity)
    }

    pub fn get(&self, kind: Kind, id: &str) -> Option<&Entity> {
        self.entries
            .get(&composite_key(kind, id))
            .map(|slot| &slot.entity)
    }

    /// Entities in insertion order, optionally of one kind.
    pub fn values(&self, kind: Option<Kind>) -> Vec<Entity> {
        let mut slots: Vec<&Slot> = self
            .entries
            .values()
            .filter(|slot| kind.map_or(true, |k| slot.entity.kind() == k))
            .collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.entity.clone()).collect()
    }

    pub fn count(&self, kind: Option<Kind>) -> usize {
        match kind {
            None => self.entries.len(),
            Some(kind) => self
                .entries
                .values()
                .filter(|slot| slot.entity.kind() == kind)
                .count(),
        }
    }

    /// Dependents of `parent` of the given kind, or `None` without back-references.
    pub fn children(&self, parent: &Entity, kind: Kind) -> Option<Vec<Entity>> {
        let back_refs = self.back_refs.as_ref()?;
        let children = back_refs
            .get(&parent.key())
            .map(|keys| {
                keys.iter()
                    .filter_map(|key| self.entries.get(key))
                    .map(|slot| slot.entity.clone())
                    .filter(|entity| entity.kind() == kind)
                    .collect()
            })
            .unwrap_or_default();
        Some(children)
    }

    /// Drop everything and load `entities` in the given order.
    pub fn replace_all(&mut self, entities: impl IntoIterator<Item = Entity>) {
        self.entries.clear();
        self.next_seq = 0;
        if let Some(back_refs) = self.back_refs.as_mut() {
            back_refs.clear();
        }
        for entity in entities {
            self.insert(entity);
        }
    }

    fn link(&mut self, parent_key: Option<String>, key: String) {
        if let (Some(back_refs), Some(parent_key)) = (self.back_refs.as_mut(), parent_key) {
            back_refs.entry(parent_key).or_default().push(key);
        }
    }

    fn unlink(&mut self, parent_key: Option<&str>, key: &str) {
        if let (Some(back_refs), Some(parent_key)) = (self.back_refs.as_mut(), parent_key) {
            if let Some(keys) = back_refs.get_mut(parent_key) {
                keys.retain(|k| k != key);
                if keys.is_empty() {
                    back_refs.remove(parent_key);
                }
            }
        }
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_key(entity: &Entity) -> Option<String> {
    entity
        .parent()
        .map(|(kind, id)| composite_key(kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbnb_core::{City, Model, State};
    use serde_json::json;

    fn state(name: &str) -> State {
        State::build(json!({ "name": name }).as_object().unwrap(), &[]).unwrap()
    }

    fn city(name: &str, state_id: &str) -> City {
        City::build(
            json!({ "name": name }).as_object().unwrap(),
            &[("state_id", state_id)],
        )
        .unwrap()
    }

    #[test]
    fn test_insertion_order_survives_replace() {
        let mut index = Index::new();
        let a = state("A");
        let b = state("B");
        index.insert(a.clone().into());
        index.insert(b.clone().into());

        let mut renamed = a.clone();
        renamed.name = "AA".to_string();
        index.insert(renamed.into());

        let names: Vec<String> = index
            .values(Some(Kind::State))
            .into_iter()
            .filter_map(State::from_entity)
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["AA", "B"]);
        assert_eq!(index.count(None), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut index = Index::new();
        let s = state("Nevada");
        index.insert(s.clone().into());

        assert!(index.remove(Kind::State, &s.base.id).is_some());
        assert!(index.remove(Kind::State, &s.base.id).is_none());
        assert!(index.get(Kind::State, &s.base.id).is_none());
    }

    #[test]
    fn test_children_without_back_references() {
        let mut index = Index::new();
        let s = state("Oregon");
        index.insert(s.clone().into());
        assert!(index.children(&s.into(), Kind::City).is_none());
    }

    #[test]
    fn test_children_track_inserts_and_removes() {
        let mut index = Index::with_back_references();
        let s = state("Texas");
        let austin = city("Austin", &s.base.id);
        let dallas = city("Dallas", &s.base.id);
        let elsewhere = city("Reno", "other-state");
        index.insert(s.clone().into());
        index.insert(austin.clone().into());
        index.insert(elsewhere.into());
        index.insert(dallas.clone().into());

        let parent: Entity = s.into();
        let ids: Vec<String> = index
            .children(&parent, Kind::City)
            .unwrap()
            .iter()
            .map(|e| e.id().to_string())
            .collect();
        assert_eq!(ids, vec![austin.base.id.clone(), dallas.base.id.clone()]);

        index.remove(Kind::City, &austin.base.id);
        let remaining = index.children(&parent, Kind::City).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), dallas.base.id);
    }

    #[test]
    fn test_orphans_stay_linked_after_parent_removal() {
        let mut index = Index::with_back_references();
        let s = state("Utah");
        let c = city("Provo", &s.base.id);
        index.insert(s.clone().into());
        index.insert(c.clone().into());

        index.remove(Kind::State, &s.base.id);
        assert!(index.get(Kind::City, &c.base.id).is_some());
        assert_eq!(index.children(&s.into(), Kind::City).unwrap().len(), 1);
    }
}
