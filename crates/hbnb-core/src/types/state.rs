//! State records

use super::{BaseFields, Entity, Kind, Model};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub name: String,
}

impl Model for State {
    const KIND: Kind = Kind::State;
    const REQUIRED: &'static [&'static str] = &["name"];
    const CREATE_FIELDS: &'static [&'static str] = &["name"];
    const UPDATE_FIELDS: &'static [&'static str] = &["name"];

    fn base(&self) -> &BaseFields {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseFields {
        &mut self.base
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::State(state) => Some(state),
            _ => None,
        }
    }
}

impl From<State> for Entity {
    fn from(state: State) -> Self {
        Entity::State(state)
    }
}
