//! City records

use super::{BaseFields, Entity, Kind, Model};
use serde::{Deserialize, Serialize};

/// A city within a state. `state_id` is assigned from the request path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub state_id: String,
    #[serde(default)]
    pub name: String,
}

impl Model for City {
    const KIND: Kind = Kind::City;
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
            Entity::City(city) => Some(city),
            _ => None,
        }
    }
}

impl From<City> for Entity {
    fn from(city: City) -> Self {
        Entity::City(city)
    }
}
