use super::{BaseFields, Entity, Kind, Model};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub name: String,
}

impl Model for Amenity {
    const KIND: Kind = Kind::Amenity;
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
            Entity::Amenity(amenity) => Some(amenity),
            _ => None,
        }
    }
}

impl From<Amenity> for Entity {
    fn from(amenity: Amenity) -> Self {
        Entity::Amenity(amenity)
    }
}
