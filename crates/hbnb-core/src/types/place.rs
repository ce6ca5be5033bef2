//! Place types

use super::{BaseFields, Entity, Kind, Model};
use serde::{Deserialize, Serialize};

/// A rentable place in a city, owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub city_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub number_rooms: i64,
    #[serde(default)]
    pub number_bathrooms: i64,
    #[serde(default)]
    pub max_guest: i64,
    #[serde(default)]
    pub price_by_night: i64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// Descriptive fields a client may set at creation or later.
const DESCRIPTIVE: &[&str] = &[
    "name",
    "description",
    "number_rooms",
    "number_bathrooms",
    "max_guest",
    "price_by_night",
    "latitude",
    "longitude",
];

impl Model for Place {
    const KIND: Kind = Kind::Place;
    const REQUIRED: &'static [&'static str] = &["user_id", "name"];
    const CREATE_FIELDS: &'static [&'static str] = &[
        "user_id",
        "name",
        "description",
        "number_rooms",
        "number_bathrooms",
        "max_guest",
        "price_by_night",
        "latitude",
        "longitude",
    ];
    const UPDATE_FIELDS: &'static [&'static str] = DESCRIPTIVE;

    fn base(&self) -> &BaseFields {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseFields {
        &mut self.base
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Place(place) => Some(place),
            _ => None,
        }
    }
}

impl From<Place> for Entity {
    fn from(place: Place) -> Self {
        Entity::Place(place)
    }
}
