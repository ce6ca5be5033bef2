//! Review types

use super::{BaseFields, Entity, Kind, Model};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub text: String,
}

impl Model for Review {
    const KIND: Kind = Kind::Review;
    const REQUIRED: &'static [&'static str] = &["user_id", "text"];
    const CREATE_FIELDS: &'static [&'static str] = &["user_id", "text"];
    const UPDATE_FIELDS: &'static [&'static str] = &["text"];

    fn base(&self) -> &BaseFields {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseFields {
        &mut self.base
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Review(review) => Some(review),
            _ => None,
        }
    }
}

impl From<Review> for Entity {
    fn from(review: Review) -> Self {
        Entity::Review(review)
    }
}
