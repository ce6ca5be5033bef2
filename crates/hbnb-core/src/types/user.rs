//! User types

use super::{BaseFields, Entity, Kind, Model};
use serde::{Deserialize, Serialize};

/// User account
///
/// `email` is fixed once the account exists. `password` holds whatever the
/// server stored (a hash, in practice) and is never rendered publicly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Model for User {
    const KIND: Kind = Kind::User;
    const REQUIRED: &'static [&'static str] = &["email", "password"];
    const CREATE_FIELDS: &'static [&'static str] = &["email", "password", "first_name", "last_name"];
    const UPDATE_FIELDS: &'static [&'static str] = &["password", "first_name", "last_name"];

    fn base(&self) -> &BaseFields {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseFields {
        &mut self.base
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::User(user) => Some(user),
            _ => None,
        }
    }
}

impl From<User> for Entity {
    fn from(user: User) -> Self {
        Entity::User(user)
    }
}
