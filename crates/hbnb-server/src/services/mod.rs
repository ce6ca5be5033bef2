//! Business logic services

pub mod password;
pub mod relations;

pub use relations::{RelationResolver, Strategy};
