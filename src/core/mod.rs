//! Core traits and types: entity identity, store capability, errors

pub mod entity;
pub mod error;
pub mod store;

pub use entity::Entity;
pub use error::RestError;
pub use store::{EntityStore, Payload, Record};
