//! Domain Layer
//!
//! Catalog entities, resequencing scopes and core errors.
//! This layer has NO I/O (only serde for serialization).

mod error;
mod catalog;
mod item;

pub use error::{DomainError, DomainResult};
pub use catalog::{CatalogResource, ScopeContext};
pub use item::{Item, MoveRequest, RemoteRecord};
