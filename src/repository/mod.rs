//! Repository Layer
//!
//! Backend access for ordered catalog lists.

mod traits;
mod wire;
mod http_repo;
mod cached_repo;
mod memory_repo;

#[cfg(test)]
pub(crate) mod testing;

pub use traits::PositionRepository;
pub use wire::{parse_list, SortOrderBody};
pub use http_repo::HttpRepository;
pub use cached_repo::CachedRepository;
pub use memory_repo::MemoryRepository;
