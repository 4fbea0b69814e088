//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic, owns the traversal cache and
//! depends on I/O boundary traits.

pub mod cache;
pub mod error;
pub mod services;

pub use cache::{CacheStats, TraversalCache};
pub use error::{ApplicationError, ApplicationResult};
