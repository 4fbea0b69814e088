//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services share one tree store behind a read/write lock, the traversal
//! cache and the progress store (an I/O boundary trait), but are themselves
//! concrete structs, not traits.

mod gating;
mod hierarchy;
mod navigation;
mod versioning;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::application::cache::TraversalCache;
use crate::domain::{DomainResult, HierarchyId, SectionId, TreeStore};

pub use gating::{GatingService, VisitReport};
pub use hierarchy::{HierarchyService, HierarchySummary};
pub use navigation::{NavigationService, PageView};
pub use versioning::VersioningService;

/// The tree store shared by all services.
///
/// Readers run concurrently; writers are exclusive and invalidate the cache
/// before releasing the guard.
pub type SharedStore = Arc<RwLock<TreeStore>>;

pub fn shared_store(store: TreeStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}

/// Flattened order of `hierarchy`, computed from `store` on a cache miss.
/// `store` must be borrowed from a held guard.
pub(crate) fn cached_order(
    cache: &TraversalCache,
    store: &TreeStore,
    hierarchy: HierarchyId,
) -> DomainResult<Arc<Vec<SectionId>>> {
    let tree = store.hierarchy(hierarchy)?;
    Ok(cache.flattened(hierarchy, || tree.flatten().collect()))
}
