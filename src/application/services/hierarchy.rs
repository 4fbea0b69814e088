//! Hierarchy service
//!
//! Structural mutations of the tree store. Every successful mutation
//! invalidates the owning hierarchy's cache entries while the write guard is
//! still held.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::cache::TraversalCache;
use crate::application::services::SharedStore;
use crate::application::ApplicationResult;
use crate::domain::{
    BlockId, BlockPayload, BlockRegistry, BlockView, DomainError, DomainResult, Hierarchy,
    HierarchyId, RemovedSubtree, SectionId, TreeStore,
};
use crate::infrastructure::traits::ProgressStore;

/// Listing entry for one hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchySummary {
    pub id: HierarchyId,
    pub name: String,
    pub slug: String,
    pub base_url: String,
    pub sections: usize,
    pub depth: usize,
}

impl HierarchySummary {
    fn of(hierarchy: &Hierarchy) -> Self {
        Self {
            id: hierarchy.id(),
            name: hierarchy.name().to_string(),
            slug: hierarchy.slug().to_string(),
            base_url: hierarchy.base_url().to_string(),
            sections: hierarchy.len(),
            depth: hierarchy.depth(),
        }
    }
}

/// Service for creating and editing hierarchies and their sections.
pub struct HierarchyService {
    store: SharedStore,
    cache: Arc<TraversalCache>,
    progress: Arc<dyn ProgressStore>,
    registry: Arc<BlockRegistry>,
}

impl HierarchyService {
    pub fn new(
        store: SharedStore,
        cache: Arc<TraversalCache>,
        progress: Arc<dyn ProgressStore>,
        registry: Arc<BlockRegistry>,
    ) -> Self {
        Self {
            store,
            cache,
            progress,
            registry,
        }
    }

    /// Run `op` under the write guard and invalidate the hierarchy owning
    /// `section` if it succeeds.
    fn mutate_section<T>(
        &self,
        section: SectionId,
        op: impl FnOnce(&mut TreeStore) -> DomainResult<T>,
    ) -> ApplicationResult<T> {
        let mut store = self.store.write();
        let owner = store.owner_of(section)?;
        let result = op(&mut store)?;
        self.cache.invalidate_hierarchy(owner);
        Ok(result)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn create_hierarchy(&self, name: &str, base_url: &str) -> ApplicationResult<HierarchyId> {
        let mut store = self.store.write();
        let id = store.create_hierarchy(name, base_url)?;
        self.cache.invalidate_hierarchy(id);
        Ok(id)
    }

    pub fn list(&self) -> Vec<HierarchySummary> {
        let store = self.store.read();
        store
            .hierarchies()
            .into_iter()
            .map(HierarchySummary::of)
            .collect()
    }

    pub fn summary(&self, hierarchy: HierarchyId) -> ApplicationResult<HierarchySummary> {
        let store = self.store.read();
        Ok(HierarchySummary::of(store.hierarchy(hierarchy)?))
    }

    /// Resolve a hierarchy by slug or id.
    pub fn resolve(&self, key: &str) -> ApplicationResult<HierarchyId> {
        let store = self.store.read();
        if let Ok(found) = store.hierarchy_by_slug(key) {
            return Ok(found.id());
        }
        let id = Uuid::parse_str(key)
            .ok()
            .and_then(|uuid| {
                store
                    .hierarchies()
                    .into_iter()
                    .find(|h| h.id().as_uuid() == &uuid)
                    .map(Hierarchy::id)
            })
            .ok_or_else(|| DomainError::hierarchy_not_found(key))?;
        Ok(id)
    }

    /// Resolve a section by slug path (`"intro/part-1"`, `""` for the root).
    pub fn resolve_section(&self, hierarchy: HierarchyId, path: &str) -> ApplicationResult<SectionId> {
        let store = self.store.read();
        Ok(store.hierarchy(hierarchy)?.section_by_path(path)?)
    }

    pub fn root(&self, hierarchy: HierarchyId) -> ApplicationResult<SectionId> {
        let store = self.store.read();
        Ok(store.get_root(hierarchy)?.id)
    }

    /// Run `f` against a hierarchy under the read guard.
    pub fn with_hierarchy<R>(
        &self,
        hierarchy: HierarchyId,
        f: impl FnOnce(&Hierarchy) -> R,
    ) -> ApplicationResult<R> {
        let store = self.store.read();
        Ok(f(store.hierarchy(hierarchy)?))
    }

    /// Remove the tree together with its progress records and cache entries.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_hierarchy(&self, hierarchy: HierarchyId) -> ApplicationResult<()> {
        let mut store = self.store.write();
        store.delete_hierarchy(hierarchy)?;
        let purged = self.progress.purge_hierarchy(hierarchy);
        self.cache.forget_hierarchy(hierarchy);
        debug!(purged, "deleted hierarchy");
        Ok(())
    }

    pub fn add_child(
        &self,
        parent: SectionId,
        label: &str,
        slug: Option<&str>,
    ) -> ApplicationResult<SectionId> {
        self.mutate_section(parent, |store| store.add_child(parent, label, slug))
    }

    pub fn update_section(
        &self,
        section: SectionId,
        label: Option<&str>,
        slug: Option<&str>,
    ) -> ApplicationResult<()> {
        self.mutate_section(section, |store| store.update_section(section, label, slug))
    }

    pub fn set_unlocked(&self, section: SectionId, unlocked: bool) -> ApplicationResult<()> {
        self.mutate_section(section, |store| store.set_unlocked(section, unlocked))
    }

    pub fn move_section(
        &self,
        section: SectionId,
        new_parent: SectionId,
        position: usize,
    ) -> ApplicationResult<()> {
        self.mutate_section(section, |store| {
            store.move_section(section, new_parent, position)
        })
    }

    pub fn reorder_children(&self, parent: SectionId, order: &[SectionId]) -> ApplicationResult<()> {
        self.mutate_section(parent, |store| store.reorder_children(parent, order))
    }

    /// Cascading delete followed by progress repair: locations inside the
    /// removed subtree move to the surviving ancestor, visits are dropped.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_section(&self, section: SectionId) -> ApplicationResult<RemovedSubtree> {
        let mut store = self.store.write();
        let removed = store.delete_section(section)?;
        let repaired = self.progress.reassign_locations(
            removed.hierarchy,
            &removed.removed,
            removed.surviving_ancestor,
        );
        let purged = self.progress.purge_sections(&removed.removed);
        self.cache.invalidate_hierarchy(removed.hierarchy);
        debug!(
            removed = removed.removed.len(),
            repaired, purged, "deleted section"
        );
        Ok(removed)
    }

    /// Import a block of `block_type` from `payload` and append it.
    pub fn append_block(
        &self,
        section: SectionId,
        label: &str,
        css_extra: &str,
        block_type: &str,
        payload: &BlockPayload,
    ) -> ApplicationResult<BlockId> {
        let content = self
            .registry
            .import(block_type, payload)
            .map_err(|e| DomainError::import(format!("{section}#new"), e.0))?;
        self.mutate_section(section, |store| {
            store.append_block(section, label, css_extra, content)
        })
    }

    pub fn remove_block(&self, section: SectionId, block: BlockId) -> ApplicationResult<()> {
        self.mutate_section(section, |store| store.remove_block(section, block).map(|_| ()))
    }

    pub fn reorder_blocks(&self, section: SectionId, order: &[BlockId]) -> ApplicationResult<()> {
        self.mutate_section(section, |store| store.reorder_blocks(section, order))
    }

    pub fn blocks(&self, section: SectionId) -> ApplicationResult<Vec<BlockView>> {
        let store = self.store.read();
        let blocks = store.hierarchy_of(section)?.blocks(section)?;
        Ok(blocks.iter().map(|b| b.view()).collect())
    }

    pub fn block_types(&self) -> Vec<String> {
        self.registry
            .available()
            .into_iter()
            .map(String::from)
            .collect()
    }
}
