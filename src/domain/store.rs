//! Tree node store: every hierarchy plus a section → hierarchy index.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::domain::block::{AttachedBlock, BlockRegistry, PageBlock};
use crate::domain::builder::HierarchyBuilder;
use crate::domain::document::HierarchyDocument;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::hierarchy::{Hierarchy, RemovedSubtree};
use crate::domain::ids::{BlockId, HierarchyId, SectionId};
use crate::domain::section::Section;
use crate::domain::slug::SlugPolicy;

/// In-memory store of hierarchies.
///
/// Sections are addressed globally by id; the store knows which hierarchy
/// owns each one. Hierarchy slugs are unique across the store.
#[derive(Debug, Default)]
pub struct TreeStore {
    hierarchies: HashMap<HierarchyId, Hierarchy>,
    owners: HashMap<SectionId, HierarchyId>,
    policy: SlugPolicy,
}

impl TreeStore {
    pub fn new(policy: SlugPolicy) -> Self {
        Self {
            hierarchies: HashMap::new(),
            owners: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &SlugPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.hierarchies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hierarchies.is_empty()
    }

    /// Hierarchies sorted by slug.
    pub fn hierarchies(&self) -> Vec<&Hierarchy> {
        let mut all: Vec<&Hierarchy> = self.hierarchies.values().collect();
        all.sort_by(|a, b| a.slug().cmp(b.slug()));
        all
    }

    pub fn hierarchy(&self, id: HierarchyId) -> DomainResult<&Hierarchy> {
        self.hierarchies
            .get(&id)
            .ok_or_else(|| DomainError::hierarchy_not_found(id))
    }

    fn hierarchy_mut(&mut self, id: HierarchyId) -> DomainResult<&mut Hierarchy> {
        self.hierarchies
            .get_mut(&id)
            .ok_or_else(|| DomainError::hierarchy_not_found(id))
    }

    pub fn hierarchy_by_slug(&self, slug: &str) -> DomainResult<&Hierarchy> {
        self.hierarchies
            .values()
            .find(|h| h.slug() == slug)
            .ok_or_else(|| DomainError::hierarchy_not_found(slug))
    }

    /// Hierarchy owning `section`.
    pub fn owner_of(&self, section: SectionId) -> DomainResult<HierarchyId> {
        self.owners
            .get(&section)
            .copied()
            .ok_or_else(|| DomainError::section_not_found(section))
    }

    pub fn hierarchy_of(&self, section: SectionId) -> DomainResult<&Hierarchy> {
        self.hierarchy(self.owner_of(section)?)
    }

    fn hierarchy_of_mut(&mut self, section: SectionId) -> DomainResult<&mut Hierarchy> {
        let owner = self.owner_of(section)?;
        self.hierarchy_mut(owner)
    }

    pub fn get_root(&self, hierarchy: HierarchyId) -> DomainResult<&Section> {
        Ok(self.hierarchy(hierarchy)?.root())
    }

    pub fn get_section(&self, section: SectionId) -> DomainResult<&Section> {
        self.hierarchy_of(section)?.section(section)
    }

    fn ensure_slug_available(&self, slug: &str) -> DomainResult<()> {
        if self.hierarchies.values().any(|h| h.slug() == slug) {
            return Err(DomainError::DuplicateSlug {
                slug: slug.to_string(),
                parent: "store".to_string(),
            });
        }
        Ok(())
    }

    /// Create an empty hierarchy (root only). The slug is derived from the name.
    #[instrument(level = "debug", skip(self))]
    pub fn create_hierarchy(&mut self, name: &str, base_url: &str) -> DomainResult<HierarchyId> {
        let slug = self.policy.for_new_section(name, None)?;
        self.insert(Hierarchy::new(name, slug, base_url))
    }

    /// Take ownership of a detached hierarchy (copy, import, restore).
    pub fn insert(&mut self, hierarchy: Hierarchy) -> DomainResult<HierarchyId> {
        self.ensure_slug_available(hierarchy.slug())?;
        if self.hierarchies.contains_key(&hierarchy.id()) {
            return Err(DomainError::import(
                "/",
                format!("hierarchy {} already exists", hierarchy.id()),
            ));
        }
        if let Some(clash) = hierarchy.flatten().find(|s| self.owners.contains_key(s)) {
            return Err(DomainError::import(
                "/",
                format!("section {clash} already exists"),
            ));
        }
        let id = hierarchy.id();
        for section in hierarchy.flatten() {
            self.owners.insert(section, id);
        }
        debug!(hierarchy = %id, slug = hierarchy.slug(), sections = hierarchy.len(), "inserted hierarchy");
        self.hierarchies.insert(id, hierarchy);
        Ok(id)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn delete_hierarchy(&mut self, id: HierarchyId) -> DomainResult<Hierarchy> {
        let hierarchy = self
            .hierarchies
            .remove(&id)
            .ok_or_else(|| DomainError::hierarchy_not_found(id))?;
        self.owners.retain(|_, owner| *owner != id);
        Ok(hierarchy)
    }

    pub fn add_child(
        &mut self,
        parent: SectionId,
        label: &str,
        slug: Option<&str>,
    ) -> DomainResult<SectionId> {
        let owner = self.owner_of(parent)?;
        let policy = self.policy.clone();
        let id = self
            .hierarchy_mut(owner)?
            .add_child(parent, label, slug, &policy)?;
        self.owners.insert(id, owner);
        Ok(id)
    }

    pub fn update_section(
        &mut self,
        section: SectionId,
        label: Option<&str>,
        slug: Option<&str>,
    ) -> DomainResult<()> {
        let policy = self.policy.clone();
        self.hierarchy_of_mut(section)?
            .update_section(section, label, slug, &policy)
    }

    pub fn set_unlocked(&mut self, section: SectionId, unlocked: bool) -> DomainResult<()> {
        self.hierarchy_of_mut(section)?.set_unlocked(section, unlocked)
    }

    /// Move within one hierarchy; moving into another hierarchy is rejected.
    pub fn move_section(
        &mut self,
        section: SectionId,
        new_parent: SectionId,
        position: usize,
    ) -> DomainResult<()> {
        let owner = self.owner_of(section)?;
        if self.owner_of(new_parent)? != owner {
            return Err(DomainError::InvalidMove {
                section,
                reason: "sections cannot move between hierarchies".to_string(),
            });
        }
        self.hierarchy_mut(owner)?
            .move_section(section, new_parent, position)
    }

    pub fn reorder_children(&mut self, parent: SectionId, order: &[SectionId]) -> DomainResult<()> {
        self.hierarchy_of_mut(parent)?.reorder_children(parent, order)
    }

    pub fn delete_section(&mut self, section: SectionId) -> DomainResult<RemovedSubtree> {
        let removed = self.hierarchy_of_mut(section)?.remove_section(section)?;
        for id in &removed.removed {
            self.owners.remove(id);
        }
        Ok(removed)
    }

    pub fn append_block(
        &mut self,
        section: SectionId,
        label: &str,
        css_extra: &str,
        content: Box<dyn PageBlock>,
    ) -> DomainResult<BlockId> {
        self.hierarchy_of_mut(section)?
            .append_block(section, label, css_extra, content)
    }

    pub fn remove_block(&mut self, section: SectionId, block: BlockId) -> DomainResult<AttachedBlock> {
        self.hierarchy_of_mut(section)?.remove_block(section, block)
    }

    pub fn reorder_blocks(&mut self, section: SectionId, order: &[BlockId]) -> DomainResult<()> {
        self.hierarchy_of_mut(section)?.reorder_blocks(section, order)
    }

    /// Deep copy `source` into a new hierarchy named `name`.
    pub fn copy_hierarchy(
        &mut self,
        source: HierarchyId,
        name: &str,
        registry: &BlockRegistry,
    ) -> DomainResult<HierarchyId> {
        let slug = self.policy.for_new_section(name, None)?;
        self.ensure_slug_available(&slug)?;
        let copy = self.hierarchy(source)?.duplicate(name, &slug, registry)?;
        self.insert(copy)
    }

    /// Build and insert a hierarchy from a document; nothing is inserted on error.
    pub fn import(
        &mut self,
        document: &HierarchyDocument,
        registry: &BlockRegistry,
        preserve_ids: bool,
    ) -> DomainResult<HierarchyId> {
        let hierarchy = HierarchyBuilder::new(registry, &self.policy)
            .preserve_ids(preserve_ids)
            .build(document)?;
        self.insert(hierarchy).map_err(|e| match e {
            DomainError::Import { .. } => e,
            other => DomainError::import("/", other.to_string()),
        })
    }
}
