//! One independent content tree and its structural operations.

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::SectionArena;
use crate::domain::block::{AttachedBlock, PageBlock};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::{BlockId, HierarchyId, SectionId};
use crate::domain::section::Section;
use crate::domain::slug::SlugPolicy;

/// Sections removed by a cascading delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedSubtree {
    pub hierarchy: HierarchyId,
    /// Removed section ids, descendants before ancestors
    pub removed: Vec<SectionId>,
    /// Parent of the deleted section; always survives the delete
    pub surviving_ancestor: SectionId,
}

/// A hierarchy owns exactly one root section and everything below it.
#[derive(Debug)]
pub struct Hierarchy {
    id: HierarchyId,
    name: String,
    slug: String,
    base_url: String,
    pub(crate) sections: SectionArena,
}

impl Hierarchy {
    /// New hierarchy with a fresh root section.
    pub fn new(name: impl Into<String>, slug: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::from_parts(
            HierarchyId::new(),
            name,
            slug,
            base_url,
            SectionArena::new(Section::root()),
        )
    }

    pub(crate) fn from_parts(
        id: HierarchyId,
        name: impl Into<String>,
        slug: impl Into<String>,
        base_url: impl Into<String>,
        sections: SectionArena,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            base_url: normalize_base_url(&base_url.into()),
            sections,
        }
    }

    pub fn id(&self) -> HierarchyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn root(&self) -> &Section {
        // the root is never removed
        self.sections
            .get(self.sections.root())
            .expect("hierarchy always has a root section")
    }

    pub fn root_id(&self) -> SectionId {
        self.root().id
    }

    pub fn contains(&self, id: SectionId) -> bool {
        self.sections.contains(id)
    }

    pub fn section(&self, id: SectionId) -> DomainResult<&Section> {
        self.index(id)
            .and_then(|idx| self.sections.get(idx).ok_or_else(|| DomainError::section_not_found(id)))
    }

    pub(crate) fn index(&self, id: SectionId) -> DomainResult<Index> {
        self.sections
            .index_of(id)
            .ok_or_else(|| DomainError::section_not_found(id))
    }

    pub(crate) fn node(&self, idx: Index) -> DomainResult<&Section> {
        self.sections
            .get(idx)
            .ok_or_else(|| DomainError::section_not_found(format!("{idx:?}")))
    }

    fn section_mut(&mut self, id: SectionId) -> DomainResult<&mut Section> {
        let idx = self.index(id)?;
        self.sections
            .get_mut(idx)
            .ok_or_else(|| DomainError::section_not_found(id))
    }

    pub fn parent_of(&self, id: SectionId) -> DomainResult<Option<SectionId>> {
        let section = self.section(id)?;
        Ok(section.parent.and_then(|p| self.sections.id_of(p)))
    }

    pub fn children_of(&self, id: SectionId) -> DomainResult<Vec<SectionId>> {
        let section = self.section(id)?;
        Ok(self.ids(&section.children))
    }

    /// Children of the root.
    pub fn top_level(&self) -> Vec<SectionId> {
        self.ids(&self.root().children)
    }

    pub(crate) fn ids(&self, indices: &[Index]) -> Vec<SectionId> {
        indices
            .iter()
            .filter_map(|&i| self.sections.id_of(i))
            .collect()
    }

    fn ensure_unique_slug(&self, parent: Index, slug: &str, except: Option<Index>) -> DomainResult<()> {
        let parent_node = self.node(parent)?;
        let taken = parent_node
            .children
            .iter()
            .filter(|&&c| Some(c) != except)
            .filter_map(|&c| self.sections.get(c))
            .any(|c| c.slug == slug);
        if taken {
            return Err(DomainError::DuplicateSlug {
                slug: slug.to_string(),
                parent: parent_node.id.to_string(),
            });
        }
        Ok(())
    }

    /// Append a new child section. The slug defaults to the slugified label
    /// and is truncated to the policy's maximum length.
    #[instrument(level = "debug", skip(self, policy), fields(hierarchy = %self.id))]
    pub fn add_child(
        &mut self,
        parent: SectionId,
        label: &str,
        slug: Option<&str>,
        policy: &SlugPolicy,
    ) -> DomainResult<SectionId> {
        let parent_idx = self.index(parent)?;
        let slug = policy.for_new_section(label, slug)?;
        self.ensure_unique_slug(parent_idx, &slug, None)?;
        let section = Section::new(label, slug);
        let id = section.id;
        self.sections
            .insert_child(parent_idx, section, None)
            .ok_or_else(|| DomainError::section_not_found(parent))?;
        debug!(section = %id, "added section");
        Ok(id)
    }

    /// Insert a fully formed section (used by builders that preserve ids).
    /// The caller decides whether the slug length bound applies.
    pub(crate) fn attach_section(
        &mut self,
        parent: Index,
        section: Section,
        policy: &SlugPolicy,
    ) -> DomainResult<Index> {
        policy.validate_format(&section.slug)?;
        self.ensure_unique_slug(parent, &section.slug, None)?;
        if self.sections.contains(section.id) {
            return Err(DomainError::import(
                section.slug.clone(),
                format!("duplicate section id {}", section.id),
            ));
        }
        let id = section.id;
        self.sections
            .insert_child(parent, section, None)
            .ok_or_else(|| DomainError::section_not_found(id))
    }

    /// Change label and/or slug. A new slug is validated, never truncated.
    #[instrument(level = "debug", skip(self, policy), fields(hierarchy = %self.id))]
    pub fn update_section(
        &mut self,
        id: SectionId,
        label: Option<&str>,
        slug: Option<&str>,
        policy: &SlugPolicy,
    ) -> DomainResult<()> {
        let idx = self.index(id)?;
        if let Some(slug) = slug {
            let parent = self.node(idx)?.parent.ok_or(DomainError::RootSection {
                section: id,
                action: "renamed",
            })?;
            policy.validate(slug)?;
            self.ensure_unique_slug(parent, slug, Some(idx))?;
        }
        let section = self.section_mut(id)?;
        if let Some(label) = label {
            section.label = label.to_string();
        }
        if let Some(slug) = slug {
            section.slug = slug.to_string();
        }
        Ok(())
    }

    pub fn set_unlocked(&mut self, id: SectionId, unlocked: bool) -> DomainResult<()> {
        self.section_mut(id)?.unlocked = unlocked;
        Ok(())
    }

    /// Move `id` (with its subtree) below `new_parent` at `position`
    /// (clamped to the number of children).
    #[instrument(level = "debug", skip(self), fields(hierarchy = %self.id))]
    pub fn move_section(
        &mut self,
        id: SectionId,
        new_parent: SectionId,
        position: usize,
    ) -> DomainResult<()> {
        let idx = self.index(id)?;
        let parent_idx = self.index(new_parent).map_err(|_| DomainError::InvalidMove {
            section: id,
            reason: format!("target parent {new_parent} is not in this hierarchy"),
        })?;
        let node = self.node(idx)?;
        if node.is_root() {
            return Err(DomainError::RootSection {
                section: id,
                action: "moved",
            });
        }
        if self.sections.is_ancestor_or_self(idx, parent_idx) {
            return Err(DomainError::InvalidMove {
                section: id,
                reason: format!("target parent {new_parent} is inside the moved subtree"),
            });
        }
        let slug = node.slug.clone();
        self.ensure_unique_slug(parent_idx, &slug, Some(idx))?;
        self.sections.reparent(idx, parent_idx, position);
        Ok(())
    }

    /// Reorder the children of `parent`. `order` must be a permutation of the
    /// current children.
    pub fn reorder_children(&mut self, parent: SectionId, order: &[SectionId]) -> DomainResult<()> {
        let parent_idx = self.index(parent)?;
        let current = self.node(parent_idx)?.children.clone();
        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            match self.sections.index_of(*id) {
                Some(idx) if current.contains(&idx) && !reordered.contains(&idx) => {
                    reordered.push(idx)
                }
                _ => {
                    return Err(DomainError::InvalidMove {
                        section: *id,
                        reason: format!("not a unique child of {parent}"),
                    })
                }
            }
        }
        if reordered.len() != current.len() {
            return Err(DomainError::InvalidMove {
                section: parent,
                reason: format!(
                    "expected {} children in new order, got {}",
                    current.len(),
                    reordered.len()
                ),
            });
        }
        self.sections.set_children(parent_idx, reordered);
        Ok(())
    }

    /// Delete a section, its descendants and their blocks.
    #[instrument(level = "debug", skip(self), fields(hierarchy = %self.id))]
    pub fn remove_section(&mut self, id: SectionId) -> DomainResult<RemovedSubtree> {
        let idx = self.index(id)?;
        let parent = self.node(idx)?.parent.ok_or(DomainError::RootSection {
            section: id,
            action: "deleted",
        })?;
        let surviving_ancestor = self.node(parent)?.id;
        let removed: Vec<SectionId> = self
            .sections
            .remove_subtree(idx)
            .into_iter()
            .map(|s| s.id)
            .collect();
        debug!(count = removed.len(), "removed sections");
        Ok(RemovedSubtree {
            hierarchy: self.id,
            removed,
            surviving_ancestor,
        })
    }

    pub fn blocks(&self, section: SectionId) -> DomainResult<&[AttachedBlock]> {
        Ok(self.section(section)?.blocks())
    }

    /// Attach a block after the existing ones.
    pub fn append_block(
        &mut self,
        section: SectionId,
        label: &str,
        css_extra: &str,
        content: Box<dyn PageBlock>,
    ) -> DomainResult<BlockId> {
        let target = self.section_mut(section)?;
        let id = BlockId::new();
        target.blocks.push(AttachedBlock {
            id,
            label: label.to_string(),
            css_extra: css_extra.to_string(),
            ordinality: target.blocks.len() as u32 + 1,
            content,
        });
        Ok(id)
    }

    pub(crate) fn push_block(&mut self, section: SectionId, block: AttachedBlock) -> DomainResult<()> {
        let target = self.section_mut(section)?;
        target.blocks.push(block);
        target.renumber_blocks();
        Ok(())
    }

    /// Detach a block and renumber the remaining ones.
    pub fn remove_block(&mut self, section: SectionId, block: BlockId) -> DomainResult<AttachedBlock> {
        let target = self.section_mut(section)?;
        let pos = target
            .blocks
            .iter()
            .position(|b| b.id == block)
            .ok_or_else(|| DomainError::block_not_found(block))?;
        let removed = target.blocks.remove(pos);
        target.renumber_blocks();
        Ok(removed)
    }

    /// Reorder blocks; `order` must list every block exactly once.
    pub fn reorder_blocks(&mut self, section: SectionId, order: &[BlockId]) -> DomainResult<()> {
        let target = self.section_mut(section)?;
        if order.len() != target.blocks.len() || !order.iter().all_unique() {
            return Err(DomainError::InvalidMove {
                section,
                reason: "block order must list every block exactly once".to_string(),
            });
        }
        let mut remaining = std::mem::take(&mut target.blocks);
        for id in order {
            match remaining.iter().position(|b| b.id == *id) {
                Some(pos) => target.blocks.push(remaining.remove(pos)),
                None => {
                    target.blocks.append(&mut remaining);
                    target.renumber_blocks();
                    return Err(DomainError::block_not_found(*id));
                }
            }
        }
        target.renumber_blocks();
        Ok(())
    }

    /// Resolve a slug path (`"a/b/"`, leading and trailing slashes ignored).
    pub fn find_by_path(&self, path: &str) -> Option<SectionId> {
        let mut current = self.sections.root();
        for slug in path.split('/').filter(|s| !s.is_empty()) {
            let node = self.sections.get(current)?;
            current = node
                .children
                .iter()
                .copied()
                .find(|&c| self.sections.get(c).is_some_and(|s| s.slug == slug))?;
        }
        self.sections.id_of(current)
    }

    pub fn section_by_path(&self, path: &str) -> DomainResult<SectionId> {
        self.find_by_path(path)
            .ok_or_else(|| DomainError::section_not_found(format!("{}:{path}", self.slug)))
    }

    /// Slug path relative to the hierarchy, e.g. `intro/part-1/`; empty for the root.
    pub fn path_of(&self, id: SectionId) -> DomainResult<String> {
        let idx = self.index(id)?;
        let mut chain = self.sections.ancestors(idx);
        chain.push(idx);
        let path = chain
            .iter()
            .filter_map(|&i| self.sections.get(i))
            .filter(|s| !s.is_root())
            .map(|s| format!("{}/", s.slug))
            .join("");
        Ok(path)
    }

    /// `base_url` joined with the section path.
    pub fn absolute_url(&self, id: SectionId) -> DomainResult<String> {
        Ok(format!("{}{}", self.base_url, self.path_of(id)?))
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}
