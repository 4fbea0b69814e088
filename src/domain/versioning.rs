//! Deep copies of whole hierarchies.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::domain::arena::SectionArena;
use crate::domain::block::{AttachedBlock, BlockRegistry};
use crate::domain::document::export_block;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::hierarchy::Hierarchy;
use crate::domain::ids::{BlockId, HierarchyId};
use crate::domain::section::Section;

impl Hierarchy {
    /// Copy the tree into a new, fully independent hierarchy.
    ///
    /// Every section gets a new identity with the same label, slug, unlocked
    /// flag and position. Blocks are duplicated through export/import so
    /// their payload semantics survive without the tree understanding them.
    /// The copy is built detached; on any block failure it is dropped and
    /// the error returned.
    #[instrument(level = "debug", skip(self, registry), fields(source = %self.id()))]
    pub fn duplicate(
        &self,
        name: &str,
        slug: &str,
        registry: &BlockRegistry,
    ) -> DomainResult<Hierarchy> {
        let source_root = self.root();
        let mut root = Section::new(source_root.label.clone(), "");
        root.unlocked = source_root.unlocked;
        root.blocks = copy_blocks(source_root, registry)?;

        let mut arena = SectionArena::new(root);
        let mut mapping = HashMap::from([(self.sections.root(), arena.root())]);

        // pre-order guarantees a parent is copied before its children
        for (idx, section) in self.sections.iter().skip(1) {
            let parent = section
                .parent
                .and_then(|p| mapping.get(&p).copied())
                .ok_or_else(|| DomainError::section_not_found(section.id))?;
            let mut copy = Section::new(section.label.clone(), section.slug.clone());
            copy.unlocked = section.unlocked;
            copy.blocks = copy_blocks(section, registry)?;
            let new_idx = arena
                .insert_child(parent, copy, None)
                .ok_or_else(|| DomainError::section_not_found(section.id))?;
            mapping.insert(idx, new_idx);
        }

        debug!(sections = arena.len(), "copied hierarchy");
        Ok(Hierarchy::from_parts(
            HierarchyId::new(),
            name,
            slug,
            self.base_url(),
            arena,
        ))
    }
}

fn copy_blocks(section: &Section, registry: &BlockRegistry) -> DomainResult<Vec<AttachedBlock>> {
    section
        .blocks()
        .iter()
        .map(|block| -> DomainResult<AttachedBlock> {
            let document = export_block(block, false)?;
            let content = registry
                .import(&document.block_type, &document.payload)
                .map_err(|e| DomainError::ExportFailure {
                    block: block.id,
                    block_type: document.block_type.clone(),
                    reason: format!("re-import failed: {e}"),
                })?;
            Ok(AttachedBlock {
                id: BlockId::new(),
                label: document.label,
                css_extra: document.css_extra,
                ordinality: block.ordinality,
                content,
            })
        })
        .collect()
}
