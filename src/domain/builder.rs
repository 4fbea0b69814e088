//! Hierarchy builder: materializes a tree from an import document.
//!
//! The whole tree is built into a detached `Hierarchy` first; callers only
//! insert it into a store once building succeeded, so a rejected document
//! never leaves a partial tree behind.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::domain::arena::SectionArena;
use crate::domain::block::{AttachedBlock, BlockRegistry};
use crate::domain::document::{BlockDocument, HierarchyDocument, SectionDocument};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::hierarchy::Hierarchy;
use crate::domain::ids::{BlockId, HierarchyId, SectionId};
use crate::domain::section::{Section, ROOT_LABEL};
use crate::domain::slug::SlugPolicy;

/// Constructs hierarchies from documents.
pub struct HierarchyBuilder<'a> {
    registry: &'a BlockRegistry,
    policy: &'a SlugPolicy,
    preserve_ids: bool,
    seen_sections: HashSet<SectionId>,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(registry: &'a BlockRegistry, policy: &'a SlugPolicy) -> Self {
        Self {
            registry,
            policy,
            preserve_ids: false,
            seen_sections: HashSet::new(),
        }
    }

    /// Keep ids found in the document (snapshot restore). User imports
    /// always get fresh identities. A restore also accepts stored slugs
    /// longer than the current maximum.
    pub fn preserve_ids(mut self, preserve: bool) -> Self {
        self.preserve_ids = preserve;
        self
    }

    #[instrument(level = "debug", skip(self, document), fields(name = %document.name))]
    pub fn build(&mut self, document: &HierarchyDocument) -> DomainResult<Hierarchy> {
        self.seen_sections.clear();

        let name = document.name.trim();
        if name.is_empty() {
            return Err(DomainError::import("/", "hierarchy name is empty"));
        }
        let slug = if document.slug.trim().is_empty() {
            self.policy.slugify(name)
        } else {
            document.slug.trim().to_string()
        };
        self.check_slug(&slug)
            .map_err(|e| DomainError::import("/", format!("hierarchy slug: {e}")))?;

        let root_doc = &document.root;
        if !root_doc.slug.is_empty() {
            return Err(DomainError::import("/", "root section must have an empty slug"));
        }
        let root_label = if root_doc.label.is_empty() {
            ROOT_LABEL
        } else {
            root_doc.label.as_str()
        };
        let mut root = Section::with_id(self.section_id(root_doc, "/")?, root_label, "");
        root.unlocked = root_doc.unlocked;

        let id = match (self.preserve_ids, document.id) {
            (true, Some(id)) => id,
            _ => HierarchyId::new(),
        };
        let mut hierarchy =
            Hierarchy::from_parts(id, name, slug, &document.base_url, SectionArena::new(root));
        let root_id = hierarchy.root_id();
        self.attach_blocks(&mut hierarchy, root_id, &root_doc.pageblocks, "/")?;

        let root_idx = hierarchy.sections.root();
        let mut stack: Vec<(&SectionDocument, _, String)> = root_doc
            .children
            .iter()
            .rev()
            .map(|child| (child, root_idx, String::from("/")))
            .collect();

        while let Some((doc, parent_idx, parent_path)) = stack.pop() {
            let slug = self.child_slug(doc, &parent_path)?;
            let path = format!("{parent_path}{slug}/");

            let mut section = Section::with_id(self.section_id(doc, &path)?, doc.label.clone(), slug);
            section.unlocked = doc.unlocked;
            let section_id = section.id;

            let idx = hierarchy
                .attach_section(parent_idx, section, self.policy)
                .map_err(|e| match e {
                    DomainError::Import { .. } => e,
                    other => DomainError::import(path.clone(), other.to_string()),
                })?;
            self.attach_blocks(&mut hierarchy, section_id, &doc.pageblocks, &path)?;

            // Push children in reverse order so they are attached in document order
            for child in doc.children.iter().rev() {
                stack.push((child, idx, path.clone()));
            }
        }

        debug!(sections = hierarchy.len(), "built hierarchy");
        Ok(hierarchy)
    }

    fn child_slug(&self, doc: &SectionDocument, parent_path: &str) -> DomainResult<String> {
        let explicit = doc.slug.trim();
        let slug = if explicit.is_empty() {
            self.policy.slugify(&doc.label)
        } else {
            explicit.to_string()
        };
        self.check_slug(&slug).map_err(|e| {
            DomainError::import(format!("{parent_path}{}", doc.label), e.to_string())
        })?;
        Ok(slug)
    }

    fn check_slug(&self, slug: &str) -> DomainResult<()> {
        if self.preserve_ids {
            self.policy.validate_format(slug)
        } else {
            self.policy.validate(slug)
        }
    }

    fn section_id(&mut self, doc: &SectionDocument, path: &str) -> DomainResult<SectionId> {
        let id = match (self.preserve_ids, doc.id) {
            (true, Some(id)) => id,
            _ => SectionId::new(),
        };
        if !self.seen_sections.insert(id) {
            return Err(DomainError::import(path, format!("duplicate section id {id}")));
        }
        Ok(id)
    }

    fn attach_blocks(
        &self,
        hierarchy: &mut Hierarchy,
        section: SectionId,
        blocks: &[BlockDocument],
        path: &str,
    ) -> DomainResult<()> {
        for (i, doc) in blocks.iter().enumerate() {
            let content = self
                .registry
                .import(&doc.block_type, &doc.payload)
                .map_err(|e| DomainError::import(format!("{path}#{}", i + 1), e.0))?;
            let id = match (self.preserve_ids, doc.id) {
                (true, Some(id)) => id,
                _ => BlockId::new(),
            };
            hierarchy.push_block(
                section,
                AttachedBlock {
                    id,
                    label: doc.label.clone(),
                    css_extra: doc.css_extra.clone(),
                    ordinality: 0,
                    content,
                },
            )?;
        }
        Ok(())
    }
}
