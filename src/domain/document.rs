//! Structured export document mirroring the section tree.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::block::{AttachedBlock, BlockPayload};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::hierarchy::Hierarchy;
use crate::domain::ids::{BlockId, HierarchyId, SectionId};
use crate::domain::section::Section;

/// A whole hierarchy as a nested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyDocument {
    /// Present only in persistence snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<HierarchyId>,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub root: SectionDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SectionId>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unlocked: bool,
    #[serde(default)]
    pub pageblocks: Vec<BlockDocument>,
    #[serde(default)]
    pub children: Vec<SectionDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BlockId>,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub css_extra: String,
    pub payload: BlockPayload,
}

fn default_base_url() -> String {
    "/".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SectionDocument {
    /// Number of sections in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(SectionDocument::count).sum::<usize>()
    }
}

/// Export one block through its capability contract.
pub fn export_block(block: &AttachedBlock, with_ids: bool) -> DomainResult<BlockDocument> {
    let payload = block
        .content
        .export()
        .map_err(|e| DomainError::ExportFailure {
            block: block.id,
            block_type: block.block_type().to_string(),
            reason: e.0,
        })?;
    Ok(BlockDocument {
        id: with_ids.then_some(block.id),
        block_type: block.block_type().to_string(),
        label: block.label.clone(),
        css_extra: block.css_extra.clone(),
        payload,
    })
}

impl Hierarchy {
    /// Serialize the tree and block payloads. Fails as a whole if any block
    /// cannot export.
    #[instrument(level = "debug", skip(self), fields(hierarchy = %self.id()))]
    pub fn export(&self, with_ids: bool) -> DomainResult<HierarchyDocument> {
        let root = self.export_section(self.root(), with_ids)?;
        Ok(HierarchyDocument {
            id: with_ids.then_some(self.id()),
            name: self.name().to_string(),
            slug: self.slug().to_string(),
            base_url: self.base_url().to_string(),
            root,
        })
    }

    fn export_section(&self, section: &Section, with_ids: bool) -> DomainResult<SectionDocument> {
        let pageblocks = section
            .blocks()
            .iter()
            .map(|b| export_block(b, with_ids))
            .collect::<DomainResult<Vec<_>>>()?;
        let children = section
            .children
            .iter()
            .map(|&c| self.node(c).and_then(|child| self.export_section(child, with_ids)))
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(SectionDocument {
            id: with_ids.then_some(section.id),
            label: section.label.clone(),
            slug: section.slug.clone(),
            unlocked: section.unlocked,
            pageblocks,
            children,
        })
    }
}
