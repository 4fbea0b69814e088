//! Section nodes.

use std::fmt;

use generational_arena::Index;

use crate::domain::block::AttachedBlock;
use crate::domain::ids::{SectionId, UserId};

/// Label given to every hierarchy root.
pub const ROOT_LABEL: &str = "Root";

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct Section {
    /// Stable identity of this section
    pub id: SectionId,
    /// Display label
    pub label: String,
    /// URL component, unique among siblings (empty for the root)
    pub slug: String,
    /// Unlocked sections bypass gating
    pub unlocked: bool,
    /// Index of parent node in the arena, None for the root
    pub(crate) parent: Option<Index>,
    /// Indices of child nodes in the arena, in stored order
    pub(crate) children: Vec<Index>,
    /// Blocks ordered by ordinality
    pub(crate) blocks: Vec<AttachedBlock>,
}

impl Section {
    pub fn new(label: impl Into<String>, slug: impl Into<String>) -> Self {
        Self::with_id(SectionId::new(), label, slug)
    }

    pub fn with_id(id: SectionId, label: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            slug: slug.into(),
            unlocked: false,
            parent: None,
            children: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_LABEL, "")
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn blocks(&self) -> &[AttachedBlock] {
        &self.blocks
    }

    /// Every block lets `user` proceed past this page.
    pub fn blocks_unlocked(&self, user: &UserId) -> bool {
        self.blocks.iter().all(|b| b.content.unlocked(user))
    }

    pub fn needs_submit(&self) -> bool {
        self.blocks.iter().any(|b| b.content.needs_submit())
    }

    /// Renumber blocks 1..n in their current order.
    pub(crate) fn renumber_blocks(&mut self) {
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.ordinality = i as u32 + 1;
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.slug.is_empty() {
            write!(f, "{}", self.label)
        } else {
            write!(f, "{} ({})", self.label, self.slug)
        }
    }
}
