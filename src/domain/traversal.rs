//! Depth-first navigation over a hierarchy.
//!
//! The canonical order is pre-order with children in stored order. These
//! methods work directly on the tree; the application layer caches the
//! flattened order and derives next/previous from it.

use generational_arena::Index;

use crate::domain::arena::PreOrderIter;
use crate::domain::error::DomainResult;
use crate::domain::hierarchy::Hierarchy;
use crate::domain::ids::SectionId;

/// Lazy pre-order walk over section ids. Restart by calling `flatten` again.
pub struct Flatten<'a> {
    inner: PreOrderIter<'a>,
}

impl Iterator for Flatten<'_> {
    type Item = SectionId;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, section)| section.id)
    }
}

impl Hierarchy {
    /// Whole tree in depth-first pre-order, root first.
    pub fn flatten(&self) -> Flatten<'_> {
        Flatten {
            inner: self.sections.iter(),
        }
    }

    /// Subtree below `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: SectionId) -> DomainResult<Vec<SectionId>> {
        let idx = self.index(id)?;
        Ok(self.sections.iter_from(idx).skip(1).map(|(_, s)| s.id).collect())
    }

    /// Section following `id` in pre-order, None for the last one.
    pub fn next_section(&self, id: SectionId) -> DomainResult<Option<SectionId>> {
        let idx = self.index(id)?;
        let node = self.node(idx)?;
        if let Some(&first) = node.children.first() {
            return Ok(self.sections.id_of(first));
        }
        let mut current = idx;
        while let Some(parent) = self.node(current)?.parent {
            if let Some(sibling) = self.sibling_after(parent, current)? {
                return Ok(self.sections.id_of(sibling));
            }
            current = parent;
        }
        Ok(None)
    }

    /// Section preceding `id` in pre-order. The root is a container, not a
    /// page, so it is never returned: the first top-level section has no
    /// previous section.
    pub fn previous_section(&self, id: SectionId) -> DomainResult<Option<SectionId>> {
        let idx = self.index(id)?;
        let Some(parent) = self.node(idx)?.parent else {
            return Ok(None);
        };
        let siblings = &self.node(parent)?.children;
        let pos = siblings.iter().position(|&c| c == idx).unwrap_or(0);
        if pos > 0 {
            let last = self.last_leaf_index(siblings[pos - 1])?;
            return Ok(self.sections.id_of(last));
        }
        if self.node(parent)?.is_root() {
            return Ok(None);
        }
        Ok(self.sections.id_of(parent))
    }

    /// Ancestors ordered from the root down to the parent; empty for the root.
    pub fn ancestors(&self, id: SectionId) -> DomainResult<Vec<SectionId>> {
        let idx = self.index(id)?;
        Ok(self.ids(&self.sections.ancestors(idx)))
    }

    /// Adjacent last children, starting at `id` and walking upward until a
    /// section that is not the last child (or the root) is reached.
    ///
    /// A renderer that emits the flattened order as nested lists closes one
    /// list level for every entry.
    pub fn closing_children(&self, id: SectionId) -> DomainResult<Vec<SectionId>> {
        let mut closing = Vec::new();
        let mut current = self.index(id)?;
        loop {
            let node = self.node(current)?;
            let Some(parent) = node.parent else { break };
            if self.node(parent)?.children.last() != Some(&current) {
                break;
            }
            closing.push(node.id);
            current = parent;
        }
        Ok(closing)
    }

    pub fn is_first_child(&self, id: SectionId) -> DomainResult<bool> {
        let idx = self.index(id)?;
        match self.node(idx)?.parent {
            Some(parent) => Ok(self.node(parent)?.children.first() == Some(&idx)),
            None => Ok(true),
        }
    }

    pub fn is_last_child(&self, id: SectionId) -> DomainResult<bool> {
        let idx = self.index(id)?;
        match self.node(idx)?.parent {
            Some(parent) => Ok(self.node(parent)?.children.last() == Some(&idx)),
            None => Ok(true),
        }
    }

    /// First leaf reached by always descending into the first child.
    pub fn first_leaf(&self, id: SectionId) -> DomainResult<SectionId> {
        let mut current = self.index(id)?;
        while let Some(&first) = self.node(current)?.children.first() {
            current = first;
        }
        Ok(self.node(current)?.id)
    }

    /// Last leaf reached by always descending into the last child.
    pub fn last_leaf(&self, id: SectionId) -> DomainResult<SectionId> {
        let idx = self.index(id)?;
        let last = self.last_leaf_index(idx)?;
        Ok(self.node(last)?.id)
    }

    /// Top-level section containing `id` (a child of the root); None for the root.
    pub fn module_of(&self, id: SectionId) -> DomainResult<Option<SectionId>> {
        let idx = self.index(id)?;
        if self.node(idx)?.is_root() {
            return Ok(None);
        }
        let chain = self.sections.ancestors(idx);
        let module = chain.get(1).copied().unwrap_or(idx);
        Ok(self.sections.id_of(module))
    }

    /// Depth of `id`; the root has depth 1.
    pub fn depth_of(&self, id: SectionId) -> DomainResult<usize> {
        let idx = self.index(id)?;
        Ok(self.sections.ancestors(idx).len() + 1)
    }

    /// Height of the whole tree (root-only tree has depth 1).
    pub fn depth(&self) -> usize {
        self.sections.depth()
    }

    /// Sections without children, in pre-order.
    pub fn leaves(&self) -> Vec<SectionId> {
        self.sections
            .iter()
            .filter(|(_, s)| s.is_leaf())
            .map(|(_, s)| s.id)
            .collect()
    }

    fn sibling_after(&self, parent: Index, child: Index) -> DomainResult<Option<Index>> {
        let siblings = &self.node(parent)?.children;
        Ok(siblings
            .iter()
            .position(|&c| c == child)
            .and_then(|pos| siblings.get(pos + 1))
            .copied())
    }

    fn last_leaf_index(&self, start: Index) -> DomainResult<Index> {
        let mut current = start;
        while let Some(&last) = self.node(current)?.children.last() {
            current = last;
        }
        Ok(current)
    }
}
