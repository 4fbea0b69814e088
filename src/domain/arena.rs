use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::ids::SectionId;
use crate::domain::section::Section;

/// Arena-based tree structure for one hierarchy.
///
/// Uses a generational arena for memory-safe node references and O(1) lookups.
/// Parents and children refer to each other by arena index only, so there is
/// no ownership cycle between them. A second map resolves stable section ids
/// to indices.
#[derive(Debug)]
pub struct SectionArena {
    /// Arena storage for all tree nodes
    arena: Arena<Section>,
    /// Index of the root node; a tree always has one
    root: Index,
    /// Section id to arena index
    lookup: HashMap<SectionId, Index>,
}

impl SectionArena {
    pub fn new(root: Section) -> Self {
        let mut arena = Arena::new();
        let id = root.id;
        let root_idx = arena.insert(Section {
            parent: None,
            children: Vec::new(),
            ..root
        });
        Self {
            arena,
            root: root_idx,
            lookup: HashMap::from([(id, root_idx)]),
        }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn index_of(&self, id: SectionId) -> Option<Index> {
        self.lookup.get(&id).copied()
    }

    pub fn contains(&self, id: SectionId) -> bool {
        self.lookup.contains_key(&id)
    }

    pub fn get(&self, idx: Index) -> Option<&Section> {
        self.arena.get(idx)
    }

    pub fn get_mut(&mut self, idx: Index) -> Option<&mut Section> {
        self.arena.get_mut(idx)
    }

    pub fn id_of(&self, idx: Index) -> Option<SectionId> {
        self.arena.get(idx).map(|s| s.id)
    }

    /// Insert `section` under `parent` at `position` (clamped; None appends).
    ///
    /// Returns None when the parent does not exist.
    #[instrument(level = "trace", skip(self, section), fields(section = %section.id))]
    pub fn insert_child(
        &mut self,
        parent: Index,
        section: Section,
        position: Option<usize>,
    ) -> Option<Index> {
        if !self.arena.contains(parent) {
            return None;
        }
        let id = section.id;
        let node_idx = self.arena.insert(Section {
            parent: Some(parent),
            children: Vec::new(),
            ..section
        });
        self.lookup.insert(id, node_idx);
        self.link_child(parent, node_idx, position);
        Some(node_idx)
    }

    /// Move a subtree below another parent. The caller guarantees that
    /// `new_parent` is not inside the moved subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn reparent(&mut self, idx: Index, new_parent: Index, position: usize) {
        self.unlink_child(idx);
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = Some(new_parent);
        }
        self.link_child(new_parent, idx, Some(position));
    }

    /// Replace the children order of `parent`. The caller guarantees the new
    /// order is a permutation of the existing children.
    pub fn set_children(&mut self, parent: Index, children: Vec<Index>) {
        if let Some(node) = self.arena.get_mut(parent) {
            node.children = children;
        }
    }

    /// Remove a node and all of its descendants. Returns the removed sections
    /// in post-order (children before parents).
    #[instrument(level = "trace", skip(self))]
    pub fn remove_subtree(&mut self, idx: Index) -> Vec<Section> {
        let doomed: Vec<Index> = self.iter_postorder_from(idx).map(|(i, _)| i).collect();
        self.unlink_child(idx);
        let mut removed = Vec::with_capacity(doomed.len());
        for i in doomed {
            if let Some(section) = self.arena.remove(i) {
                self.lookup.remove(&section.id);
                removed.push(section);
            }
        }
        removed
    }

    /// True when `ancestor` is `node` or lies on the path from `node` to the root.
    pub fn is_ancestor_or_self(&self, ancestor: Index, node: Index) -> bool {
        let mut current = Some(node);
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.arena.get(idx).and_then(|n| n.parent);
        }
        false
    }

    /// Indices from the root down to (excluding) `idx`.
    pub fn ancestors(&self, idx: Index) -> Vec<Index> {
        let mut chain = Vec::new();
        let mut current = self.arena.get(idx).and_then(|n| n.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.arena.get(parent).and_then(|n| n.parent);
        }
        chain.reverse();
        chain
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self, self.root)
    }

    pub fn iter_from(&self, start: Index) -> PreOrderIter<'_> {
        PreOrderIter::new(self, start)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self, self.root)
    }

    pub fn iter_postorder_from(&self, start: Index) -> PostOrderIter<'_> {
        PostOrderIter::new(self, start)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    fn link_child(&mut self, parent: Index, child: Index, position: Option<usize>) {
        if let Some(parent) = self.arena.get_mut(parent) {
            let at = position
                .unwrap_or(parent.children.len())
                .min(parent.children.len());
            parent.children.insert(at, child);
        }
    }

    fn unlink_child(&mut self, child: Index) {
        let parent = self.arena.get(child).and_then(|n| n.parent);
        if let Some(parent) = parent.and_then(|p| self.arena.get_mut(p)) {
            parent.children.retain(|&c| c != child);
        }
    }
}

/// Depth-first pre-order walk; children in stored order.
pub struct PreOrderIter<'a> {
    arena: &'a SectionArena,
    stack: Vec<Index>,
}

impl<'a> PreOrderIter<'a> {
    fn new(arena: &'a SectionArena, start: Index) -> Self {
        let mut stack = Vec::new();
        if arena.get(start).is_some() {
            stack.push(start);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = (Index, &'a Section);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

/// Depth-first post-order walk.
pub struct PostOrderIter<'a> {
    arena: &'a SectionArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIter<'a> {
    fn new(arena: &'a SectionArena, start: Index) -> Self {
        let mut stack = Vec::new();
        if arena.get(start).is_some() {
            stack.push((start, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = (Index, &'a Section);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      root
    //      /  \
    //     a    b
    //     |
    //     c
    fn sample() -> (SectionArena, [Index; 4]) {
        let mut arena = SectionArena::new(Section::root());
        let root = arena.root();
        let a = arena.insert_child(root, Section::new("A", "a"), None).unwrap();
        let b = arena.insert_child(root, Section::new("B", "b"), None).unwrap();
        let c = arena.insert_child(a, Section::new("C", "c"), None).unwrap();
        (arena, [root, a, b, c])
    }

    fn slugs<'a>(iter: impl Iterator<Item = (Index, &'a Section)>) -> Vec<String> {
        iter.map(|(_, s)| s.slug.clone()).collect()
    }

    #[test]
    fn test_preorder_follows_stored_child_order() {
        let (arena, _) = sample();
        assert_eq!(slugs(arena.iter()), vec!["", "a", "c", "b"]);
    }

    #[test]
    fn test_postorder_visits_children_first() {
        let (arena, _) = sample();
        assert_eq!(slugs(arena.iter_postorder()), vec!["c", "a", "b", ""]);
    }

    #[test]
    fn test_insert_child_at_position() {
        let (mut arena, [root, ..]) = sample();
        arena.insert_child(root, Section::new("Z", "z"), Some(0));
        assert_eq!(slugs(arena.iter()), vec!["", "z", "a", "c", "b"]);
    }

    #[test]
    fn test_remove_subtree_drops_descendants_and_lookup() {
        let (mut arena, [_, a, _, c]) = sample();
        let c_id = arena.id_of(c).unwrap();
        let removed = arena.remove_subtree(a);
        assert_eq!(removed.len(), 2);
        assert!(!arena.contains(c_id));
        assert_eq!(slugs(arena.iter()), vec!["", "b"]);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_reparent_and_ancestry() {
        let (mut arena, [root, a, b, c]) = sample();
        arena.reparent(c, b, 0);
        assert_eq!(arena.ancestors(c), vec![root, b]);
        assert!(arena.is_ancestor_or_self(b, c));
        assert!(!arena.is_ancestor_or_self(a, c));
        assert_eq!(arena.depth(), 3);
    }
}
