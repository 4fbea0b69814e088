//! Tests for depth-first navigation over a hierarchy

use std::sync::Arc;

use rstest::{fixture, rstest};

use pagetree::config::Settings;
use pagetree::domain::{BlockRegistry, HierarchyId, SectionId};
use pagetree::infrastructure::di::ServiceContainer;
use pagetree::infrastructure::traits::RealFileSystem;
use pagetree::infrastructure::MemoryProgressStore;
use pagetree::util::testing;

struct Tree {
    c: ServiceContainer,
    hierarchy: HierarchyId,
    root: SectionId,
    a: SectionId,
    a1: SectionId,
    a2: SectionId,
    a2x: SectionId,
    b: SectionId,
}

//  root
//  ├── a
//  │   ├── a1
//  │   └── a2
//  │       └── a2x
//  └── b
#[fixture]
fn tree() -> Tree {
    testing::init_test_setup();
    let c = ServiceContainer::with_deps(
        Settings::default(),
        Arc::new(RealFileSystem),
        Arc::new(MemoryProgressStore::new()),
        BlockRegistry::with_builtin(),
    );
    let hierarchy = c.hierarchy.create_hierarchy("Course", "/").unwrap();
    let root = c.hierarchy.root(hierarchy).unwrap();
    let a = c.hierarchy.add_child(root, "A", None).unwrap();
    let a1 = c.hierarchy.add_child(a, "A1", None).unwrap();
    let a2 = c.hierarchy.add_child(a, "A2", None).unwrap();
    let a2x = c.hierarchy.add_child(a2, "A2x", None).unwrap();
    let b = c.hierarchy.add_child(root, "B", None).unwrap();
    Tree {
        c,
        hierarchy,
        root,
        a,
        a1,
        a2,
        a2x,
        b,
    }
}

#[rstest]
fn given_tree_when_flattening_then_preorder_with_root_first(tree: Tree) {
    let order = tree.c.navigation.flatten(tree.hierarchy).unwrap();

    assert_eq!(
        *order,
        vec![tree.root, tree.a, tree.a1, tree.a2, tree.a2x, tree.b]
    );
}

#[rstest]
fn given_unchanged_tree_when_flattening_twice_then_identical(tree: Tree) {
    let first = tree.c.navigation.flatten(tree.hierarchy).unwrap();
    let second = tree.c.navigation.flatten(tree.hierarchy).unwrap();

    assert_eq!(first, second);
}

#[rstest]
fn given_tree_when_walking_next_then_follows_flattened_order(tree: Tree) {
    let nav = &tree.c.navigation;

    assert_eq!(nav.next(tree.root).unwrap(), Some(tree.a));
    assert_eq!(nav.next(tree.a1).unwrap(), Some(tree.a2));
    assert_eq!(nav.next(tree.a2x).unwrap(), Some(tree.b));
    assert_eq!(nav.next(tree.b).unwrap(), None);
}

#[rstest]
fn given_tree_when_walking_previous_then_root_is_never_returned(tree: Tree) {
    let nav = &tree.c.navigation;

    assert_eq!(nav.previous(tree.root).unwrap(), None);
    assert_eq!(nav.previous(tree.a).unwrap(), None);
    assert_eq!(nav.previous(tree.a1).unwrap(), Some(tree.a));
    assert_eq!(nav.previous(tree.b).unwrap(), Some(tree.a2x));
}

#[rstest]
fn given_every_section_when_comparing_with_tree_walk_then_next_and_previous_agree(tree: Tree) {
    let order = tree.c.navigation.flatten(tree.hierarchy).unwrap();
    let walked: Vec<_> = tree
        .c
        .hierarchy
        .with_hierarchy(tree.hierarchy, |h| {
            order
                .iter()
                .map(|&id| (h.next_section(id).unwrap(), h.previous_section(id).unwrap()))
                .collect()
        })
        .unwrap();

    for (&id, (next, previous)) in order.iter().zip(walked) {
        assert_eq!(tree.c.navigation.next(id).unwrap(), next);
        assert_eq!(tree.c.navigation.previous(id).unwrap(), previous);
    }
}

#[rstest]
fn given_nested_section_when_listing_ancestors_then_root_first(tree: Tree) {
    let nav = &tree.c.navigation;

    assert_eq!(*nav.ancestors(tree.a2x).unwrap(), vec![tree.root, tree.a, tree.a2]);
    assert!(nav.ancestors(tree.root).unwrap().is_empty());
}

#[rstest]
fn given_last_children_when_closing_then_chain_stops_at_non_last(tree: Tree) {
    let nav = &tree.c.navigation;

    assert_eq!(nav.closing_children(tree.a2x).unwrap(), vec![tree.a2x, tree.a2]);
    assert_eq!(nav.closing_children(tree.b).unwrap(), vec![tree.b]);
    assert!(nav.closing_children(tree.a1).unwrap().is_empty());
    assert!(nav.closing_children(tree.root).unwrap().is_empty());
}

#[rstest]
fn given_tree_when_querying_structure_then_leaves_modules_and_depths_match(tree: Tree) {
    tree.c
        .hierarchy
        .with_hierarchy(tree.hierarchy, |h| {
            assert_eq!(h.leaves(), vec![tree.a1, tree.a2x, tree.b]);
            assert_eq!(h.first_leaf(tree.a).unwrap(), tree.a1);
            assert_eq!(h.last_leaf(tree.a).unwrap(), tree.a2x);
            assert_eq!(h.last_leaf(tree.b).unwrap(), tree.b);
            assert_eq!(h.module_of(tree.a2x).unwrap(), Some(tree.a));
            assert_eq!(h.module_of(tree.b).unwrap(), Some(tree.b));
            assert_eq!(h.module_of(tree.root).unwrap(), None);
            assert_eq!(h.depth_of(tree.root).unwrap(), 1);
            assert_eq!(h.depth_of(tree.a2x).unwrap(), 4);
            assert_eq!(h.depth(), 4);
            assert!(h.is_first_child(tree.a1).unwrap());
            assert!(!h.is_last_child(tree.a1).unwrap());
            assert_eq!(h.descendants(tree.a).unwrap(), vec![tree.a1, tree.a2, tree.a2x]);
        })
        .unwrap();
}

#[rstest]
fn given_reorder_when_flattening_then_new_order_is_visible(tree: Tree) {
    tree.c.navigation.flatten(tree.hierarchy).unwrap();

    tree.c
        .hierarchy
        .reorder_children(tree.root, &[tree.b, tree.a])
        .unwrap();

    assert_eq!(
        *tree.c.navigation.flatten(tree.hierarchy).unwrap(),
        vec![tree.root, tree.b, tree.a, tree.a1, tree.a2, tree.a2x]
    );
    assert_eq!(tree.c.navigation.next(tree.b).unwrap(), Some(tree.a));
}

#[rstest]
fn given_root_only_hierarchy_when_navigating_then_no_neighbours(tree: Tree) {
    let empty = tree.c.hierarchy.create_hierarchy("Empty", "/").unwrap();
    let root = tree.c.hierarchy.root(empty).unwrap();

    assert_eq!(*tree.c.navigation.flatten(empty).unwrap(), vec![root]);
    assert_eq!(tree.c.navigation.next(root).unwrap(), None);
    assert_eq!(tree.c.navigation.previous(root).unwrap(), None);
}
