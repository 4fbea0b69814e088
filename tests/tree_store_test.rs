//! Tests for TreeStore structural operations

use rstest::{fixture, rstest};

use pagetree::domain::{
    DomainError, HierarchyId, SectionId, SlugPolicy, TextBlock, TreeStore, ROOT_LABEL,
};
use pagetree::util::testing;

struct Course {
    store: TreeStore,
    hierarchy: HierarchyId,
    root: SectionId,
    intro: SectionId,
    basics: SectionId,
    advanced: SectionId,
}

//  root
//  ├── intro
//  │   └── basics
//  └── advanced
#[fixture]
fn course() -> Course {
    testing::init_test_setup();
    let mut store = TreeStore::new(SlugPolicy::default());
    let hierarchy = store.create_hierarchy("Rust Course", "/course/").unwrap();
    let root = store.get_root(hierarchy).unwrap().id;
    let intro = store.add_child(root, "Intro", None).unwrap();
    let basics = store.add_child(intro, "Basics", None).unwrap();
    let advanced = store.add_child(root, "Advanced", None).unwrap();
    Course {
        store,
        hierarchy,
        root,
        intro,
        basics,
        advanced,
    }
}

fn order(c: &Course) -> Vec<SectionId> {
    c.store.hierarchy(c.hierarchy).unwrap().flatten().collect()
}

#[test]
fn given_new_hierarchy_when_created_then_has_only_empty_slug_root() {
    let mut store = TreeStore::new(SlugPolicy::default());

    let id = store.create_hierarchy("My Course", "").unwrap();

    let hierarchy = store.hierarchy(id).unwrap();
    assert_eq!(hierarchy.slug(), "my-course");
    assert_eq!(hierarchy.base_url(), "/");
    assert_eq!(hierarchy.len(), 1);
    assert_eq!(hierarchy.root().slug, "");
    assert_eq!(hierarchy.root().label, ROOT_LABEL);
    assert!(hierarchy.root().is_root());
}

#[test]
fn given_existing_hierarchy_slug_when_creating_same_name_then_duplicate_slug() {
    let mut store = TreeStore::new(SlugPolicy::default());
    store.create_hierarchy("Course", "/").unwrap();

    let result = store.create_hierarchy("Course", "/other/");

    assert!(matches!(result, Err(DomainError::DuplicateSlug { .. })));
    assert_eq!(store.len(), 1);
}

#[rstest]
fn given_label_when_adding_child_then_slug_is_derived(course: Course) {
    let section = course.store.get_section(course.intro).unwrap();

    assert_eq!(section.slug, "intro");
    assert_eq!(section.label, "Intro");
    assert!(!section.unlocked);
    assert_eq!(course.store.owner_of(course.basics).unwrap(), course.hierarchy);
}

#[rstest]
fn given_sibling_with_slug_when_adding_same_slug_then_duplicate_slug(mut course: Course) {
    let result = course.store.add_child(course.root, "Another intro", Some("intro"));

    assert!(matches!(result, Err(DomainError::DuplicateSlug { .. })));
    assert_eq!(order(&course).len(), 4);
}

#[rstest]
fn given_other_parent_when_adding_same_slug_then_succeeds(mut course: Course) {
    let result = course.store.add_child(course.advanced, "Intro", None);

    assert!(result.is_ok());
}

#[test]
fn given_long_label_when_adding_child_then_slug_is_truncated() {
    let mut store = TreeStore::new(SlugPolicy::new(8));
    let h = store.create_hierarchy("c", "/").unwrap();
    let root = store.get_root(h).unwrap().id;

    let id = store.add_child(root, "Introduction to Rust", None).unwrap();

    assert_eq!(store.get_section(id).unwrap().slug, "introduc");
}

#[rstest]
fn given_overlong_slug_when_updating_then_rejected_not_truncated(mut course: Course) {
    let overlong = "x".repeat(51);

    let result = course.store.update_section(course.intro, None, Some(&overlong));

    assert!(matches!(result, Err(DomainError::InvalidSlug { .. })));
    assert_eq!(course.store.get_section(course.intro).unwrap().slug, "intro");
}

#[rstest]
#[case("has space")]
#[case("bang!")]
#[case("ümlaut")]
fn given_invalid_explicit_slug_when_adding_then_invalid_slug(
    mut course: Course,
    #[case] slug: &str,
) {
    let result = course.store.add_child(course.root, "Label", Some(slug));

    assert!(matches!(result, Err(DomainError::InvalidSlug { .. })));
}

#[rstest]
fn given_root_when_changing_slug_then_root_section_error(mut course: Course) {
    let result = course.store.update_section(course.root, None, Some("top"));

    assert!(matches!(result, Err(DomainError::RootSection { .. })));
}

#[rstest]
fn given_root_when_relabeling_then_label_changes(mut course: Course) {
    course
        .store
        .update_section(course.root, Some("Start"), None)
        .unwrap();

    assert_eq!(course.store.get_section(course.root).unwrap().label, "Start");
}

#[rstest]
fn given_section_when_moving_then_subtree_follows(mut course: Course) {
    course
        .store
        .move_section(course.intro, course.advanced, 0)
        .unwrap();

    assert_eq!(
        order(&course),
        vec![course.root, course.advanced, course.intro, course.basics]
    );
    let h = course.store.hierarchy(course.hierarchy).unwrap();
    assert_eq!(h.path_of(course.basics).unwrap(), "advanced/intro/basics/");
}

#[rstest]
fn given_descendant_target_when_moving_then_invalid_move(mut course: Course) {
    let result = course.store.move_section(course.intro, course.basics, 0);

    assert!(matches!(result, Err(DomainError::InvalidMove { .. })));
}

#[rstest]
fn given_self_target_when_moving_then_invalid_move(mut course: Course) {
    let result = course.store.move_section(course.intro, course.intro, 0);

    assert!(matches!(result, Err(DomainError::InvalidMove { .. })));
}

#[rstest]
fn given_root_when_moving_then_root_section_error(mut course: Course) {
    let result = course.store.move_section(course.root, course.advanced, 0);

    assert!(matches!(result, Err(DomainError::RootSection { .. })));
}

#[rstest]
fn given_other_hierarchy_when_moving_then_invalid_move(mut course: Course) {
    let other = course.store.create_hierarchy("Other", "/").unwrap();
    let other_root = course.store.get_root(other).unwrap().id;

    let result = course.store.move_section(course.intro, other_root, 0);

    assert!(matches!(result, Err(DomainError::InvalidMove { .. })));
    assert_eq!(course.store.owner_of(course.intro).unwrap(), course.hierarchy);
}

#[rstest]
fn given_slug_clash_at_destination_when_moving_then_duplicate_slug(mut course: Course) {
    course.store.add_child(course.advanced, "Basics", None).unwrap();

    let result = course.store.move_section(course.basics, course.advanced, 0);

    assert!(matches!(result, Err(DomainError::DuplicateSlug { .. })));
}

#[rstest]
fn given_position_past_end_when_moving_then_appended(mut course: Course) {
    course.store.move_section(course.basics, course.root, 99).unwrap();

    let h = course.store.hierarchy(course.hierarchy).unwrap();
    assert_eq!(
        h.children_of(course.root).unwrap(),
        vec![course.intro, course.advanced, course.basics]
    );
}

#[rstest]
fn given_permutation_when_reordering_then_order_changes(mut course: Course) {
    course
        .store
        .reorder_children(course.root, &[course.advanced, course.intro])
        .unwrap();

    assert_eq!(
        order(&course),
        vec![course.root, course.advanced, course.intro, course.basics]
    );
}

#[rstest]
fn given_incomplete_order_when_reordering_then_rejected_and_unchanged(mut course: Course) {
    let result = course.store.reorder_children(course.root, &[course.advanced]);

    assert!(matches!(result, Err(DomainError::InvalidMove { .. })));
    assert_eq!(
        order(&course),
        vec![course.root, course.intro, course.basics, course.advanced]
    );
}

#[rstest]
fn given_subtree_when_deleting_then_descendants_are_removed(mut course: Course) {
    let removed = course.store.delete_section(course.intro).unwrap();

    assert_eq!(removed.removed, vec![course.basics, course.intro]);
    assert_eq!(removed.surviving_ancestor, course.root);
    assert_eq!(removed.hierarchy, course.hierarchy);
    assert_eq!(order(&course), vec![course.root, course.advanced]);
    assert!(matches!(
        course.store.get_section(course.basics),
        Err(DomainError::NotFound { .. })
    ));
}

#[rstest]
fn given_root_when_deleting_then_root_section_error(mut course: Course) {
    let result = course.store.delete_section(course.root);

    assert!(matches!(result, Err(DomainError::RootSection { .. })));
}

#[rstest]
fn given_hierarchy_when_deleting_then_all_sections_are_gone(mut course: Course) {
    course.store.delete_hierarchy(course.hierarchy).unwrap();

    assert!(course.store.is_empty());
    assert!(course.store.owner_of(course.advanced).is_err());
}

#[rstest]
fn given_nested_section_when_resolving_paths_then_urls_use_base_url(course: Course) {
    let h = course.store.hierarchy(course.hierarchy).unwrap();

    assert_eq!(h.path_of(course.root).unwrap(), "");
    assert_eq!(h.path_of(course.basics).unwrap(), "intro/basics/");
    assert_eq!(h.absolute_url(course.basics).unwrap(), "/course/intro/basics/");
    assert_eq!(h.find_by_path("/intro/basics/"), Some(course.basics));
    assert_eq!(h.find_by_path(""), Some(course.root));
    assert_eq!(h.find_by_path("intro/missing"), None);
}

#[rstest]
fn given_blocks_when_removing_and_reordering_then_ordinality_is_dense(mut course: Course) {
    let a = course
        .store
        .append_block(course.intro, "a", "", Box::new(TextBlock::new("A")))
        .unwrap();
    let b = course
        .store
        .append_block(course.intro, "b", "", Box::new(TextBlock::new("B")))
        .unwrap();
    let c = course
        .store
        .append_block(course.intro, "c", "wide", Box::new(TextBlock::new("C")))
        .unwrap();

    course.store.remove_block(course.intro, a).unwrap();
    course.store.reorder_blocks(course.intro, &[c, b]).unwrap();

    let blocks = course.store.get_section(course.intro).unwrap().blocks();
    let summary: Vec<_> = blocks.iter().map(|b| (b.id, b.ordinality)).collect();
    assert_eq!(summary, vec![(c, 1), (b, 2)]);
    assert_eq!(blocks[0].css_extra, "wide");
}

#[rstest]
fn given_duplicate_block_ids_when_reordering_blocks_then_rejected(mut course: Course) {
    let a = course
        .store
        .append_block(course.intro, "a", "", Box::new(TextBlock::new("A")))
        .unwrap();
    course
        .store
        .append_block(course.intro, "b", "", Box::new(TextBlock::new("B")))
        .unwrap();

    let result = course.store.reorder_blocks(course.intro, &[a, a]);

    assert!(matches!(result, Err(DomainError::InvalidMove { .. })));
}
