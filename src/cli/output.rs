//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use generational_arena::Index;
use termtree::Tree;

use crate::domain::Hierarchy;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print failure status (red X, indented)
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Render a hierarchy as a `termtree` (label, slug and lock state per node).
pub fn hierarchy_tree(hierarchy: &Hierarchy, with_ids: bool) -> Tree<String> {
    fn node_text(hierarchy: &Hierarchy, idx: Index, with_ids: bool) -> String {
        let Ok(section) = hierarchy.node(idx) else {
            return "?".to_string();
        };
        let mut text = if section.is_root() {
            format!("{} [{}]", section.label, hierarchy.slug())
        } else {
            format!("{} ({})", section.label, section.slug)
        };
        if section.unlocked {
            text.push_str(" unlocked");
        }
        if !section.blocks().is_empty() {
            text.push_str(&format!(" #{}", section.blocks().len()));
        }
        if with_ids {
            text.push_str(&format!(" {}", section.id));
        }
        text
    }

    fn build(hierarchy: &Hierarchy, idx: Index, with_ids: bool) -> Tree<String> {
        let leaves: Vec<Tree<String>> = hierarchy
            .node(idx)
            .map(|s| s.children.clone())
            .unwrap_or_default()
            .into_iter()
            .map(|child| build(hierarchy, child, with_ids))
            .collect();
        Tree::new(node_text(hierarchy, idx, with_ids)).with_leaves(leaves)
    }

    build(hierarchy, hierarchy.sections.root(), with_ids)
}
