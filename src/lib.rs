//! pagetree: hierarchical content trees with ordered sections, per-user
//! visit gating, versioned copies and import/export.
//!
//! Layers, innermost first:
//! - [`domain`]: section trees, traversal, gating rules, documents
//! - [`application`]: services over a shared store plus the traversal cache
//! - [`infrastructure`]: progress store, snapshots, dependency wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
