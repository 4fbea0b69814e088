//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Hierarchical content trees: ordered sections, visit gating, versioned copies
#[derive(Parser, Debug)]
#[command(name = "pagetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Local config file (default: ./.pagetree.toml)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Snapshot file (overrides store_path from config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub store: Option<PathBuf>,

    /// Acting user; anonymous when omitted
    #[arg(short, long, global = true, env = "PAGETREE_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, list, copy, export and import hierarchies
    Hierarchy {
        #[command(subcommand)]
        command: HierarchyCommands,
    },

    /// Edit sections and their page blocks
    Section {
        #[command(subcommand)]
        command: SectionCommands,
    },

    /// Depth-first navigation
    Nav {
        #[command(subcommand)]
        command: NavCommands,
    },

    /// Visit a section as the acting user (records progress when allowed)
    Visit {
        #[command(flatten)]
        target: SectionArgs,
        /// Mark the visit complete
        #[arg(long)]
        complete: bool,
        #[command(flatten)]
        gating: GatingArgs,
    },

    /// Check whether the acting user may open a section
    Access {
        #[command(flatten)]
        target: SectionArgs,
        #[command(flatten)]
        gating: GatingArgs,
    },

    /// Show the acting user's last location and visits
    Location {
        /// Hierarchy slug or id
        hierarchy: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// A section addressed by hierarchy and slug path.
#[derive(Args, Debug, Clone)]
pub struct SectionArgs {
    /// Hierarchy slug or id
    pub hierarchy: String,
    /// Slug path below the root (e.g. intro/part-1); empty for the root
    #[arg(default_value = "")]
    pub path: String,
}

/// Override the configured gating enforcement.
#[derive(Args, Debug, Clone, Default)]
pub struct GatingArgs {
    /// Enforce visiting sections in order
    #[arg(long, conflicts_with = "no_enforce")]
    pub enforce: bool,
    /// Do not enforce ordering
    #[arg(long)]
    pub no_enforce: bool,
}

impl GatingArgs {
    pub fn resolve(&self, default: bool) -> bool {
        match (self.enforce, self.no_enforce) {
            (true, _) => true,
            (_, true) => false,
            _ => default,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum HierarchyCommands {
    /// Create an empty hierarchy
    Create {
        /// Display name (the slug is derived from it)
        name: String,
        /// Base URL for section links
        #[arg(long, default_value = "/")]
        base_url: String,
    },

    /// List hierarchies
    List,

    /// Show a hierarchy as tree
    Show {
        /// Hierarchy slug or id
        hierarchy: String,
        /// Include section ids
        #[arg(long)]
        ids: bool,
    },

    /// Delete a hierarchy with its progress records
    Delete {
        /// Hierarchy slug or id
        hierarchy: String,
    },

    /// Deep copy a hierarchy under a new name
    Copy {
        /// Source hierarchy slug or id
        hierarchy: String,
        /// Name of the copy
        name: String,
    },

    /// Export a hierarchy as JSON document
    Export {
        /// Hierarchy slug or id
        hierarchy: String,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Import a JSON document as new hierarchy
    Import {
        /// Document file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum SectionCommands {
    /// Append a child section
    Add {
        #[command(flatten)]
        parent: SectionArgs,
        /// Label of the new section
        #[arg(short, long)]
        label: String,
        /// Explicit slug (default: derived from the label)
        #[arg(long)]
        slug: Option<String>,
    },

    /// Change label and/or slug
    Edit {
        #[command(flatten)]
        target: SectionArgs,
        #[arg(short, long)]
        label: Option<String>,
        #[arg(long)]
        slug: Option<String>,
    },

    /// Move a section (with its subtree) below another parent
    Move {
        #[command(flatten)]
        target: SectionArgs,
        /// Slug path of the new parent
        #[arg(long)]
        to: String,
        /// Position among the new siblings (default: last)
        #[arg(long)]
        position: Option<usize>,
    },

    /// Delete a section and everything below it
    Delete {
        #[command(flatten)]
        target: SectionArgs,
    },

    /// Mark a section unlocked (reachable without gating)
    Unlock {
        #[command(flatten)]
        target: SectionArgs,
        /// Lock again instead
        #[arg(long)]
        lock: bool,
    },

    /// Reorder the children of a section
    Reorder {
        #[command(flatten)]
        parent: SectionArgs,
        /// Child slugs in the new order
        #[arg(long, num_args = 1.., required = true)]
        order: Vec<String>,
    },

    /// List page blocks
    Blocks {
        #[command(flatten)]
        target: SectionArgs,
    },

    /// Append a page block
    AddBlock {
        #[command(flatten)]
        target: SectionArgs,
        /// Block type
        #[arg(short = 't', long = "type", default_value = "text")]
        block_type: String,
        /// JSON payload (e.g. '{"body": "hello"}')
        #[arg(long)]
        payload: String,
        #[arg(short, long, default_value = "")]
        label: String,
        #[arg(long, default_value = "")]
        css_extra: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NavCommands {
    /// Depth-first order of all sections
    Flatten {
        /// Hierarchy slug or id
        hierarchy: String,
    },

    /// Section after the given one
    Next {
        #[command(flatten)]
        target: SectionArgs,
    },

    /// Section before the given one
    Prev {
        #[command(flatten)]
        target: SectionArgs,
    },

    /// Ancestors from the root down
    Ancestors {
        #[command(flatten)]
        target: SectionArgs,
    },

    /// Chain of adjacent last children closing at this section
    Closing {
        #[command(flatten)]
        target: SectionArgs,
    },

    /// Renderer view of a section as JSON
    Page {
        #[command(flatten)]
        target: SectionArgs,
        #[command(flatten)]
        gating: GatingArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,

    /// Show config file locations
    Path,

    /// Print a config template
    Template,
}
