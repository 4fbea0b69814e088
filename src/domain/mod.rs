//! Domain layer: section trees, traversal, gating and versioning
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod block;
pub mod builder;
pub mod document;
pub mod error;
pub mod gating;
pub mod hierarchy;
pub mod ids;
pub mod progress;
pub mod section;
pub mod slug;
pub mod store;
pub mod traversal;
pub mod versioning;

pub use arena::SectionArena;
pub use block::{
    AttachedBlock, BlockError, BlockPayload, BlockRegistry, BlockView, HtmlBlock, PageBlock,
    TextBlock,
};
pub use builder::HierarchyBuilder;
pub use document::{BlockDocument, HierarchyDocument, SectionDocument};
pub use error::{DomainError, DomainResult};
pub use gating::{check_access, AccessDecision, GateInput};
pub use hierarchy::{Hierarchy, RemovedSubtree};
pub use ids::{BlockId, HierarchyId, SectionId, UserId};
pub use progress::{GateState, UserLocation, UserPageVisit, VisitOutcome, VisitStatus};
pub use section::{Section, ROOT_LABEL};
pub use slug::{SlugPolicy, DEFAULT_SLUG_MAX_LENGTH};
pub use store::TreeStore;
pub use traversal::Flatten;
