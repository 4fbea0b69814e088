//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::ids::{BlockId, SectionId};

/// Domain errors represent violations of tree invariants.
/// These are independent of persistence and presentation concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("duplicate slug '{slug}' under {parent}")]
    DuplicateSlug { slug: String, parent: String },

    #[error("invalid slug '{slug}': {reason}")]
    InvalidSlug { slug: String, reason: String },

    #[error("invalid move of section {section}: {reason}")]
    InvalidMove { section: SectionId, reason: String },

    #[error("root section {section} cannot be {action}")]
    RootSection {
        section: SectionId,
        action: &'static str,
    },

    #[error("invalid import document at '{path}': {reason}")]
    Import { path: String, reason: String },

    #[error("submission to {block_type} block {block} failed: {reason}")]
    Submission {
        block: BlockId,
        block_type: String,
        reason: String,
    },

    #[error("export of {block_type} block {block} failed: {reason}")]
    ExportFailure {
        block: BlockId,
        block_type: String,
        reason: String,
    },
}

impl DomainError {
    pub fn hierarchy_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            kind: "hierarchy",
            id: id.to_string(),
        }
    }

    pub fn section_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            kind: "section",
            id: id.to_string(),
        }
    }

    pub fn block_not_found(id: BlockId) -> Self {
        Self::NotFound {
            kind: "page block",
            id: id.to_string(),
        }
    }

    pub fn import(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Import {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
