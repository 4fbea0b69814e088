//! I/O boundary traits for testability
//!
//! These traits abstract external state (files, progress records), allowing
//! services to be tested with alternative implementations.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::domain::{
    HierarchyId, SectionId, UserId, UserLocation, UserPageVisit, VisitOutcome, VisitStatus,
};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Write via a temporary sibling file and rename it over `path`.
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Per-user progress records: page visits and last locations.
///
/// Implementations must make first-visit creation an upsert: concurrent
/// first visits of the same (user, section) produce exactly one record.
/// Anonymous users are never recorded.
pub trait ProgressStore: Send + Sync {
    /// Create or touch the visit record.
    fn record_visit(
        &self,
        user: &UserId,
        hierarchy: HierarchyId,
        section: SectionId,
        status: VisitStatus,
        at: DateTime<Utc>,
    ) -> VisitOutcome;

    fn visit(&self, user: &UserId, section: SectionId) -> Option<UserPageVisit>;

    fn has_visited(&self, user: &UserId, section: SectionId) -> bool {
        self.visit(user, section).is_some()
    }

    /// Visits of `user` within `hierarchy`, oldest first.
    fn visits(&self, user: &UserId, hierarchy: HierarchyId) -> Vec<UserPageVisit>;

    fn set_location(
        &self,
        user: &UserId,
        hierarchy: HierarchyId,
        section: SectionId,
        at: DateTime<Utc>,
    );

    fn location(&self, user: &UserId, hierarchy: HierarchyId) -> Option<UserLocation>;

    /// Point every location of `hierarchy` that refers to one of `removed`
    /// at `to`. Returns the number of repaired locations.
    fn reassign_locations(&self, hierarchy: HierarchyId, removed: &[SectionId], to: SectionId)
        -> usize;

    /// Drop visit records of the given sections. Returns the number dropped.
    fn purge_sections(&self, removed: &[SectionId]) -> usize;

    /// Drop all visits and locations of a hierarchy.
    fn purge_hierarchy(&self, hierarchy: HierarchyId) -> usize;

    /// Every record, for persistence.
    fn export(&self) -> (Vec<UserPageVisit>, Vec<UserLocation>);

    /// Replace all records, for persistence.
    fn restore(&self, visits: Vec<UserPageVisit>, locations: Vec<UserLocation>);
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        self.ensure_parent(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
