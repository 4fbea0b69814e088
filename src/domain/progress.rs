//! Per-user progress records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{HierarchyId, SectionId, UserId};

/// Completion status of a visit. Ordered: a visit may move from
/// `Incomplete` to `Complete`, never back.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    #[default]
    Incomplete,
    Complete,
}

/// Gate state of a (user, section) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unvisited,
    Visited,
}

/// Last section a user visited in a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLocation {
    pub user: UserId,
    pub hierarchy: HierarchyId,
    pub section: SectionId,
    pub updated_at: DateTime<Utc>,
}

/// Marks that a user reached a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPageVisit {
    pub user: UserId,
    pub hierarchy: HierarchyId,
    pub section: SectionId,
    pub status: VisitStatus,
    pub first_visit: DateTime<Utc>,
    pub last_visit: DateTime<Utc>,
}

impl UserPageVisit {
    pub fn new(
        user: UserId,
        hierarchy: HierarchyId,
        section: SectionId,
        status: VisitStatus,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            user,
            hierarchy,
            section,
            status,
            first_visit: at,
            last_visit: at,
        }
    }

    /// Record a repeat visit. Status is only ever upgraded.
    pub fn touch(&mut self, status: VisitStatus, at: DateTime<Utc>) {
        self.status = self.status.max(status);
        if at > self.last_visit {
            self.last_visit = at;
        }
    }
}

/// Result of recording a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// The unvisited -> visited transition fired
    FirstVisit,
    /// A record already existed (including a concurrent writer's)
    Revisit,
    /// Anonymous users are not tracked
    NotTracked,
}
