//! Traversal cache
//!
//! Memoizes derived traversal data: the flattened order of each hierarchy,
//! ancestor chains per section and gate decisions per (user, section,
//! enforce flag). Entries are tagged with their hierarchy so a structural
//! mutation drops exactly that hierarchy's entries.
//!
//! # Consistency
//!
//! - Structural entries are computed while the caller holds the store read
//!   guard; mutations invalidate while holding the write guard. A reader can
//!   therefore never insert an order computed from a tree that has since
//!   changed.
//! - Gate entries also depend on progress records, which change without the
//!   store lock, and on block answers. Each (user, hierarchy) pair carries
//!   an epoch that is bumped on every new visit, submission and reset; a
//!   gate decision is only stored if the epoch it was computed under is
//!   still current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::domain::{AccessDecision, DomainResult, HierarchyId, SectionId, UserId};

type GateKey = (UserId, SectionId, bool);
type EpochKey = (UserId, HierarchyId);

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub enabled: bool,
    pub hits: u64,
    pub misses: u64,
    /// Number of invalidation calls (hierarchy or user scoped)
    pub invalidations: u64,
    pub flattened_entries: usize,
    pub ancestor_entries: usize,
    pub gate_entries: usize,
    /// Tracked (user, hierarchy) progress epochs
    pub epoch_entries: usize,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

/// Keyed cache over traversal results with explicit invalidation.
pub struct TraversalCache {
    enabled: bool,
    flattened: DashMap<HierarchyId, Arc<Vec<SectionId>>>,
    ancestors: DashMap<SectionId, (HierarchyId, Arc<Vec<SectionId>>)>,
    gates: DashMap<GateKey, (HierarchyId, AccessDecision)>,
    epochs: DashMap<EpochKey, u64>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl TraversalCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            flattened: DashMap::new(),
            ancestors: DashMap::new(),
            gates: DashMap::new(),
            epochs: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Cache that always computes.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Flattened order of `hierarchy`. Call with the store read guard held.
    pub fn flattened(
        &self,
        hierarchy: HierarchyId,
        compute: impl FnOnce() -> Vec<SectionId>,
    ) -> Arc<Vec<SectionId>> {
        if let Some(order) = self.enabled.then(|| self.flattened.get(&hierarchy)).flatten() {
            self.hit();
            return Arc::clone(order.value());
        }
        self.miss();
        let order = Arc::new(compute());
        if self.enabled {
            self.flattened.insert(hierarchy, Arc::clone(&order));
        }
        order
    }

    /// Ancestor chain of `section`. Call with the store read guard held.
    pub fn ancestors(
        &self,
        hierarchy: HierarchyId,
        section: SectionId,
        compute: impl FnOnce() -> DomainResult<Vec<SectionId>>,
    ) -> DomainResult<Arc<Vec<SectionId>>> {
        if let Some(entry) = self.enabled.then(|| self.ancestors.get(&section)).flatten() {
            self.hit();
            return Ok(Arc::clone(&entry.value().1));
        }
        self.miss();
        let chain = Arc::new(compute()?);
        if self.enabled {
            self.ancestors
                .insert(section, (hierarchy, Arc::clone(&chain)));
        }
        Ok(chain)
    }

    /// Gate decision for (user, section, enforce).
    pub fn gate(
        &self,
        user: &UserId,
        hierarchy: HierarchyId,
        section: SectionId,
        enforce: bool,
        compute: impl FnOnce() -> AccessDecision,
    ) -> AccessDecision {
        if !self.enabled {
            self.miss();
            return compute();
        }
        let key = (user.clone(), section, enforce);
        if let Some(entry) = self.gates.get(&key) {
            self.hit();
            return entry.value().1;
        }
        self.miss();

        let epoch_key = (user.clone(), hierarchy);
        let before = self.epochs.get(&epoch_key).map(|e| *e).unwrap_or(0);
        let decision = compute();
        let epoch = self.epochs.entry(epoch_key).or_insert(0);
        if *epoch == before {
            self.gates.insert(key, (hierarchy, decision));
        } else {
            trace!(user = %user, section = %section, "progress changed during gate check, not caching");
        }
        decision
    }

    /// Drop every entry derived from `hierarchy`.
    pub fn invalidate_hierarchy(&self, hierarchy: HierarchyId) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        self.flattened.remove(&hierarchy);
        self.ancestors.retain(|_, (owner, _)| *owner != hierarchy);
        self.gates.retain(|_, (owner, _)| *owner != hierarchy);
        trace!(hierarchy = %hierarchy, "invalidated hierarchy");
    }

    /// Drop everything about a deleted hierarchy, including its epochs.
    pub fn forget_hierarchy(&self, hierarchy: HierarchyId) {
        self.invalidate_hierarchy(hierarchy);
        self.epochs.retain(|(_, owner), _| *owner != hierarchy);
    }

    /// Drop `user`'s gate decisions within `hierarchy` after their progress changed.
    pub fn invalidate_user(&self, user: &UserId, hierarchy: HierarchyId) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        let mut epoch = self.epochs.entry((user.clone(), hierarchy)).or_insert(0);
        *epoch += 1;
        self.gates
            .retain(|(u, _, _), (owner, _)| !(u == user && *owner == hierarchy));
        trace!(user = %user, hierarchy = %hierarchy, "invalidated user gates");
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        self.flattened.clear();
        self.ancestors.clear();
        self.gates.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            enabled: self.enabled,
            hits,
            misses,
            invalidations: self.invalidations.load(Ordering::Relaxed),
            flattened_entries: self.flattened.len(),
            ancestor_entries: self.ancestors.len(),
            gate_entries: self.gates.len(),
            epoch_entries: self.epochs.len(),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for TraversalCache {
    fn default() -> Self {
        Self::new(true)
    }
}
