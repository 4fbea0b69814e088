//! Gating service
//!
//! Decides whether a user may open a section, records visits and forwards
//! page submissions to blocks. Gate decisions are cached per (user, section,
//! enforce flag); a first visit, a submission or a reset invalidates that
//! user's decisions for the hierarchy.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::application::cache::TraversalCache;
use crate::application::services::{cached_order, SharedStore};
use crate::application::ApplicationResult;
use crate::domain::{
    check_access, AccessDecision, BlockId, BlockPayload, DomainError, DomainResult, GateInput,
    GateState, HierarchyId, SectionId, TreeStore, UserId, UserLocation, UserPageVisit,
    VisitOutcome, VisitStatus,
};
use crate::infrastructure::traits::ProgressStore;

/// Result of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitReport {
    pub decision: AccessDecision,
    /// None when access was denied and nothing was recorded
    pub outcome: Option<VisitOutcome>,
}

impl VisitReport {
    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }
}

/// Service for per-user access checks and progress tracking.
pub struct GatingService {
    store: SharedStore,
    cache: Arc<TraversalCache>,
    progress: Arc<dyn ProgressStore>,
    enforce_default: bool,
}

impl GatingService {
    pub fn new(
        store: SharedStore,
        cache: Arc<TraversalCache>,
        progress: Arc<dyn ProgressStore>,
        enforce_default: bool,
    ) -> Self {
        Self {
            store,
            cache,
            progress,
            enforce_default,
        }
    }

    /// Enforcement flag used when a caller does not choose one.
    pub fn enforce_default(&self) -> bool {
        self.enforce_default
    }

    /// Gate check against a store borrowed from a held guard.
    pub(crate) fn decide(
        &self,
        store: &TreeStore,
        user: &UserId,
        section: SectionId,
        enforce: bool,
    ) -> DomainResult<AccessDecision> {
        let hierarchy = store.owner_of(section)?;
        let target_unlocked = store.get_section(section)?.unlocked;
        let order = cached_order(&self.cache, store, hierarchy)?;
        let tree = store.hierarchy(hierarchy)?;
        let decision = self.cache.gate(user, hierarchy, section, enforce, || {
            check_access(
                GateInput {
                    order: &order,
                    target: section,
                    target_unlocked,
                    enforce,
                },
                |s| {
                    self.progress.has_visited(user, s)
                        && tree.section(s).map_or(true, |node| node.blocks_unlocked(user))
                },
            )
        });
        Ok(decision)
    }

    /// May `user` open `section`?
    #[instrument(level = "debug", skip(self))]
    pub fn can_access(
        &self,
        user: &UserId,
        section: SectionId,
        enforce: bool,
    ) -> ApplicationResult<AccessDecision> {
        let store = self.store.read();
        Ok(self.decide(&store, user, section, enforce)?)
    }

    /// Navigate `user` to `section`: gate check, then record the visit and
    /// move the user's location when allowed.
    ///
    /// The read guard is held throughout, so the section cannot be deleted
    /// between the check and the recording.
    #[instrument(level = "debug", skip(self))]
    pub fn visit(
        &self,
        user: &UserId,
        section: SectionId,
        enforce: bool,
        status: VisitStatus,
    ) -> ApplicationResult<VisitReport> {
        let store = self.store.read();
        let decision = self.decide(&store, user, section, enforce)?;
        if !decision.is_allowed() {
            debug!(redirect = ?decision.redirect(), "visit denied");
            return Ok(VisitReport {
                decision,
                outcome: None,
            });
        }

        let hierarchy = store.owner_of(section)?;
        let now = Utc::now();
        let outcome = self
            .progress
            .record_visit(user, hierarchy, section, status, now);
        if outcome == VisitOutcome::FirstVisit {
            self.cache.invalidate_user(user, hierarchy);
        }
        self.progress.set_location(user, hierarchy, section, now);
        debug!(?outcome, "visit recorded");
        Ok(VisitReport {
            decision,
            outcome: Some(outcome),
        })
    }

    /// Hand `user`'s answers to every block on `section` that takes input,
    /// in block order. `data` is keyed by block; blocks without an entry get
    /// an empty object.
    ///
    /// Returns whether the user should move on to the next page: false as
    /// soon as one submitted block wants to show its own page again.
    #[instrument(level = "debug", skip(self, data))]
    pub fn submit(
        &self,
        user: &UserId,
        section: SectionId,
        data: &HashMap<BlockId, BlockPayload>,
    ) -> ApplicationResult<bool> {
        let store = self.store.read();
        let hierarchy = store.owner_of(section)?;
        let node = store.get_section(section)?;
        let empty = BlockPayload::Object(Default::default());

        let mut proceed = true;
        for block in node.blocks().iter().filter(|b| b.content.needs_submit()) {
            let payload = data.get(&block.id).unwrap_or(&empty);
            if let Err(e) = block.content.submit(user, payload) {
                // earlier blocks on the page may already hold new answers
                self.cache.invalidate_user(user, hierarchy);
                return Err(DomainError::Submission {
                    block: block.id,
                    block_type: block.block_type().to_string(),
                    reason: e.0,
                }
                .into());
            }
            proceed &= !block.content.redirect_to_self_on_submit();
        }
        self.cache.invalidate_user(user, hierarchy);
        debug!(proceed, "page submitted");
        Ok(proceed)
    }

    /// Clear `user`'s answers to every block on `section` that takes input.
    #[instrument(level = "debug", skip(self))]
    pub fn reset(&self, user: &UserId, section: SectionId) -> ApplicationResult<()> {
        let store = self.store.read();
        let hierarchy = store.owner_of(section)?;
        let node = store.get_section(section)?;
        for block in node.blocks().iter().filter(|b| b.content.needs_submit()) {
            block.content.clear_user_submissions(user);
        }
        self.cache.invalidate_user(user, hierarchy);
        debug!("page reset");
        Ok(())
    }

    /// Every block on `section` lets `user` proceed.
    pub fn blocks_unlocked(&self, user: &UserId, section: SectionId) -> ApplicationResult<bool> {
        let store = self.store.read();
        Ok(store.get_section(section)?.blocks_unlocked(user))
    }

    /// Static unlocked flag of a section.
    pub fn unlocked(&self, section: SectionId) -> ApplicationResult<bool> {
        let store = self.store.read();
        Ok(store.get_section(section)?.unlocked)
    }

    /// Last visited section, falling back to the root for anonymous users
    /// and users without a record.
    pub fn user_location(&self, user: &UserId, hierarchy: HierarchyId) -> ApplicationResult<SectionId> {
        let store = self.store.read();
        let root = store.get_root(hierarchy)?.id;
        Ok(self
            .progress
            .location(user, hierarchy)
            .map(|l| l.section)
            .unwrap_or(root))
    }

    /// Full location record, if any.
    pub fn location_record(&self, user: &UserId, hierarchy: HierarchyId) -> Option<UserLocation> {
        self.progress.location(user, hierarchy)
    }

    pub fn gate_state(&self, user: &UserId, section: SectionId) -> ApplicationResult<GateState> {
        let store = self.store.read();
        store.get_section(section)?;
        Ok(if self.progress.has_visited(user, section) {
            GateState::Visited
        } else {
            GateState::Unvisited
        })
    }

    pub fn visits(&self, user: &UserId, hierarchy: HierarchyId) -> ApplicationResult<Vec<UserPageVisit>> {
        let store = self.store.read();
        store.hierarchy(hierarchy)?;
        Ok(self.progress.visits(user, hierarchy))
    }
}
