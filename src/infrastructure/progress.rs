//! In-memory progress store backed by `DashMap`.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::domain::{
    HierarchyId, SectionId, UserId, UserLocation, UserPageVisit, VisitOutcome, VisitStatus,
};
use crate::infrastructure::traits::ProgressStore;

/// Visits keyed by (user, section), locations keyed by (user, hierarchy).
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    visits: DashMap<(UserId, SectionId), UserPageVisit>,
    locations: DashMap<(UserId, HierarchyId), UserLocation>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit_count(&self) -> usize {
        self.visits.len()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn record_visit(
        &self,
        user: &UserId,
        hierarchy: HierarchyId,
        section: SectionId,
        status: VisitStatus,
        at: DateTime<Utc>,
    ) -> VisitOutcome {
        if user.is_anonymous() {
            return VisitOutcome::NotTracked;
        }
        // the entry guard serializes racing first visits of the same pair
        match self.visits.entry((user.clone(), section)) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().touch(status, at);
                VisitOutcome::Revisit
            }
            Entry::Vacant(slot) => {
                slot.insert(UserPageVisit::new(
                    user.clone(),
                    hierarchy,
                    section,
                    status,
                    at,
                ));
                trace!(user = %user, section = %section, "first visit");
                VisitOutcome::FirstVisit
            }
        }
    }

    fn visit(&self, user: &UserId, section: SectionId) -> Option<UserPageVisit> {
        self.visits
            .get(&(user.clone(), section))
            .map(|v| v.value().clone())
    }

    fn visits(&self, user: &UserId, hierarchy: HierarchyId) -> Vec<UserPageVisit> {
        let mut visits: Vec<UserPageVisit> = self
            .visits
            .iter()
            .filter(|v| &v.user == user && v.hierarchy == hierarchy)
            .map(|v| v.value().clone())
            .collect();
        visits.sort_by_key(|v| v.first_visit);
        visits
    }

    fn set_location(
        &self,
        user: &UserId,
        hierarchy: HierarchyId,
        section: SectionId,
        at: DateTime<Utc>,
    ) {
        if user.is_anonymous() {
            return;
        }
        self.locations.insert(
            (user.clone(), hierarchy),
            UserLocation {
                user: user.clone(),
                hierarchy,
                section,
                updated_at: at,
            },
        );
    }

    fn location(&self, user: &UserId, hierarchy: HierarchyId) -> Option<UserLocation> {
        self.locations
            .get(&(user.clone(), hierarchy))
            .map(|l| l.value().clone())
    }

    fn reassign_locations(
        &self,
        hierarchy: HierarchyId,
        removed: &[SectionId],
        to: SectionId,
    ) -> usize {
        let mut repaired = 0;
        for mut location in self.locations.iter_mut() {
            if location.hierarchy == hierarchy && removed.contains(&location.section) {
                location.section = to;
                repaired += 1;
            }
        }
        debug!(hierarchy = %hierarchy, repaired, "reassigned locations");
        repaired
    }

    fn purge_sections(&self, removed: &[SectionId]) -> usize {
        let before = self.visits.len();
        self.visits.retain(|(_, section), _| !removed.contains(section));
        before.saturating_sub(self.visits.len())
    }

    fn purge_hierarchy(&self, hierarchy: HierarchyId) -> usize {
        let before = self.visits.len() + self.locations.len();
        self.visits.retain(|_, v| v.hierarchy != hierarchy);
        self.locations.retain(|(_, h), _| *h != hierarchy);
        before.saturating_sub(self.visits.len() + self.locations.len())
    }

    fn export(&self) -> (Vec<UserPageVisit>, Vec<UserLocation>) {
        let mut visits: Vec<UserPageVisit> = self.visits.iter().map(|v| v.value().clone()).collect();
        visits.sort_by(|a, b| (&a.user, a.first_visit).cmp(&(&b.user, b.first_visit)));
        let mut locations: Vec<UserLocation> =
            self.locations.iter().map(|l| l.value().clone()).collect();
        locations.sort_by(|a, b| (&a.user, a.hierarchy).cmp(&(&b.user, b.hierarchy)));
        (visits, locations)
    }

    fn restore(&self, visits: Vec<UserPageVisit>, locations: Vec<UserLocation>) {
        self.visits.clear();
        self.locations.clear();
        for visit in visits {
            self.visits
                .insert((visit.user.clone(), visit.section), visit);
        }
        for location in locations {
            self.locations
                .insert((location.user.clone(), location.hierarchy), location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_visits_are_not_tracked() {
        let store = MemoryProgressStore::new();
        let outcome = store.record_visit(
            &UserId::Anonymous,
            HierarchyId::new(),
            SectionId::new(),
            VisitStatus::Incomplete,
            Utc::now(),
        );
        assert_eq!(outcome, VisitOutcome::NotTracked);
        assert_eq!(store.visit_count(), 0);
    }

    #[test]
    fn test_second_visit_is_revisit() {
        let store = MemoryProgressStore::new();
        let user = UserId::known("alice");
        let (hierarchy, section) = (HierarchyId::new(), SectionId::new());

        let first = store.record_visit(&user, hierarchy, section, VisitStatus::Incomplete, Utc::now());
        let second = store.record_visit(&user, hierarchy, section, VisitStatus::Complete, Utc::now());

        assert_eq!(first, VisitOutcome::FirstVisit);
        assert_eq!(second, VisitOutcome::Revisit);
        assert_eq!(store.visit_count(), 1);
        assert_eq!(
            store.visit(&user, section).map(|v| v.status),
            Some(VisitStatus::Complete)
        );
    }
}
