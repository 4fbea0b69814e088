//! Navigation service
//!
//! Next/previous lookups derived from the cached flattened order, plus the
//! per-page view handed to a renderer.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::application::cache::TraversalCache;
use crate::application::services::{cached_order, GatingService, SharedStore};
use crate::application::ApplicationResult;
use crate::domain::{BlockView, DomainError, HierarchyId, SectionId, TreeStore, UserId};

/// Everything a renderer needs for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub section: SectionId,
    pub hierarchy: HierarchyId,
    pub label: String,
    pub url: String,
    pub depth: usize,
    pub blocks: Vec<BlockView>,
    pub next_url: Option<String>,
    pub previous_url: Option<String>,
    pub is_gated_and_denied: bool,
    pub redirect_url: Option<String>,
    /// Some block needs the page wrapped in a form
    pub needs_submit: bool,
    /// The user's answers let them move past this page
    pub blocks_unlocked: bool,
    /// Nested list levels to close after this entry in a table of contents
    pub closing_depth: usize,
}

/// Service for moving through a hierarchy in depth-first order.
pub struct NavigationService {
    store: SharedStore,
    cache: Arc<TraversalCache>,
    gating: Arc<GatingService>,
}

impl NavigationService {
    pub fn new(store: SharedStore, cache: Arc<TraversalCache>, gating: Arc<GatingService>) -> Self {
        Self {
            store,
            cache,
            gating,
        }
    }

    /// Depth-first order of the hierarchy, root first.
    pub fn flatten(&self, hierarchy: HierarchyId) -> ApplicationResult<Arc<Vec<SectionId>>> {
        let store = self.store.read();
        Ok(cached_order(&self.cache, &store, hierarchy)?)
    }

    /// (order, position of `section`) under an already held guard.
    fn locate(
        &self,
        store: &TreeStore,
        section: SectionId,
    ) -> ApplicationResult<(Arc<Vec<SectionId>>, usize)> {
        let hierarchy = store.owner_of(section)?;
        let order = cached_order(&self.cache, store, hierarchy)?;
        let position = order
            .iter()
            .position(|&s| s == section)
            .ok_or_else(|| DomainError::section_not_found(section))?;
        Ok((order, position))
    }

    fn next_in(&self, store: &TreeStore, section: SectionId) -> ApplicationResult<Option<SectionId>> {
        let (order, position) = self.locate(store, section)?;
        Ok(order.get(position + 1).copied())
    }

    /// The root sits at position 0 and is never a previous page.
    fn previous_in(
        &self,
        store: &TreeStore,
        section: SectionId,
    ) -> ApplicationResult<Option<SectionId>> {
        let (order, position) = self.locate(store, section)?;
        Ok(match position {
            0 | 1 => None,
            p => order.get(p - 1).copied(),
        })
    }

    pub fn next(&self, section: SectionId) -> ApplicationResult<Option<SectionId>> {
        let store = self.store.read();
        self.next_in(&store, section)
    }

    pub fn previous(&self, section: SectionId) -> ApplicationResult<Option<SectionId>> {
        let store = self.store.read();
        self.previous_in(&store, section)
    }

    /// Root → parent chain, cached per section.
    pub fn ancestors(&self, section: SectionId) -> ApplicationResult<Arc<Vec<SectionId>>> {
        let store = self.store.read();
        let hierarchy = store.hierarchy_of(section)?;
        Ok(self
            .cache
            .ancestors(hierarchy.id(), section, || hierarchy.ancestors(section))?)
    }

    pub fn closing_children(&self, section: SectionId) -> ApplicationResult<Vec<SectionId>> {
        let store = self.store.read();
        Ok(store.hierarchy_of(section)?.closing_children(section)?)
    }

    /// Build the renderer view of `section` for `user`.
    #[instrument(level = "debug", skip(self))]
    pub fn page_view(
        &self,
        user: &UserId,
        section: SectionId,
        enforce: bool,
    ) -> ApplicationResult<PageView> {
        let store = self.store.read();
        let hierarchy = store.hierarchy_of(section)?;
        let node = hierarchy.section(section)?;

        let decision = self.gating.decide(&store, user, section, enforce)?;
        let url_of = |id: SectionId| hierarchy.absolute_url(id);
        let next_url = self.next_in(&store, section)?.map(url_of).transpose()?;
        let previous_url = self.previous_in(&store, section)?.map(url_of).transpose()?;
        let redirect_url = decision.redirect().map(url_of).transpose()?;

        Ok(PageView {
            section,
            hierarchy: hierarchy.id(),
            label: node.label.clone(),
            url: hierarchy.absolute_url(section)?,
            depth: hierarchy.depth_of(section)?,
            blocks: node.blocks().iter().map(|b| b.view()).collect(),
            next_url,
            previous_url,
            is_gated_and_denied: !decision.is_allowed(),
            redirect_url,
            needs_submit: node.needs_submit(),
            blocks_unlocked: node.blocks_unlocked(user),
            closing_depth: hierarchy.closing_children(section)?.len(),
        })
    }
}
