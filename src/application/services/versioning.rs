//! Versioning service
//!
//! Copies hierarchies and moves them in and out of structured documents.
//! Imports and copies are built detached and only inserted once complete.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::cache::TraversalCache;
use crate::application::services::SharedStore;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{BlockRegistry, DomainError, HierarchyDocument, HierarchyId};

/// Service for copying, exporting and importing hierarchies.
pub struct VersioningService {
    store: SharedStore,
    cache: Arc<TraversalCache>,
    registry: Arc<BlockRegistry>,
}

impl VersioningService {
    pub fn new(store: SharedStore, cache: Arc<TraversalCache>, registry: Arc<BlockRegistry>) -> Self {
        Self {
            store,
            cache,
            registry,
        }
    }

    /// Deep copy `source` into a new hierarchy called `name`.
    #[instrument(level = "debug", skip(self))]
    pub fn copy_hierarchy(&self, source: HierarchyId, name: &str) -> ApplicationResult<HierarchyId> {
        let mut store = self.store.write();
        let copy = store.copy_hierarchy(source, name, &self.registry)?;
        self.cache.invalidate_hierarchy(copy);
        info!(source = %source, copy = %copy, "copied hierarchy");
        Ok(copy)
    }

    /// Export without identities, suitable for re-import anywhere.
    pub fn export(&self, hierarchy: HierarchyId) -> ApplicationResult<HierarchyDocument> {
        let store = self.store.read();
        Ok(store.hierarchy(hierarchy)?.export(false)?)
    }

    pub fn export_json(&self, hierarchy: HierarchyId) -> ApplicationResult<String> {
        let document = self.export(hierarchy)?;
        serde_json::to_string_pretty(&document).map_err(|e| ApplicationError::OperationFailed {
            context: format!("serialize hierarchy {hierarchy}"),
            source: Box::new(e),
        })
    }

    /// Materialize a document as a new hierarchy with fresh identities.
    #[instrument(level = "debug", skip(self, document), fields(name = %document.name))]
    pub fn import(&self, document: &HierarchyDocument) -> ApplicationResult<HierarchyId> {
        let mut store = self.store.write();
        let id = store.import(document, &self.registry, false)?;
        self.cache.invalidate_hierarchy(id);
        info!(hierarchy = %id, sections = document.root.count(), "imported hierarchy");
        Ok(id)
    }

    pub fn import_json(&self, json: &str) -> ApplicationResult<HierarchyId> {
        let document: HierarchyDocument = serde_json::from_str(json)
            .map_err(|e| DomainError::import("/", format!("malformed document: {e}")))?;
        self.import(&document)
    }
}
