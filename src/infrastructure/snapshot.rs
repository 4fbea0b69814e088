//! JSON snapshot persistence of the whole store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{
    BlockRegistry, DomainError, HierarchyDocument, SlugPolicy, TreeStore, UserLocation,
    UserPageVisit,
};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{FileSystem, ProgressStore};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything persisted between runs. Documents carry their ids so
/// progress records stay attached after a restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    #[serde(default)]
    pub hierarchies: Vec<HierarchyDocument>,
    #[serde(default)]
    pub visits: Vec<UserPageVisit>,
    #[serde(default)]
    pub locations: Vec<UserLocation>,
}

impl StoreSnapshot {
    pub fn capture(store: &TreeStore, progress: &dyn ProgressStore) -> InfraResult<Self> {
        let hierarchies = store
            .hierarchies()
            .into_iter()
            .map(|h| h.export(true))
            .collect::<Result<Vec<_>, DomainError>>()?;
        let (visits, locations) = progress.export();
        Ok(Self {
            version: SNAPSHOT_VERSION,
            hierarchies,
            visits,
            locations,
        })
    }

    /// Rebuild a store from the snapshot and load its progress records.
    pub fn restore(
        self,
        registry: &BlockRegistry,
        policy: SlugPolicy,
        progress: &dyn ProgressStore,
    ) -> InfraResult<TreeStore> {
        if self.version != SNAPSHOT_VERSION {
            return Err(DomainError::import(
                "snapshot",
                format!("unsupported snapshot version {}", self.version),
            )
            .into());
        }
        let mut store = TreeStore::new(policy);
        for document in &self.hierarchies {
            store.import(document, registry, true)?;
        }
        progress.restore(self.visits, self.locations);
        Ok(store)
    }
}

/// Reads and writes snapshots through the `FileSystem` boundary.
pub struct SnapshotRepository {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl SnapshotRepository {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot; an absent file yields an empty store.
    #[instrument(level = "debug", skip(self, registry, policy, progress), fields(path = %self.path.display()))]
    pub fn load(
        &self,
        registry: &BlockRegistry,
        policy: SlugPolicy,
        progress: &dyn ProgressStore,
    ) -> InfraResult<TreeStore> {
        if !self.fs.exists(&self.path) {
            debug!("no snapshot yet, starting empty");
            return Ok(TreeStore::new(policy));
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| InfraError::io(format!("read {}", self.path.display()), e))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content).map_err(|e| {
            InfraError::serialization(format!("parse {}", self.path.display()), e)
        })?;
        let store = snapshot.restore(registry, policy, progress)?;
        debug!(hierarchies = store.len(), "loaded snapshot");
        Ok(store)
    }

    /// Write atomically: temp file in the same directory, then rename.
    #[instrument(level = "debug", skip(self, store, progress), fields(path = %self.path.display()))]
    pub fn save(&self, store: &TreeStore, progress: &dyn ProgressStore) -> InfraResult<()> {
        let snapshot = StoreSnapshot::capture(store, progress)?;
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| InfraError::serialization("serialize snapshot", e))?;
        self.fs
            .write_atomic(&self.path, &json)
            .map_err(|e| InfraError::io(format!("write {}", self.path.display()), e))?;
        debug!(hierarchies = snapshot.hierarchies.len(), "saved snapshot");
        Ok(())
    }
}
