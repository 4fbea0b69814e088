//! Service container for dependency injection
//!
//! Wires up all services with their shared dependencies.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::services::{
    shared_store, GatingService, HierarchyService, NavigationService, SharedStore,
    VersioningService,
};
use crate::application::TraversalCache;
use crate::config::Settings;
use crate::domain::{BlockRegistry, SlugPolicy, TreeStore};
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::progress::MemoryProgressStore;
use crate::infrastructure::snapshot::SnapshotRepository;
use crate::infrastructure::traits::{FileSystem, ProgressStore, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    pub store: SharedStore,
    pub cache: Arc<TraversalCache>,
    pub progress: Arc<dyn ProgressStore>,
    pub registry: Arc<BlockRegistry>,

    pub hierarchy: HierarchyService,
    pub gating: Arc<GatingService>,
    pub navigation: NavigationService,
    pub versioning: VersioningService,

    snapshots: SnapshotRepository,
}

impl ServiceContainer {
    /// Create a container with real implementations and an empty store.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(MemoryProgressStore::new()),
            BlockRegistry::with_builtin(),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        progress: Arc<dyn ProgressStore>,
        registry: BlockRegistry,
    ) -> Self {
        let store = TreeStore::new(SlugPolicy::new(settings.slug_max_length));
        Self::assemble(settings, fs, progress, Arc::new(registry), store)
    }

    /// Create a container whose store is restored from the configured snapshot.
    #[instrument(level = "debug", skip_all)]
    pub fn load(settings: Settings) -> InfraResult<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let progress: Arc<dyn ProgressStore> = Arc::new(MemoryProgressStore::new());
        let registry = Arc::new(BlockRegistry::with_builtin());
        let repository = SnapshotRepository::new(Arc::clone(&fs), settings.store_path.clone());
        let store = repository.load(
            &registry,
            SlugPolicy::new(settings.slug_max_length),
            progress.as_ref(),
        )?;
        Ok(Self::assemble(settings, fs, progress, registry, store))
    }

    fn assemble(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        progress: Arc<dyn ProgressStore>,
        registry: Arc<BlockRegistry>,
        store: TreeStore,
    ) -> Self {
        let settings = Arc::new(settings);
        let store = shared_store(store);
        let cache = Arc::new(TraversalCache::new(settings.cache.enabled));

        let hierarchy = HierarchyService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&progress),
            Arc::clone(&registry),
        );
        let gating = Arc::new(GatingService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&progress),
            settings.gating.enforce,
        ));
        let navigation =
            NavigationService::new(Arc::clone(&store), Arc::clone(&cache), Arc::clone(&gating));
        let versioning =
            VersioningService::new(Arc::clone(&store), Arc::clone(&cache), Arc::clone(&registry));
        let snapshots = SnapshotRepository::new(Arc::clone(&fs), settings.store_path.clone());
        debug!(cache = settings.cache.enabled, enforce = settings.gating.enforce, "services ready");

        Self {
            settings,
            fs,
            store,
            cache,
            progress,
            registry,
            hierarchy,
            gating,
            navigation,
            versioning,
            snapshots,
        }
    }

    /// Persist the store and progress records to the configured snapshot.
    pub fn save(&self) -> InfraResult<()> {
        let store = self.store.read();
        self.snapshots.save(&store, self.progress.as_ref())
    }
}
