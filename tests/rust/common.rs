//! Common fixtures for integration tests

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::Once;
use uuid::Uuid;

use searchsync::core::error::Result;
use searchsync::engine::memory::MemoryEngine;
use searchsync::engine::SearchEngine;
use searchsync::services::migration::MigrationManager;
use searchsync::services::query::QueryService;
use searchsync::services::reindex::ReindexService;
use searchsync::services::write_buffer::WriteBuffer;
use searchsync::store::{Album, AlbumStore, Asset, AssetSearchOptions, AssetStore};

static INIT: Once = Once::new();

/// Initialize test environment
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();
    });
}

/// Primary store fixture with settable contents.
#[derive(Default)]
pub struct FixtureStore {
    assets: RwLock<Vec<Asset>>,
    albums: RwLock<Vec<Album>>,
}

impl FixtureStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_assets(&self, assets: Vec<Asset>) {
        *self.assets.write() = assets;
    }

    pub fn set_albums(&self, albums: Vec<Album>) {
        *self.albums.write() = albums;
    }

    pub fn push_asset(&self, asset: Asset) {
        self.assets.write().push(asset);
    }
}

#[async_trait]
impl AssetStore for FixtureStore {
    async fn get_all(&self, options: AssetSearchOptions) -> Result<Vec<Asset>> {
        let mut assets = self.assets.read().clone();
        if let Some(visible) = options.is_visible {
            assets.retain(|asset| asset.is_visible == visible);
        }
        Ok(assets)
    }
}

#[async_trait]
impl AlbumStore for FixtureStore {
    async fn get_all(&self) -> Result<Vec<Album>> {
        Ok(self.albums.read().clone())
    }
}

pub fn make_asset(owner_id: &str, original_path: &str) -> Asset {
    let at = Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap();
    Asset {
        id: Uuid::new_v4(),
        owner_id: owner_id.to_string(),
        asset_type: "IMAGE".to_string(),
        original_path: original_path.to_string(),
        created_at: at,
        modified_at: at,
        updated_at: at,
        is_favorite: false,
        is_visible: true,
        tags: Vec::new(),
    }
}

pub fn make_album(owner_id: &str, album_name: &str) -> Album {
    let at = Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap();
    Album {
        id: Uuid::new_v4(),
        owner_id: owner_id.to_string(),
        album_name: album_name.to_string(),
        created_at: at,
        updated_at: at,
        asset_count: 0,
    }
}

/// Everything wired against one shared in-memory engine.
pub struct TestRig {
    pub engine: Arc<MemoryEngine>,
    pub store: Arc<FixtureStore>,
    pub migration: MigrationManager,
    pub reindex: ReindexService,
    pub buffer: Arc<WriteBuffer>,
    pub query: QueryService,
}

pub fn rig() -> TestRig {
    init_test_env();
    let engine = Arc::new(MemoryEngine::new());
    let store = FixtureStore::new();
    let dyn_engine: Arc<dyn SearchEngine> = engine.clone();
    TestRig {
        migration: MigrationManager::new(dyn_engine.clone()),
        reindex: ReindexService::new(dyn_engine.clone(), store.clone(), store.clone()),
        buffer: Arc::new(WriteBuffer::new(dyn_engine.clone())),
        query: QueryService::new(dyn_engine),
        engine,
        store,
    }
}
