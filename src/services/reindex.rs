// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Bulk reindex orchestration.
//!
//! `reindex_all` streams the full primary-store contents of one logical
//! collection into the current-version physical collection, then promotes it
//! by swapping the alias and retiring the previously-live collection. The
//! swap-then-delete ordering is structural: the retired name is only known
//! from the pre-swap alias read and is deleted strictly after `set_alias`
//! returns, so reads never hit a missing collection.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::core::error::{Result, SearchSyncError};
use crate::engine::{ImportAction, SearchEngine};
use crate::schema::{self, Document, SearchCollection};
use crate::store::{AlbumStore, AssetSearchOptions, AssetStore};

#[derive(Clone)]
pub struct ReindexService {
    engine: Arc<dyn SearchEngine>,
    assets: Arc<dyn AssetStore>,
    albums: Arc<dyn AlbumStore>,
    // One lock per logical collection: concurrent reindex runs of the same
    // collection would swap aliases out of order and could delete a
    // collection still being populated.
    locks: Arc<DashMap<SearchCollection, Arc<Mutex<()>>>>,
}

impl ReindexService {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        assets: Arc<dyn AssetStore>,
        albums: Arc<dyn AlbumStore>,
    ) -> Self {
        Self {
            engine,
            assets,
            albums,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, collection: SearchCollection) -> Arc<Mutex<()>> {
        self.locks
            .entry(collection)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Full scan -> project -> bulk upsert into the current-version physical
    /// collection -> alias swap. Rerunning is safe: upserts are idempotent
    /// per record identity and an already-current alias is left untouched.
    pub async fn reindex_all(&self, collection: SearchCollection) -> Result<()> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;

        let documents = self.load_documents(collection).await?;
        let physical = schema::current(collection).physical_name();
        info!("Indexing {} {} records into {}", documents.len(), collection, physical);

        let total = documents.len();
        let report = self
            .engine
            .bulk_import(&physical, documents, ImportAction::Upsert)
            .await?;
        let failed_ids = report.failed_ids();
        if !failed_ids.is_empty() {
            // Partial success never promotes: the alias keeps serving the
            // previous collection until a clean full import lands.
            error!(
                "Bulk import into {} rejected {} of {} documents: {:?}",
                physical,
                failed_ids.len(),
                total,
                failed_ids
            );
            return Err(SearchSyncError::SchemaMismatch {
                collection: collection.to_string(),
                total,
                failed_ids,
            });
        }

        self.promote(collection, &physical).await
    }

    /// Immediate single-document upsert against the live (aliased) physical
    /// collection, resolved fresh on every call. If the alias is swapped
    /// mid-operation the write lands on the collection that was live at
    /// resolution time; the next bulk reindex corrects it.
    pub async fn reindex_one(&self, collection: SearchCollection, document: Document) -> Result<()> {
        let live = self.engine.resolve_alias(collection.as_str()).await?;
        self.engine.upsert_document(&live, document).await
    }

    async fn load_documents(&self, collection: SearchCollection) -> Result<Vec<Document>> {
        match collection {
            SearchCollection::Assets => {
                let assets = self
                    .assets
                    .get_all(AssetSearchOptions {
                        is_visible: Some(true),
                    })
                    .await?;
                Ok(assets.iter().map(schema::asset::document).collect())
            }
            SearchCollection::Albums => {
                let albums = self.albums.get_all().await?;
                Ok(albums.iter().map(schema::album::document).collect())
            }
        }
    }

    /// Point the alias at `physical`, then retire the previously-live
    /// collection. No-op when the alias already targets `physical`.
    async fn promote(&self, collection: SearchCollection, physical: &str) -> Result<()> {
        let previous = self.engine.get_alias(collection.as_str()).await?;

        if previous.as_ref().map(|alias| alias.target.as_str()) == Some(physical) {
            info!("Alias {} already targets {}", collection, physical);
            return Ok(());
        }

        info!(
            "Using new schema: {} => {}",
            previous
                .as_ref()
                .map(|alias| alias.target.as_str())
                .unwrap_or("(unset)"),
            physical
        );
        self.engine.set_alias(collection.as_str(), physical).await?;

        if let Some(previous) = previous {
            info!("Deleting old schema: {}", previous.target);
            if let Err(e) = self.engine.delete_collection(&previous.target).await {
                // The swap already succeeded; a stale collection only wastes
                // space and the next migration pass can remove it.
                warn!("Unable to delete retired collection {}: {}", previous.target, e);
            }
        }
        Ok(())
    }
}
