// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Synchronization entry points.
//!
//! Composes the migration manager, reindex orchestrator, and write buffer
//! behind the operations the host and the job workers call: the bootstrap
//! sequence, the four job handlers, and the post-save hooks fired after
//! every primary-store write.

use std::sync::Arc;
use tracing::info;

use super::migration::{MigrationManager, MigrationStatus};
use super::reindex::ReindexService;
use super::write_buffer::WriteBuffer;
use crate::core::error::Result;
use crate::jobs::{Job, JobQueue};
use crate::schema::{self, SearchCollection};
use crate::store::{Album, Asset};

pub struct SearchSyncService {
    migration: MigrationManager,
    reindex: ReindexService,
    buffer: Arc<WriteBuffer>,
    queue: Arc<dyn JobQueue>,
}

impl SearchSyncService {
    pub fn new(
        migration: MigrationManager,
        reindex: ReindexService,
        buffer: Arc<WriteBuffer>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            migration,
            reindex,
            buffer,
            queue,
        }
    }

    /// Startup contract: ensure schemas exist, then enqueue a bulk reindex
    /// for every collection whose alias is not on the current version.
    pub async fn bootstrap(&self) -> Result<MigrationStatus> {
        self.migration.ensure_schemas().await?;

        let status = self.migration.check_migration_status().await?;
        for collection in SearchCollection::ALL {
            if status.get(&collection).copied().unwrap_or(false) {
                info!("Queueing bulk reindex for {}", collection);
                self.queue.add(Job::bulk(collection)).await?;
            }
        }
        Ok(status)
    }

    /// Bulk reindex of all visible assets. Failures propagate to the job
    /// worker; the queue's bounded retry policy owns retries.
    pub async fn index_assets(&self) -> Result<()> {
        self.reindex.reindex_all(SearchCollection::Assets).await
    }

    pub async fn index_albums(&self) -> Result<()> {
        self.reindex.reindex_all(SearchCollection::Albums).await
    }

    /// Immediate single-asset index against the live collection.
    pub async fn index_asset(&self, asset: &Asset) -> Result<()> {
        self.reindex
            .reindex_one(SearchCollection::Assets, schema::asset::document(asset))
            .await
    }

    pub async fn index_album(&self, album: &Album) -> Result<()> {
        self.reindex
            .reindex_one(SearchCollection::Albums, schema::album::document(album))
            .await
    }

    /// Post-save hook: buffered by default. Latency-sensitive callers that
    /// need the write visible immediately use [`Self::index_asset`] instead.
    pub fn on_asset_saved(&self, asset: &Asset) {
        self.buffer
            .enqueue(SearchCollection::Assets, schema::asset::document(asset));
    }

    pub fn on_album_saved(&self, album: &Album) {
        self.buffer
            .enqueue(SearchCollection::Albums, schema::album::document(album));
    }
}
