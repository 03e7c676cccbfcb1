/*
 * Copyright 2025 Searchsync Contributors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # Searchsync - Search Index Synchronization Engine
//!
//! Keeps a secondary full-text/faceted search index consistent with a
//! primary record store (photo assets and albums) without blocking primary
//! writes and without query downtime across index schema changes.
//!
//! ## Key pieces
//!
//! - **Versioned schemas**: every schema bakes its version into the physical
//!   collection name; changing a schema means bumping the version.
//! - **Alias indirection**: readers and single-record writers follow an
//!   alias, so a bulk reindex swaps collections atomically under them.
//! - **Dual-mode writes**: buffered batches flushed on a timer by default,
//!   synchronous upserts for callers that opt in to immediacy.
//! - **Job-driven bulk reindex**: full primary-store scan, bulk upsert,
//!   swap-then-delete promotion, serialized per collection.
//!
//! Consistency is eventual with bounded staleness; only operations
//! explicitly marked immediate are synchronous.

pub mod core;
pub mod engine;
pub mod jobs;
pub mod schema;
pub mod services;
pub mod store;

pub use crate::core::{Result, SearchSyncConfig, SearchSyncError};

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::engine::SearchEngine;
use crate::jobs::processor::JobProcessor;
use crate::jobs::{Job, MpscJobQueue};
use crate::services::migration::{MigrationManager, MigrationStatus};
use crate::services::query::{QueryService, SearchFilter, SearchResult};
use crate::services::reindex::ReindexService;
use crate::services::sync::SearchSyncService;
use crate::services::write_buffer::WriteBuffer;
use crate::schema::SearchCollection;
use crate::store::{AlbumStore, AssetStore};

/// Composition root owning the whole synchronization engine.
///
/// Created by the host process with its engine and primary-store
/// collaborators; `start` runs the bootstrap sequence and spawns the flusher
/// and job worker, `stop` cancels them and flushes what is still pending.
pub struct SearchSync {
    config: SearchSyncConfig,
    service: Arc<SearchSyncService>,
    query: QueryService,
    buffer: Arc<WriteBuffer>,
    cancel: CancellationToken,
    job_rx: Option<tokio::sync::mpsc::UnboundedReceiver<Job>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SearchSync {
    pub fn new(
        config: SearchSyncConfig,
        engine: Arc<dyn SearchEngine>,
        assets: Arc<dyn AssetStore>,
        albums: Arc<dyn AlbumStore>,
    ) -> Self {
        let (queue, job_rx) = MpscJobQueue::new();
        let buffer = Arc::new(WriteBuffer::new(engine.clone()));
        let migration = MigrationManager::new(engine.clone());
        let reindex = ReindexService::new(engine.clone(), assets, albums);
        let service = Arc::new(SearchSyncService::new(
            migration,
            reindex,
            buffer.clone(),
            queue,
        ));
        let query = QueryService::new(engine);

        Self {
            config,
            service,
            query,
            buffer,
            cancel: CancellationToken::new(),
            job_rx: Some(job_rx),
            tasks: Vec::new(),
        }
    }

    /// Spawn the flusher and job worker, then run the bootstrap sequence
    /// (ensure schemas, check migration status, enqueue needed reindexes).
    pub async fn start(&mut self) -> Result<MigrationStatus> {
        let job_rx = self
            .job_rx
            .take()
            .ok_or_else(|| SearchSyncError::Config("engine already started".to_string()))?;

        let flusher = self.buffer.clone();
        let interval = self.config.flush.interval();
        let cancel = self.cancel.clone();
        self.tasks
            .push(tokio::spawn(flusher.run_flusher(interval, cancel)));

        let processor = JobProcessor::new(self.service.clone());
        let cancel = self.cancel.clone();
        self.tasks.push(tokio::spawn(async move {
            processor.run(job_rx, cancel).await;
        }));

        let status = self.service.bootstrap().await?;
        info!("Search sync engine started");
        Ok(status)
    }

    /// Cancel background tasks; the flusher runs a final flush before exit.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        info!("Search sync engine stopped");
    }

    /// Synchronization entry points (job handlers, save hooks).
    pub fn service(&self) -> Arc<SearchSyncService> {
        self.service.clone()
    }

    /// Filtered full-text search against the live collection.
    pub async fn search(
        &self,
        collection: SearchCollection,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<SearchResult> {
        self.query.search(collection, query, filter).await
    }
}
