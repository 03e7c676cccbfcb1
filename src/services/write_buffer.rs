// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Buffered write path.
//!
//! Single-record index calls default to enqueueing into a per-collection
//! pending batch; a periodic flusher drains every non-empty batch with one
//! bulk upsert against the live (aliased) collection. Batches are taken out
//! before the engine call and are not restored on failure: a dropped batch
//! costs bounded staleness, not unbounded memory, and the bulk reindex path
//! is the correcting mechanism. Callers that need delivery guarantees use
//! `index_immediate`.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::error::Result;
use crate::engine::{ImportAction, SearchEngine};
use crate::schema::{Document, SearchCollection};

pub struct WriteBuffer {
    engine: Arc<dyn SearchEngine>,
    batches: Mutex<HashMap<SearchCollection, Vec<Document>>>,
    // Skip a collection whose previous flush is still running rather than
    // stacking a second concurrent flush of the same batch target.
    in_flight: DashMap<SearchCollection, Arc<tokio::sync::Mutex<()>>>,
}

impl WriteBuffer {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self {
            engine,
            batches: Mutex::new(HashMap::new()),
            in_flight: DashMap::new(),
        }
    }

    /// Queue a document for the next flush tick. No delivery guarantee.
    pub fn enqueue(&self, collection: SearchCollection, document: Document) {
        self.batches
            .lock()
            .entry(collection)
            .or_default()
            .push(document);
    }

    /// Synchronous upsert against the live collection, bypassing the buffer.
    pub async fn index_immediate(
        &self,
        collection: SearchCollection,
        document: Document,
    ) -> Result<()> {
        let live = self.engine.resolve_alias(collection.as_str()).await?;
        self.engine.upsert_document(&live, document).await
    }

    /// Number of documents pending for a collection.
    pub fn pending(&self, collection: SearchCollection) -> usize {
        self.batches
            .lock()
            .get(&collection)
            .map_or(0, |batch| batch.len())
    }

    /// One flush tick: drain every non-empty batch and bulk-upsert it into
    /// the collection its alias currently targets.
    pub async fn flush(&self) {
        let drained: Vec<(SearchCollection, Vec<Document>)> = {
            let mut batches = self.batches.lock();
            batches
                .iter_mut()
                .filter(|(_, batch)| !batch.is_empty())
                .map(|(collection, batch)| (*collection, std::mem::take(batch)))
                .collect()
        };

        for (collection, documents) in drained {
            let guard = self
                .in_flight
                .entry(collection)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone();
            let Ok(_in_flight) = guard.try_lock() else {
                // Coalesce into the next tick instead of stacking a second
                // concurrent flush of the same collection.
                debug!(
                    "Previous flush of {} still running, deferring {} documents",
                    collection,
                    documents.len()
                );
                let mut batches = self.batches.lock();
                let batch = batches.entry(collection).or_default();
                let mut documents = documents;
                documents.append(batch);
                *batch = documents;
                continue;
            };

            if let Err(e) = self.flush_batch(collection, documents).await {
                warn!("Flush of {} failed, batch dropped: {}", collection, e);
            }
        }
    }

    async fn flush_batch(
        &self,
        collection: SearchCollection,
        documents: Vec<Document>,
    ) -> Result<()> {
        let count = documents.len();
        let live = self.engine.resolve_alias(collection.as_str()).await?;
        let report = self
            .engine
            .bulk_import(&live, documents, ImportAction::Upsert)
            .await?;
        let failed = report.failed_ids();
        if failed.is_empty() {
            debug!("Flushed {} documents into {}", count, live);
        } else {
            warn!(
                "Flush into {} dropped {} of {} documents: {:?}",
                live,
                failed.len(),
                count,
                failed
            );
        }
        Ok(())
    }

    /// Periodic flush loop. Runs until the token is cancelled, then attempts
    /// one final flush so shutdown does not silently discard pending writes.
    pub async fn run_flusher(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval fires immediately once; swallow that tick
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Flusher stopping, running final flush");
                    self.flush().await;
                    return;
                }
                _ = ticker.tick() => {
                    self.flush().await;
                }
            }
        }
    }
}
