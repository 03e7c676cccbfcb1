// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Indexing jobs.
//!
//! The queue transport is an external collaborator; the engine only needs an
//! enqueue contract ([`JobQueue`]) and a worker that dispatches delivered
//! jobs ([`processor::JobProcessor`]). [`MpscJobQueue`] is the in-process
//! implementation used by the server binary and tests. The external queue is
//! expected to run the bulk kinds with concurrency 1 and to own retry policy
//! for failed jobs; the per-collection locks in the reindex service make
//! higher worker concurrency safe regardless.

pub mod processor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::core::error::{Result, SearchSyncError};
use crate::schema::SearchCollection;
use crate::store::{Album, Asset};

/// Queue the four indexing job kinds are delivered on.
pub const QUEUE_NAME: &str = "search-index-queue";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Job {
    /// Bulk reindex of every asset.
    IndexAssets,
    /// Immediate single-asset index.
    IndexAsset { asset: Asset },
    /// Bulk reindex of every album.
    IndexAlbums,
    /// Immediate single-album index.
    IndexAlbum { album: Album },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::IndexAssets => "index-assets",
            Job::IndexAsset { .. } => "index-asset",
            Job::IndexAlbums => "index-albums",
            Job::IndexAlbum { .. } => "index-album",
        }
    }

    pub fn collection(&self) -> SearchCollection {
        match self {
            Job::IndexAssets | Job::IndexAsset { .. } => SearchCollection::Assets,
            Job::IndexAlbums | Job::IndexAlbum { .. } => SearchCollection::Albums,
        }
    }

    /// Bulk reindex job for a logical collection.
    pub fn bulk(collection: SearchCollection) -> Job {
        match collection {
            SearchCollection::Assets => Job::IndexAssets,
            SearchCollection::Albums => Job::IndexAlbums,
        }
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn add(&self, job: Job) -> Result<()>;
}

/// In-process queue backed by an unbounded tokio channel.
pub struct MpscJobQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl MpscJobQueue {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Job>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl JobQueue for MpscJobQueue {
    async fn add(&self, job: Job) -> Result<()> {
        self.tx
            .send(job)
            .map_err(|e| SearchSyncError::Queue(format!("enqueue {} failed: {}", e.0.name(), e)))
    }
}
