// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Worker loop for delivered indexing jobs.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::Job;
use crate::services::sync::SearchSyncService;

pub struct JobProcessor {
    sync: Arc<SearchSyncService>,
}

impl JobProcessor {
    pub fn new(sync: Arc<SearchSyncService>) -> Self {
        Self { sync }
    }

    /// Consume jobs until the channel closes or the token is cancelled.
    ///
    /// A job already being dispatched is allowed to finish its current
    /// engine call; there is no mid-document rollback.
    pub async fn run(&self, mut rx: mpsc::UnboundedReceiver<Job>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Job processor stopping");
                    return;
                }
                job = rx.recv() => {
                    let Some(job) = job else {
                        info!("Job queue closed, processor stopping");
                        return;
                    };
                    self.dispatch(job).await;
                }
            }
        }
    }

    async fn dispatch(&self, job: Job) {
        let name = job.name();
        let result = match job {
            Job::IndexAssets => self.sync.index_assets().await,
            Job::IndexAsset { asset } => self.sync.index_asset(&asset).await,
            Job::IndexAlbums => self.sync.index_albums().await,
            Job::IndexAlbum { album } => self.sync.index_album(&album).await,
        };
        if let Err(e) = result {
            // The queue transport owns retry policy; nothing is retried here.
            error!("Job {} failed: {}", name, e);
        }
    }
}
