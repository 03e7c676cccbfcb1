// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Primary-store collaborators.
//!
//! The relational store itself is external; the engine consumes it through
//! the [`AssetStore`] / [`AlbumStore`] traits as a source of all records for
//! bulk reindexing. [`json::JsonFileStore`] is a file-backed implementation
//! used by the server binary for backfill and by the integration tests.

pub mod json;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::Result;

/// A photo or video record in the primary store.
///
/// Only the fields projected into the search index (plus `is_visible`,
/// which gates bulk-reindex inclusion) are modeled here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub owner_id: String,
    pub asset_type: String,
    pub original_path: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_favorite: bool,
    pub is_visible: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An album record in the primary store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: Uuid,
    pub owner_id: String,
    pub album_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub asset_count: u32,
}

/// Filter options for the asset full scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetSearchOptions {
    pub is_visible: Option<bool>,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn get_all(&self, options: AssetSearchOptions) -> Result<Vec<Asset>>;
}

#[async_trait]
pub trait AlbumStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Album>>;
}
