// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! File-backed primary store.
//!
//! Reads `assets.json` / `albums.json` (JSON arrays of entities) from a data
//! directory. Used by the server binary as a backfill source and by tests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{Album, AlbumStore, Asset, AssetSearchOptions, AssetStore};
use crate::core::error::{Result, SearchSyncError};

pub struct JsonFileStore {
    assets_path: PathBuf,
    albums_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            assets_path: data_dir.join("assets.json"),
            albums_path: data_dir.join("albums.json"),
        }
    }

    fn read_entities<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            warn!("Store file {} not found, treating as empty", path.display());
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| SearchSyncError::Store(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl AssetStore for JsonFileStore {
    async fn get_all(&self, options: AssetSearchOptions) -> Result<Vec<Asset>> {
        let mut assets: Vec<Asset> = Self::read_entities(&self.assets_path)?;
        if let Some(visible) = options.is_visible {
            assets.retain(|asset| asset.is_visible == visible);
        }
        Ok(assets)
    }
}

#[async_trait]
impl AlbumStore for JsonFileStore {
    async fn get_all(&self) -> Result<Vec<Album>> {
        Self::read_entities(&self.albums_path)
    }
}
