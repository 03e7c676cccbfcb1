// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SearchSyncError>;

#[derive(Error, Debug)]
pub enum SearchSyncError {
    #[error("Search engine unreachable: {0}")]
    EngineUnreachable(String),

    #[error("Search engine request failed: {0}")]
    Engine(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("No alias registered for collection: {0}")]
    AliasNotFound(String),

    #[error("Invalid collection: {0}")]
    InvalidCollection(String),

    #[error("Schema mismatch importing into {collection}: {} of {total} documents rejected", .failed_ids.len())]
    SchemaMismatch {
        collection: String,
        total: usize,
        failed_ids: Vec<String>,
    },

    #[error("Primary store error: {0}")]
    Store(String),

    #[error("Job queue error: {0}")]
    Queue(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Disk I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SearchSyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SearchSyncError::EngineUnreachable(err.to_string())
        } else {
            SearchSyncError::Engine(err.to_string())
        }
    }
}

impl From<config::ConfigError> for SearchSyncError {
    fn from(err: config::ConfigError) -> Self {
        SearchSyncError::Config(err.to_string())
    }
}
