// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::error::Result;

/// Top-level configuration, read once at startup. No hot reload.
///
/// Sources are layered: built-in defaults, then an optional TOML file,
/// then `SEARCHSYNC_*` environment variables (e.g. `SEARCHSYNC_ENGINE__HOST`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSyncConfig {
    pub engine: EngineConfig,
    pub flush: FlushConfig,
    pub store: StoreConfig,
}

/// Connection settings for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub api_key: String,
    pub connection_timeout_secs: u64,
    pub num_retries: u32,
}

/// Write-buffer flush cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushConfig {
    pub interval_secs: u64,
}

/// Primary-store backfill source for the server binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for SearchSyncConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                host: "typesense".to_string(),
                port: 8108,
                protocol: "http".to_string(),
                api_key: "should-not-be-used".to_string(),
                connection_timeout_secs: 10,
                num_retries: 3,
            },
            flush: FlushConfig { interval_secs: 5 },
            store: StoreConfig {
                data_dir: PathBuf::from("./data"),
            },
        }
    }
}

impl SearchSyncConfig {
    /// Load configuration from defaults, an optional TOML file, and
    /// `SEARCHSYNC_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("SEARCHSYNC").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl EngineConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

impl FlushConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
