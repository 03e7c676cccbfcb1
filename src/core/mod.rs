// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

pub mod config;
pub mod error;

pub use config::{EngineConfig, FlushConfig, SearchSyncConfig, StoreConfig};
pub use error::{Result, SearchSyncError};
