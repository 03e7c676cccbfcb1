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

//! Searchsync worker daemon: bootstraps the index schemas, runs the bulk
//! reindex jobs and the periodic write-buffer flusher until shutdown.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use searchsync::engine::memory::MemoryEngine;
use searchsync::engine::typesense::TypesenseEngine;
use searchsync::engine::SearchEngine;
use searchsync::store::json::JsonFileStore;
use searchsync::{SearchSync, SearchSyncConfig};

#[derive(Parser)]
#[command(name = "searchsync-server")]
#[command(about = "Search index synchronization worker")]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    engine_host: Option<String>,

    #[arg(long)]
    engine_port: Option<u16>,

    /// Run against the in-memory engine instead of Typesense (local dev).
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut config = SearchSyncConfig::load(Some(&args.config))?;
    if let Some(data_dir) = args.data_dir {
        config.store.data_dir = data_dir;
    }
    if let Some(host) = args.engine_host {
        config.engine.host = host;
    }
    if let Some(port) = args.engine_port {
        config.engine.port = port;
    }

    info!(
        "Starting searchsync against {} (flush every {}s)",
        config.engine.base_url(),
        config.flush.interval_secs
    );

    let engine: Arc<dyn SearchEngine> = if args.in_memory {
        Arc::new(MemoryEngine::new())
    } else {
        Arc::new(TypesenseEngine::new(&config.engine)?)
    };
    let store = Arc::new(JsonFileStore::new(&config.store.data_dir));

    let mut sync = SearchSync::new(config, engine, store.clone(), store);

    let status = match sync.start().await {
        Ok(status) => status,
        Err(e) => {
            error!("Bootstrap failed: {}", e);
            return Err(e.into());
        }
    };
    info!("Migration status at startup: {:?}", status);

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, stopping...");

    sync.stop().await;
    Ok(())
}
