// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Schema lifecycle: ensure versioned physical collections exist and report
//! which logical collections still need a bulk reindex onto the current
//! version.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::core::error::Result;
use crate::engine::SearchEngine;
use crate::schema::{self, CollectionSchema, SearchCollection};

/// Per-collection migration need: `true` means the alias does not point at
/// the current-version physical collection and a bulk reindex is required.
/// Always carries one entry per known collection.
pub type MigrationStatus = HashMap<SearchCollection, bool>;

#[derive(Clone)]
pub struct MigrationManager {
    engine: Arc<dyn SearchEngine>,
}

impl MigrationManager {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    /// Create every registry schema's physical collection if absent.
    ///
    /// Idempotent; safe on every process start. A failure on one collection
    /// does not stop the others; the first error is returned after all
    /// collections have been attempted.
    pub async fn ensure_schemas(&self) -> Result<()> {
        let mut first_error = None;
        for schema in schema::registry() {
            if let Err(e) = self.ensure(schema).await {
                error!(
                    "Unable to ensure schema {}/{}: {}",
                    schema.collection,
                    schema.physical_name(),
                    e
                );
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn ensure(&self, schema: &CollectionSchema) -> Result<()> {
        let physical = schema.physical_name();
        if self.engine.has_collection(&physical).await? {
            debug!("Schema up to date: {}/{}", schema.collection, physical);
            return Ok(());
        }
        info!("Creating schema: {}/{}", schema.collection, physical);
        self.engine.create_collection(schema).await
    }

    /// Compare the live alias table against the registry's current versions.
    ///
    /// An unreachable engine fails the whole check; the caller must not
    /// assume a clean state from a partial read.
    pub async fn check_migration_status(&self) -> Result<MigrationStatus> {
        let aliases = self.engine.aliases().await?;
        debug!("Alias mapping: {:?}", aliases);

        let mut status = MigrationStatus::new();
        for collection in SearchCollection::ALL {
            let current = schema::current(collection).physical_name();
            let live = aliases
                .iter()
                .find(|alias| alias.name == collection.as_str())
                .map(|alias| alias.target.as_str());
            status.insert(collection, live != Some(current.as_str()));
        }

        info!("Collections needing migration: {:?}", status);
        Ok(status)
    }
}
