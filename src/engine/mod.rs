// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Search engine wire contract.
//!
//! Abstracts the underlying search engine (Typesense, or the in-memory
//! implementation used in tests and local development). Implementations are
//! injected into the services as `Arc<dyn SearchEngine>`.

pub mod memory;
pub mod typesense;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SearchSyncError};
use crate::schema::{CollectionSchema, Document};

/// One alias binding: logical name -> live physical collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub name: String,
    pub target: String,
}

/// Bulk import write mode. Reindexing always uses `Upsert` so reruns are
/// idempotent per record identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    Create,
    Upsert,
    Update,
}

impl ImportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportAction::Create => "create",
            ImportAction::Upsert => "upsert",
            ImportAction::Update => "update",
        }
    }
}

/// Per-document outcome of a bulk import.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub id: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Aggregate bulk-import outcome. Any failed document makes the whole
/// operation a partial-import failure for the caller.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub results: Vec<DocumentResult>,
}

impl ImportReport {
    pub fn failed_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.id.clone())
            .collect()
    }
}

/// A full-text search request against one physical collection.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub q: String,
    pub query_by: String,
    /// Equality filter expression, e.g. `owner_id:u1`.
    pub filter_by: Option<String>,
    pub page: u32,
}

/// One page of hits.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub page: u32,
    pub hits: Vec<Document>,
}

#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Create a physical collection from a schema definition.
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()>;

    /// Whether a physical collection with this exact name exists.
    async fn has_collection(&self, physical: &str) -> Result<bool>;

    /// Drop a physical collection and all of its documents.
    async fn delete_collection(&self, physical: &str) -> Result<()>;

    /// Insert-or-replace one document, keyed by its `id` field.
    async fn upsert_document(&self, physical: &str, document: Document) -> Result<()>;

    /// Bulk write with per-document results.
    async fn bulk_import(
        &self,
        physical: &str,
        documents: Vec<Document>,
        action: ImportAction,
    ) -> Result<ImportReport>;

    /// The full alias table.
    async fn aliases(&self) -> Result<Vec<AliasEntry>>;

    /// A single alias binding, if set.
    async fn get_alias(&self, name: &str) -> Result<Option<AliasEntry>>;

    /// Point `name` at `target`, replacing any previous binding.
    async fn set_alias(&self, name: &str, target: &str) -> Result<()>;

    /// Execute a search against one physical collection.
    async fn search(&self, physical: &str, request: &SearchRequest) -> Result<SearchPage>;

    /// Resolve a logical name to its live physical collection.
    ///
    /// Always reads the alias table fresh; callers must not cache the result
    /// beyond a single logical operation, or a concurrent alias swap could
    /// leave them writing to a retired collection indefinitely.
    async fn resolve_alias(&self, name: &str) -> Result<String> {
        self.get_alias(name)
            .await?
            .map(|alias| alias.target)
            .ok_or_else(|| SearchSyncError::AliasNotFound(name.to_string()))
    }
}
