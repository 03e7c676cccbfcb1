// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! In-memory search engine.
//!
//! Full implementation of the wire contract backed by process memory:
//! schema-validating upserts, an alias table, and an operation log that
//! tests use to assert ordering properties (e.g. that no collection is
//! deleted before the alias points elsewhere). Also handy for local
//! development without a running search engine.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use super::{
    AliasEntry, DocumentResult, ImportAction, ImportReport, SearchEngine, SearchPage,
    SearchRequest,
};
use crate::core::error::{Result, SearchSyncError};
use crate::schema::{document_id, CollectionSchema, Document, FieldType};

/// One recorded engine operation, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOp {
    CreateCollection(String),
    DeleteCollection(String),
    SetAlias { name: String, target: String },
    BulkImport { collection: String, count: usize },
    Upsert { collection: String, id: String },
}

struct StoredCollection {
    schema: CollectionSchema,
    documents: BTreeMap<String, Document>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, StoredCollection>,
    aliases: HashMap<String, String>,
    ops: Vec<EngineOp>,
}

#[derive(Default)]
pub struct MemoryEngine {
    inner: RwLock<Inner>,
    fail_imports: AtomicBool,
    unreachable: AtomicBool,
    fail_create_for: RwLock<Option<String>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every bulk import report per-document failures.
    pub fn set_fail_imports(&self, fail: bool) {
        self.fail_imports.store(fail, Ordering::SeqCst);
    }

    /// Simulate an engine outage: every call fails fast.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Fail creation of one specific physical collection.
    pub fn set_fail_create(&self, physical: Option<&str>) {
        *self.fail_create_for.write() = physical.map(str::to_string);
    }

    /// The operation log, in call order.
    pub fn ops(&self) -> Vec<EngineOp> {
        self.inner.read().ops.clone()
    }

    pub fn document_count(&self, physical: &str) -> usize {
        self.inner
            .read()
            .collections
            .get(physical)
            .map_or(0, |c| c.documents.len())
    }

    pub fn documents(&self, physical: &str) -> Vec<Document> {
        self.inner
            .read()
            .collections
            .get(physical)
            .map_or_else(Vec::new, |c| c.documents.values().cloned().collect())
    }

    pub fn alias_target(&self, name: &str) -> Option<String> {
        self.inner.read().aliases.get(name).cloned()
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().collections.keys().cloned().collect();
        names.sort();
        names
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(SearchSyncError::EngineUnreachable(
                "simulated outage".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate a document against the collection schema: unknown fields are
    /// dropped, a missing declared field rejects the document.
    fn conform(schema: &CollectionSchema, document: &Document) -> std::result::Result<(String, Document), String> {
        let id = document_id(document)
            .ok_or_else(|| "document is missing a string `id`".to_string())?
            .to_string();

        let mut conformed = Document::new();
        conformed.insert("id".to_string(), serde_json::json!(id));
        for field in &schema.fields {
            let value = document
                .get(field.name)
                .ok_or_else(|| format!("missing required field `{}`", field.name))?;
            let type_ok = match field.kind {
                FieldType::String => value.is_string(),
                FieldType::Bool => value.is_boolean(),
                FieldType::Number => value.is_number(),
                FieldType::StringArray => value
                    .as_array()
                    .map_or(false, |items| items.iter().all(|v| v.is_string())),
            };
            if !type_ok {
                return Err(format!("field `{}` has the wrong type", field.name));
            }
            conformed.insert(field.name.to_string(), value.clone());
        }
        Ok((id, conformed))
    }
}

#[async_trait]
impl SearchEngine for MemoryEngine {
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        self.check_reachable()?;
        let physical = schema.physical_name();
        if self.fail_create_for.read().as_deref() == Some(physical.as_str()) {
            return Err(SearchSyncError::Engine(format!(
                "simulated create failure for {}",
                physical
            )));
        }
        let mut inner = self.inner.write();
        if inner.collections.contains_key(&physical) {
            return Err(SearchSyncError::Engine(format!(
                "collection {} already exists",
                physical
            )));
        }
        inner.collections.insert(
            physical.clone(),
            StoredCollection {
                schema: schema.clone(),
                documents: BTreeMap::new(),
            },
        );
        inner.ops.push(EngineOp::CreateCollection(physical));
        Ok(())
    }

    async fn has_collection(&self, physical: &str) -> Result<bool> {
        self.check_reachable()?;
        Ok(self.inner.read().collections.contains_key(physical))
    }

    async fn delete_collection(&self, physical: &str) -> Result<()> {
        self.check_reachable()?;
        let mut inner = self.inner.write();
        if inner.collections.remove(physical).is_none() {
            return Err(SearchSyncError::CollectionNotFound(physical.to_string()));
        }
        inner.ops.push(EngineOp::DeleteCollection(physical.to_string()));
        Ok(())
    }

    async fn upsert_document(&self, physical: &str, document: Document) -> Result<()> {
        self.check_reachable()?;
        let mut inner = self.inner.write();
        let collection = inner
            .collections
            .get_mut(physical)
            .ok_or_else(|| SearchSyncError::CollectionNotFound(physical.to_string()))?;
        let (id, conformed) = Self::conform(&collection.schema, &document)
            .map_err(SearchSyncError::Engine)?;
        collection.documents.insert(id.clone(), conformed);
        inner.ops.push(EngineOp::Upsert {
            collection: physical.to_string(),
            id,
        });
        Ok(())
    }

    async fn bulk_import(
        &self,
        physical: &str,
        documents: Vec<Document>,
        _action: ImportAction,
    ) -> Result<ImportReport> {
        self.check_reachable()?;
        let fail_all = self.fail_imports.load(Ordering::SeqCst);
        let mut inner = self.inner.write();
        let count = documents.len();
        let collection = inner
            .collections
            .get_mut(physical)
            .ok_or_else(|| SearchSyncError::CollectionNotFound(physical.to_string()))?;

        let mut report = ImportReport::default();
        for document in documents {
            let id = document_id(&document).unwrap_or("").to_string();
            if fail_all {
                report.results.push(DocumentResult {
                    id,
                    success: false,
                    error: Some("import failed".to_string()),
                });
                continue;
            }
            match Self::conform(&collection.schema, &document) {
                Ok((id, conformed)) => {
                    collection.documents.insert(id.clone(), conformed);
                    report.results.push(DocumentResult {
                        id,
                        success: true,
                        error: None,
                    });
                }
                Err(message) => {
                    report.results.push(DocumentResult {
                        id,
                        success: false,
                        error: Some(message),
                    });
                }
            }
        }
        inner.ops.push(EngineOp::BulkImport {
            collection: physical.to_string(),
            count,
        });
        Ok(report)
    }

    async fn aliases(&self) -> Result<Vec<AliasEntry>> {
        self.check_reachable()?;
        let mut entries: Vec<AliasEntry> = self
            .inner
            .read()
            .aliases
            .iter()
            .map(|(name, target)| AliasEntry {
                name: name.clone(),
                target: target.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn get_alias(&self, name: &str) -> Result<Option<AliasEntry>> {
        self.check_reachable()?;
        Ok(self
            .inner
            .read()
            .aliases
            .get(name)
            .map(|target| AliasEntry {
                name: name.to_string(),
                target: target.clone(),
            }))
    }

    async fn set_alias(&self, name: &str, target: &str) -> Result<()> {
        self.check_reachable()?;
        let mut inner = self.inner.write();
        inner.aliases.insert(name.to_string(), target.to_string());
        inner.ops.push(EngineOp::SetAlias {
            name: name.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    async fn search(&self, physical: &str, request: &SearchRequest) -> Result<SearchPage> {
        self.check_reachable()?;
        let inner = self.inner.read();
        let collection = inner
            .collections
            .get(physical)
            .ok_or_else(|| SearchSyncError::CollectionNotFound(physical.to_string()))?;

        let needle = request.q.to_lowercase();
        let filter = request.filter_by.as_deref().and_then(parse_filter);

        let hits = collection
            .documents
            .values()
            .filter(|document| {
                let text_match = request.q == "*"
                    || request.q.is_empty()
                    || document
                        .get(&request.query_by)
                        .and_then(|v| v.as_str())
                        .map_or(false, |text| text.to_lowercase().contains(&needle));
                let filter_match = filter.as_ref().map_or(true, |(field, expected)| {
                    document.get(field.as_str()).map_or(false, |v| match v {
                        serde_json::Value::String(s) => s == expected,
                        other => &other.to_string() == expected,
                    })
                });
                text_match && filter_match
            })
            .cloned()
            .collect();

        Ok(SearchPage {
            page: request.page.max(1),
            hits,
        })
    }
}

/// Parse a `field:value` equality expression.
fn parse_filter(expression: &str) -> Option<(String, String)> {
    let (field, value) = expression.split_once(':')?;
    Some((field.trim().to_string(), value.trim().to_string()))
}
