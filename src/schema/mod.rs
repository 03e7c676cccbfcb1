// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Versioned collection schemas.
//!
//! A logical collection ([`SearchCollection`]) is stable across schema
//! versions; each [`CollectionSchema`] bakes its version into the physical
//! collection name (`assets-v7`). Schema definitions are compiled into the
//! static registry and never created dynamically. A schema change means
//! bumping the version constant and editing the field list in one place,
//! then letting the migration path reindex into the new physical collection.

pub mod album;
pub mod asset;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::SearchSyncError;

/// Stable identifier of a logical collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchCollection {
    Assets,
    Albums,
}

impl SearchCollection {
    /// Every known collection, in registry order. Status maps iterate this
    /// so they are never partial.
    pub const ALL: [SearchCollection; 2] = [SearchCollection::Assets, SearchCollection::Albums];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchCollection::Assets => "assets",
            SearchCollection::Albums => "albums",
        }
    }
}

impl fmt::Display for SearchCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchCollection {
    type Err = SearchSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assets" => Ok(SearchCollection::Assets),
            "albums" => Ok(SearchCollection::Albums),
            other => Err(SearchSyncError::InvalidCollection(other.to_string())),
        }
    }
}

/// Field value types supported by the index schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bool,
    StringArray,
    Number,
}

/// A single declared index field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldType,
    pub facet: bool,
    pub sort: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldType) -> Self {
        Self {
            name,
            kind,
            facet: false,
            sort: false,
        }
    }

    pub const fn facet(mut self) -> Self {
        self.facet = true;
        self
    }

    pub const fn sort(mut self) -> Self {
        self.sort = true;
        self
    }
}

/// An immutable, versioned schema definition for one logical collection.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub collection: SearchCollection,
    pub version: u32,
    pub fields: Vec<FieldSpec>,
    /// The full-text field queried by the search facade.
    pub query_field: &'static str,
    pub default_sort_field: &'static str,
}

impl CollectionSchema {
    /// Physical collection name inside the search engine.
    pub fn physical_name(&self) -> String {
        format!("{}-v{}", self.collection, self.version)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A serialized index document: the projection of a primary entity through
/// its schema. Always carries an `id` field (the primary-store identity).
pub type Document = serde_json::Map<String, serde_json::Value>;

pub fn document_id(document: &Document) -> Option<&str> {
    document.get("id").and_then(|v| v.as_str())
}

static REGISTRY: Lazy<Vec<CollectionSchema>> = Lazy::new(|| vec![asset::schema(), album::schema()]);

/// All compiled schema definitions, one per logical collection.
pub fn registry() -> &'static [CollectionSchema] {
    &REGISTRY
}

/// The current-version schema for a logical collection.
pub fn current(collection: SearchCollection) -> &'static CollectionSchema {
    REGISTRY
        .iter()
        .find(|schema| schema.collection == collection)
        .unwrap_or_else(|| unreachable!("registry covers every SearchCollection variant"))
}
