// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Asset collection schema and projection.

use serde_json::{json, Value};

use super::{CollectionSchema, Document, FieldSpec, FieldType, SearchCollection};
use crate::store::Asset;

pub const SCHEMA_VERSION: u32 = 7;

pub fn schema() -> CollectionSchema {
    CollectionSchema {
        collection: SearchCollection::Assets,
        version: SCHEMA_VERSION,
        fields: vec![
            FieldSpec::new("owner_id", FieldType::String),
            FieldSpec::new("asset_type", FieldType::String).facet(),
            FieldSpec::new("original_path", FieldType::String),
            FieldSpec::new("created_at", FieldType::String).sort(),
            FieldSpec::new("modified_at", FieldType::String),
            FieldSpec::new("updated_at", FieldType::String),
            FieldSpec::new("is_favorite", FieldType::Bool).facet(),
            FieldSpec::new("tags", FieldType::StringArray).facet(),
        ],
        query_field: "original_path",
        default_sort_field: "created_at",
    }
}

/// Project an asset into its index document. Deterministic: the same asset
/// always yields the same document.
pub fn document(asset: &Asset) -> Document {
    let mut document = Document::new();
    document.insert("id".to_string(), json!(asset.id.to_string()));
    document.insert("owner_id".to_string(), json!(asset.owner_id));
    document.insert("asset_type".to_string(), json!(asset.asset_type));
    document.insert("original_path".to_string(), json!(asset.original_path));
    document.insert("created_at".to_string(), json!(asset.created_at.to_rfc3339()));
    document.insert("modified_at".to_string(), json!(asset.modified_at.to_rfc3339()));
    document.insert("updated_at".to_string(), json!(asset.updated_at.to_rfc3339()));
    document.insert("is_favorite".to_string(), json!(asset.is_favorite));
    document.insert(
        "tags".to_string(),
        Value::Array(asset.tags.iter().map(|t| json!(t)).collect()),
    );
    document
}
