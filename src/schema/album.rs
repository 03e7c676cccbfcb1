// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Album collection schema and projection.

use serde_json::json;

use super::{CollectionSchema, Document, FieldSpec, FieldType, SearchCollection};
use crate::store::Album;

pub const SCHEMA_VERSION: u32 = 2;

pub fn schema() -> CollectionSchema {
    CollectionSchema {
        collection: SearchCollection::Albums,
        version: SCHEMA_VERSION,
        fields: vec![
            FieldSpec::new("owner_id", FieldType::String),
            FieldSpec::new("album_name", FieldType::String),
            FieldSpec::new("created_at", FieldType::String).sort(),
            FieldSpec::new("updated_at", FieldType::String),
            FieldSpec::new("asset_count", FieldType::Number),
        ],
        query_field: "album_name",
        default_sort_field: "created_at",
    }
}

pub fn document(album: &Album) -> Document {
    let mut document = Document::new();
    document.insert("id".to_string(), json!(album.id.to_string()));
    document.insert("owner_id".to_string(), json!(album.owner_id));
    document.insert("album_name".to_string(), json!(album.album_name));
    document.insert("created_at".to_string(), json!(album.created_at.to_rfc3339()));
    document.insert("updated_at".to_string(), json!(album.updated_at.to_rfc3339()));
    document.insert("asset_count".to_string(), json!(album.asset_count));
    document
}
