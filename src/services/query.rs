// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Read path: alias-resolved, filtered, paginated full-text search.

use std::sync::Arc;
use tracing::debug;

use crate::core::error::Result;
use crate::engine::{SearchEngine, SearchRequest};
use crate::schema::{self, Document, SearchCollection};

/// Equality filters applied to every search.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub owner_id: String,
}

/// One page of schema-shaped hits. Hydrating full primary-store entities
/// from the returned ids is the caller's concern.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub page: u32,
    pub items: Vec<Document>,
}

#[derive(Clone)]
pub struct QueryService {
    engine: Arc<dyn SearchEngine>,
}

impl QueryService {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    /// Full-text query on the schema's designated text field, filtered to
    /// one owner, against whichever physical collection is live right now.
    pub async fn search(
        &self,
        collection: SearchCollection,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<SearchResult> {
        let collection_schema = schema::current(collection);
        let live = self.engine.resolve_alias(collection.as_str()).await?;
        debug!("Searching {} (live: {}) for {:?}", collection, live, query);

        let request = SearchRequest {
            q: query.to_string(),
            query_by: collection_schema.query_field.to_string(),
            filter_by: Some(format!("owner_id:{}", filter.owner_id)),
            page: 1,
        };
        let page = self.engine.search(&live, &request).await?;

        // Pass through only schema-declared fields; anything else an engine
        // might attach to hits is not part of the read contract.
        let items = page
            .hits
            .into_iter()
            .map(|hit| {
                hit.into_iter()
                    .filter(|(name, _)| name == "id" || collection_schema.field(name).is_some())
                    .collect()
            })
            .collect();

        Ok(SearchResult {
            page: page.page,
            items,
        })
    }
}
