// Copyright 2025 Searchsync Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Typesense HTTP client.
//!
//! Speaks the Typesense REST API: collections, single-document upserts,
//! JSONL bulk import with per-line results, aliases, and search. Connection
//! timeout and bounded retry come from [`EngineConfig`]; retries apply to
//! connect/timeout failures and 5xx replies only.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{
    AliasEntry, DocumentResult, ImportAction, ImportReport, SearchEngine, SearchPage,
    SearchRequest,
};
use crate::core::config::EngineConfig;
use crate::core::error::{Result, SearchSyncError};
use crate::schema::{document_id, CollectionSchema, Document, FieldType};

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

pub struct TypesenseEngine {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    num_retries: u32,
}

impl TypesenseEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connection_timeout())
            .build()?;
        let base_url = Url::parse(&config.base_url())
            .map_err(|e| SearchSyncError::Config(format!("invalid engine url: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            num_retries: config.num_retries,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .unwrap_or_else(|_| unreachable!("engine base url is always a valid http base"));
            path.extend(segments);
        }
        url
    }

    /// Send a request, retrying transport failures and 5xx replies up to
    /// `num_retries` times with linear backoff.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error: Option<SearchSyncError> = None;
        for attempt in 0..=self.num_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
            }
            let request = build().header(API_KEY_HEADER, &self.api_key);
            match request.send().await {
                Ok(response) if response.status().is_server_error() => {
                    last_error = Some(SearchSyncError::Engine(format!(
                        "engine replied {}",
                        response.status()
                    )));
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    let err = SearchSyncError::from(e);
                    match err {
                        SearchSyncError::EngineUnreachable(_) => last_error = Some(err),
                        other => return Err(other),
                    }
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| SearchSyncError::Engine("request failed without reply".to_string())))
    }

    async fn error_for(response: reqwest::Response) -> SearchSyncError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        SearchSyncError::Engine(format!("{}: {}", status, body))
    }
}

fn wire_type(kind: FieldType) -> &'static str {
    match kind {
        FieldType::String => "string",
        FieldType::Bool => "bool",
        FieldType::StringArray => "string[]",
        FieldType::Number => "int32",
    }
}

#[derive(Serialize)]
struct WireField<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    facet: bool,
    sort: bool,
}

#[derive(Serialize)]
struct CreateCollectionBody<'a> {
    name: String,
    fields: Vec<WireField<'a>>,
    default_sorting_field: &'a str,
}

#[derive(Deserialize)]
struct WireAlias {
    name: String,
    collection_name: String,
}

#[derive(Deserialize)]
struct WireAliases {
    aliases: Vec<WireAlias>,
}

#[derive(Serialize)]
struct UpsertAliasBody<'a> {
    collection_name: &'a str,
}

#[derive(Deserialize)]
struct WireImportLine {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct WireHit {
    document: Document,
}

#[derive(Deserialize)]
struct WireSearchResponse {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    hits: Vec<WireHit>,
}

impl From<WireAlias> for AliasEntry {
    fn from(alias: WireAlias) -> Self {
        AliasEntry {
            name: alias.name,
            target: alias.collection_name,
        }
    }
}

#[async_trait]
impl SearchEngine for TypesenseEngine {
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let body = CreateCollectionBody {
            name: schema.physical_name(),
            fields: schema
                .fields
                .iter()
                .map(|field| WireField {
                    name: field.name,
                    kind: wire_type(field.kind),
                    facet: field.facet,
                    sort: field.sort,
                })
                .collect(),
            default_sorting_field: schema.default_sort_field,
        };
        let url = self.url(&["collections"]);
        let response = self.send(|| self.client.post(url.clone()).json(&body)).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(())
    }

    async fn has_collection(&self, physical: &str) -> Result<bool> {
        let url = self.url(&["collections", physical]);
        let response = self.send(|| self.client.get(url.clone())).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(Self::error_for(response).await),
        }
    }

    async fn delete_collection(&self, physical: &str) -> Result<()> {
        let url = self.url(&["collections", physical]);
        let response = self.send(|| self.client.delete(url.clone())).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(SearchSyncError::CollectionNotFound(physical.to_string())),
            status if status.is_success() => Ok(()),
            _ => Err(Self::error_for(response).await),
        }
    }

    async fn upsert_document(&self, physical: &str, document: Document) -> Result<()> {
        let mut url = self.url(&["collections", physical, "documents"]);
        url.query_pairs_mut()
            .append_pair("action", ImportAction::Upsert.as_str());
        let response = self
            .send(|| self.client.post(url.clone()).json(&document))
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(SearchSyncError::CollectionNotFound(physical.to_string())),
            status if status.is_success() => Ok(()),
            _ => Err(Self::error_for(response).await),
        }
    }

    async fn bulk_import(
        &self,
        physical: &str,
        documents: Vec<Document>,
        action: ImportAction,
    ) -> Result<ImportReport> {
        if documents.is_empty() {
            return Ok(ImportReport::default());
        }

        let ids: Vec<String> = documents
            .iter()
            .map(|doc| document_id(doc).unwrap_or("").to_string())
            .collect();
        let mut body = String::new();
        for document in &documents {
            body.push_str(&serde_json::to_string(document)?);
            body.push('\n');
        }

        let mut url = self.url(&["collections", physical, "documents", "import"]);
        url.query_pairs_mut().append_pair("action", action.as_str());
        let response = self
            .send(|| self.client.post(url.clone()).body(body.clone()))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SearchSyncError::CollectionNotFound(physical.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        // One JSONL result line per imported document, in input order.
        let text = response.text().await?;
        let mut report = ImportReport::default();
        for (line, id) in text.lines().zip(ids) {
            let parsed: WireImportLine = serde_json::from_str(line)?;
            report.results.push(DocumentResult {
                id,
                success: parsed.success,
                error: parsed.error,
            });
        }
        Ok(report)
    }

    async fn aliases(&self) -> Result<Vec<AliasEntry>> {
        let url = self.url(&["aliases"]);
        let response = self.send(|| self.client.get(url.clone())).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        let parsed: WireAliases = response.json().await?;
        Ok(parsed.aliases.into_iter().map(AliasEntry::from).collect())
    }

    async fn get_alias(&self, name: &str) -> Result<Option<AliasEntry>> {
        let url = self.url(&["aliases", name]);
        let response = self.send(|| self.client.get(url.clone())).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let parsed: WireAlias = response.json().await?;
                Ok(Some(parsed.into()))
            }
            _ => Err(Self::error_for(response).await),
        }
    }

    async fn set_alias(&self, name: &str, target: &str) -> Result<()> {
        let url = self.url(&["aliases", name]);
        let body = UpsertAliasBody {
            collection_name: target,
        };
        let response = self.send(|| self.client.put(url.clone()).json(&body)).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(())
    }

    async fn search(&self, physical: &str, request: &SearchRequest) -> Result<SearchPage> {
        let mut url = self.url(&["collections", physical, "documents", "search"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", &request.q);
            query.append_pair("query_by", &request.query_by);
            query.append_pair("page", &request.page.to_string());
            if let Some(filter) = &request.filter_by {
                query.append_pair("filter_by", filter);
            }
        }
        let response = self.send(|| self.client.get(url.clone())).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(SearchSyncError::CollectionNotFound(physical.to_string())),
            status if status.is_success() => {
                let parsed: WireSearchResponse = response.json().await?;
                Ok(SearchPage {
                    page: parsed.page.max(1),
                    hits: parsed.hits.into_iter().map(|hit| hit.document).collect(),
                })
            }
            _ => Err(Self::error_for(response).await),
        }
    }
}
