//! Migration manager integration tests

use anyhow::Result;
use std::collections::HashMap;

use super::common::*;
use searchsync::core::error::SearchSyncError;
use searchsync::engine::memory::EngineOp;
use searchsync::engine::SearchEngine;
use searchsync::jobs::MpscJobQueue;
use searchsync::schema::{self, SearchCollection};
use searchsync::services::sync::SearchSyncService;

#[tokio::test]
async fn test_ensure_schemas_creates_missing_collections() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;

    let expected: Vec<String> = {
        let mut names: Vec<String> = schema::registry()
            .iter()
            .map(|s| s.physical_name())
            .collect();
        names.sort();
        names
    };
    assert_eq!(rig.engine.collection_names(), expected);
    Ok(())
}

#[tokio::test]
async fn test_ensure_schemas_is_idempotent() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;
    rig.migration.ensure_schemas().await?;

    let creates = rig
        .engine
        .ops()
        .into_iter()
        .filter(|op| matches!(op, EngineOp::CreateCollection(_)))
        .count();
    assert_eq!(creates, schema::registry().len());
    Ok(())
}

#[tokio::test]
async fn test_ensure_schemas_continues_past_one_failure() -> Result<()> {
    let rig = rig();
    let assets_physical = schema::current(SearchCollection::Assets).physical_name();
    rig.engine.set_fail_create(Some(&assets_physical));

    let result = rig.migration.ensure_schemas().await;
    assert!(result.is_err());

    // the other collection was still attempted and created
    let albums_physical = schema::current(SearchCollection::Albums).physical_name();
    assert!(rig.engine.has_collection(&albums_physical).await?);
    assert!(!rig.engine.has_collection(&assets_physical).await?);
    Ok(())
}

#[tokio::test]
async fn test_migration_status_flags_stale_and_missing_aliases() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;

    // assets alias one version behind, albums alias current
    let mut old_assets = schema::asset::schema();
    old_assets.version -= 1;
    rig.engine.create_collection(&old_assets).await?;
    rig.engine
        .set_alias("assets", &old_assets.physical_name())
        .await?;
    rig.engine
        .set_alias(
            "albums",
            &schema::current(SearchCollection::Albums).physical_name(),
        )
        .await?;

    let status = rig.migration.check_migration_status().await?;
    let expected: HashMap<SearchCollection, bool> = HashMap::from([
        (SearchCollection::Assets, true),
        (SearchCollection::Albums, false),
    ]);
    assert_eq!(status, expected);
    Ok(())
}

#[tokio::test]
async fn test_migration_status_is_never_partial() -> Result<()> {
    let rig = rig();
    // empty alias table: every collection needs migration
    let status = rig.migration.check_migration_status().await?;
    assert_eq!(status.len(), SearchCollection::ALL.len());
    assert!(status.values().all(|needed| *needed));
    Ok(())
}

#[tokio::test]
async fn test_status_check_fails_fast_when_engine_unreachable() {
    let rig = rig();
    rig.engine.set_unreachable(true);
    let result = rig.migration.check_migration_status().await;
    assert!(matches!(result, Err(SearchSyncError::EngineUnreachable(_))));
}

#[tokio::test]
async fn test_bootstrap_enqueues_reindex_for_stale_collections() -> Result<()> {
    let rig = rig();
    let (queue, mut rx) = MpscJobQueue::new();
    let service = SearchSyncService::new(
        rig.migration.clone(),
        rig.reindex.clone(),
        rig.buffer.clone(),
        queue,
    );

    // albums already live on the current version, assets not aliased at all
    rig.migration.ensure_schemas().await?;
    rig.engine
        .set_alias(
            "albums",
            &schema::current(SearchCollection::Albums).physical_name(),
        )
        .await?;

    let status = service.bootstrap().await?;
    assert_eq!(status[&SearchCollection::Assets], true);
    assert_eq!(status[&SearchCollection::Albums], false);

    let job = rx.try_recv()?;
    assert_eq!(job.name(), "index-assets");
    assert!(rx.try_recv().is_err(), "no job expected for albums");
    Ok(())
}
