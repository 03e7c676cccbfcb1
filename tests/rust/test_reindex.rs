//! Bulk reindex integration tests

use anyhow::Result;

use super::common::*;
use searchsync::core::error::SearchSyncError;
use searchsync::engine::memory::EngineOp;
use searchsync::engine::SearchEngine;
use searchsync::schema::{self, SearchCollection};

#[tokio::test]
async fn test_reindex_all_imports_and_promotes_alias() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;
    rig.store.set_assets(vec![
        make_asset("u1", "/photos/beach.jpg"),
        make_asset("u1", "/photos/city.jpg"),
        make_asset("u2", "/photos/dog.jpg"),
    ]);

    rig.reindex.reindex_all(SearchCollection::Assets).await?;

    let physical = schema::current(SearchCollection::Assets).physical_name();
    assert_eq!(rig.engine.alias_target("assets"), Some(physical.clone()));
    assert_eq!(rig.engine.document_count(&physical), 3);
    Ok(())
}

#[tokio::test]
async fn test_reindex_all_skips_hidden_assets() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;
    let mut hidden = make_asset("u1", "/photos/hidden.jpg");
    hidden.is_visible = false;
    rig.store
        .set_assets(vec![make_asset("u1", "/photos/a.jpg"), hidden]);

    rig.reindex.reindex_all(SearchCollection::Assets).await?;

    let physical = schema::current(SearchCollection::Assets).physical_name();
    assert_eq!(rig.engine.document_count(&physical), 1);
    Ok(())
}

#[tokio::test]
async fn test_rerunning_reindex_is_idempotent() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;
    rig.store.set_assets(vec![make_asset("u1", "/photos/a.jpg")]);

    rig.reindex.reindex_all(SearchCollection::Assets).await?;
    rig.reindex.reindex_all(SearchCollection::Assets).await?;

    let physical = schema::current(SearchCollection::Assets).physical_name();
    assert_eq!(rig.engine.document_count(&physical), 1);

    // the second run re-imports but performs no second swap
    let swaps = rig
        .engine
        .ops()
        .into_iter()
        .filter(|op| matches!(op, EngineOp::SetAlias { .. }))
        .count();
    assert_eq!(swaps, 1);
    Ok(())
}

#[tokio::test]
async fn test_migration_swaps_then_deletes_old_collection() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;

    // simulate the previous deployment: old physical collection, aliased live
    let mut old_schema = schema::asset::schema();
    old_schema.version -= 1;
    let old_physical = old_schema.physical_name();
    rig.engine.create_collection(&old_schema).await?;
    rig.engine.set_alias("assets", &old_physical).await?;

    rig.store.set_assets(vec![make_asset("u1", "/photos/a.jpg")]);
    rig.reindex.reindex_all(SearchCollection::Assets).await?;

    let new_physical = schema::current(SearchCollection::Assets).physical_name();
    assert_eq!(rig.engine.alias_target("assets"), Some(new_physical.clone()));
    assert!(!rig.engine.has_collection(&old_physical).await?);

    // swap strictly precedes the delete: readers never hit a missing collection
    let ops = rig.engine.ops();
    let swap_at = ops
        .iter()
        .position(|op| {
            matches!(op, EngineOp::SetAlias { name, target }
                if name == "assets" && *target == new_physical)
        })
        .expect("alias swap recorded");
    let delete_at = ops
        .iter()
        .position(|op| matches!(op, EngineOp::DeleteCollection(name) if *name == old_physical))
        .expect("old collection delete recorded");
    assert!(swap_at < delete_at);
    Ok(())
}

#[tokio::test]
async fn test_partial_import_failure_aborts_without_swap() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;
    rig.store.set_assets(vec![make_asset("u1", "/photos/a.jpg")]);
    rig.engine.set_fail_imports(true);

    let result = rig.reindex.reindex_all(SearchCollection::Assets).await;
    assert!(matches!(
        result,
        Err(SearchSyncError::SchemaMismatch { .. })
    ));

    // never swap on partial success
    assert_eq!(rig.engine.alias_target("assets"), None);
    assert!(!rig
        .engine
        .ops()
        .iter()
        .any(|op| matches!(op, EngineOp::SetAlias { .. })));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_reindex_runs_are_serialized() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;
    rig.store.set_assets(vec![
        make_asset("u1", "/photos/a.jpg"),
        make_asset("u1", "/photos/b.jpg"),
    ]);

    let (first, second) = tokio::join!(
        rig.reindex.reindex_all(SearchCollection::Assets),
        rig.reindex.reindex_all(SearchCollection::Assets),
    );
    first?;
    second?;

    // exactly one swap, and the index equals the final source snapshot
    let swaps = rig
        .engine
        .ops()
        .into_iter()
        .filter(|op| matches!(op, EngineOp::SetAlias { .. }))
        .count();
    assert_eq!(swaps, 1);

    let physical = schema::current(SearchCollection::Assets).physical_name();
    assert_eq!(rig.engine.document_count(&physical), 2);
    Ok(())
}

#[tokio::test]
async fn test_reindex_one_upserts_against_live_collection() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;
    rig.reindex.reindex_all(SearchCollection::Assets).await?;

    let asset = make_asset("u1", "/photos/new.jpg");
    let document = schema::asset::document(&asset);
    rig.reindex
        .reindex_one(SearchCollection::Assets, document.clone())
        .await?;
    // repeating the upsert leaves exactly one document for that identity
    rig.reindex
        .reindex_one(SearchCollection::Assets, document)
        .await?;

    let physical = schema::current(SearchCollection::Assets).physical_name();
    assert_eq!(rig.engine.document_count(&physical), 1);
    Ok(())
}

#[tokio::test]
async fn test_reindex_one_without_alias_fails() {
    let rig = rig();
    let asset = make_asset("u1", "/photos/a.jpg");
    let result = rig
        .reindex
        .reindex_one(SearchCollection::Assets, schema::asset::document(&asset))
        .await;
    assert!(matches!(result, Err(SearchSyncError::AliasNotFound(_))));
}

#[tokio::test]
async fn test_album_reindex_promotes_alias() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;
    rig.store.set_albums(vec![
        make_album("u1", "Summer 2023"),
        make_album("u2", "Winter"),
    ]);

    rig.reindex.reindex_all(SearchCollection::Albums).await?;

    let physical = schema::current(SearchCollection::Albums).physical_name();
    assert_eq!(rig.engine.alias_target("albums"), Some(physical.clone()));
    assert_eq!(rig.engine.document_count(&physical), 2);
    Ok(())
}
