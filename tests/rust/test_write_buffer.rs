//! Write buffer integration tests

use anyhow::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::common::*;
use searchsync::engine::memory::EngineOp;
use searchsync::engine::SearchEngine;
use searchsync::schema::{self, SearchCollection};

async fn promote_current(rig: &TestRig) -> Result<String> {
    rig.migration.ensure_schemas().await?;
    let physical = schema::current(SearchCollection::Assets).physical_name();
    rig.engine.set_alias("assets", &physical).await?;
    Ok(physical)
}

fn bulk_imports(rig: &TestRig) -> usize {
    rig.engine
        .ops()
        .into_iter()
        .filter(|op| matches!(op, EngineOp::BulkImport { .. }))
        .count()
}

#[tokio::test]
async fn test_flush_drains_batch_and_clears_state() -> Result<()> {
    let rig = rig();
    let physical = promote_current(&rig).await?;

    rig.buffer.enqueue(
        SearchCollection::Assets,
        schema::asset::document(&make_asset("u1", "/photos/a.jpg")),
    );
    rig.buffer.enqueue(
        SearchCollection::Assets,
        schema::asset::document(&make_asset("u1", "/photos/b.jpg")),
    );
    assert_eq!(rig.buffer.pending(SearchCollection::Assets), 2);

    rig.buffer.flush().await;
    assert_eq!(rig.buffer.pending(SearchCollection::Assets), 0);
    assert_eq!(rig.engine.document_count(&physical), 2);
    assert_eq!(bulk_imports(&rig), 1);

    // a tick with nothing pending issues no import call
    rig.buffer.flush().await;
    assert_eq!(bulk_imports(&rig), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_flush_drops_batch() -> Result<()> {
    let rig = rig();
    promote_current(&rig).await?;
    rig.engine.set_fail_imports(true);

    rig.buffer.enqueue(
        SearchCollection::Assets,
        schema::asset::document(&make_asset("u1", "/photos/a.jpg")),
    );
    rig.buffer.flush().await;

    // best-effort: the batch is gone, not retried
    assert_eq!(rig.buffer.pending(SearchCollection::Assets), 0);
    let first_flush_imports = bulk_imports(&rig);

    rig.engine.set_fail_imports(false);
    rig.buffer.flush().await;
    assert_eq!(bulk_imports(&rig), first_flush_imports);
    Ok(())
}

#[tokio::test]
async fn test_flush_without_alias_drops_batch() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;

    rig.buffer.enqueue(
        SearchCollection::Assets,
        schema::asset::document(&make_asset("u1", "/photos/a.jpg")),
    );
    rig.buffer.flush().await;

    assert_eq!(rig.buffer.pending(SearchCollection::Assets), 0);
    assert_eq!(bulk_imports(&rig), 0);
    Ok(())
}

#[tokio::test]
async fn test_index_immediate_bypasses_buffer() -> Result<()> {
    let rig = rig();
    let physical = promote_current(&rig).await?;

    rig.buffer
        .index_immediate(
            SearchCollection::Assets,
            schema::asset::document(&make_asset("u1", "/photos/now.jpg")),
        )
        .await?;

    assert_eq!(rig.buffer.pending(SearchCollection::Assets), 0);
    assert_eq!(rig.engine.document_count(&physical), 1);
    Ok(())
}

#[tokio::test]
async fn test_flusher_runs_final_flush_on_cancellation() -> Result<()> {
    let rig = rig();
    let physical = promote_current(&rig).await?;

    let cancel = CancellationToken::new();
    let task = tokio::spawn(
        rig.buffer
            .clone()
            .run_flusher(Duration::from_secs(3600), cancel.clone()),
    );

    rig.buffer.enqueue(
        SearchCollection::Assets,
        schema::asset::document(&make_asset("u1", "/photos/late.jpg")),
    );
    cancel.cancel();
    task.await?;

    assert_eq!(rig.engine.document_count(&physical), 1);
    Ok(())
}

#[tokio::test]
async fn test_buffered_batches_are_per_collection() -> Result<()> {
    let rig = rig();
    rig.migration.ensure_schemas().await?;
    let assets_physical = schema::current(SearchCollection::Assets).physical_name();
    let albums_physical = schema::current(SearchCollection::Albums).physical_name();
    rig.engine.set_alias("assets", &assets_physical).await?;
    rig.engine.set_alias("albums", &albums_physical).await?;

    rig.buffer.enqueue(
        SearchCollection::Assets,
        schema::asset::document(&make_asset("u1", "/photos/a.jpg")),
    );
    rig.buffer.enqueue(
        SearchCollection::Albums,
        schema::album::document(&make_album("u1", "Trips")),
    );
    rig.buffer.flush().await;

    assert_eq!(rig.engine.document_count(&assets_physical), 1);
    assert_eq!(rig.engine.document_count(&albums_physical), 1);
    assert_eq!(bulk_imports(&rig), 2);
    Ok(())
}
