//! Library index persistence across restarts.

mod common;

use common::{StubCatalog, TestHarness};
use posterwall::library::LibraryIndex;
use posterwall_common::{MediaKind, ResolutionState};
use tempfile::TempDir;

#[tokio::test]
async fn scan_persists_index_and_reopen_restores_it() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");

    let h = TestHarness::with_catalog(StubCatalog::new(), 2, Some(path.clone()));
    h.share.add("movies/Heat.1995.mkv");
    h.share.add("tv/Show.Name.S01E01.mkv");
    let result = h.orchestrator.run_cycle(false).await.unwrap();
    assert!(result.errors.is_empty());
    assert!(path.exists());

    let reopened = LibraryIndex::open(&path).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.current_cycle(), 1);

    let movie = &reopened.list_by_kind(MediaKind::Movie)[0];
    assert_eq!(movie.resolution_state, ResolutionState::Resolved);
    assert_eq!(movie.poster_url.as_deref(), Some("https://img.test/heat.jpg"));
    assert_eq!(**movie, *h.index.get(movie.id).unwrap());
}

#[tokio::test]
async fn tombstones_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");

    let h = TestHarness::with_catalog(StubCatalog::new(), 2, Some(path.clone()));
    h.share.add("movies/Heat.1995.mkv");
    let id = h.orchestrator.run_cycle(false).await.unwrap().added[0].id;
    h.share.remove("movies/Heat.1995.mkv");
    h.orchestrator.run_cycle(false).await.unwrap();

    let reopened = LibraryIndex::open(&path).unwrap();
    assert!(reopened.get(id).unwrap().is_tombstoned());
    assert!(reopened.is_empty());
    assert_eq!(reopened.current_cycle(), 2);
}

#[test]
fn corrupt_index_is_set_aside() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");
    std::fs::write(&path, r#"{"entries": "#).unwrap();

    let index = LibraryIndex::open(&path).unwrap();
    assert!(index.is_empty());
    assert!(!path.exists());
    assert!(dir.path().join("index.json.corrupt").exists());

    // A fresh index persists over the old location.
    index.persist().unwrap();
    assert!(LibraryIndex::open(&path).unwrap().is_empty());
}

#[test]
fn damaged_records_are_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");
    std::fs::write(
        &path,
        r#"{"version": 1, "cycle": 3, "entries": [{"id": 5}, {"title": "x"}]}"#,
    )
    .unwrap();

    let index = LibraryIndex::open(&path).unwrap();
    assert!(index.is_empty());
    assert_eq!(index.current_cycle(), 3);
    assert!(path.exists());
}
