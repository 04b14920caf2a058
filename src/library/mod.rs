//! The library index: every known media entry, keyed by identity.
//!
//! Reads are snapshot-based: callers get `Arc<MediaEntry>` clones taken under a
//! short read lock, so a long listing never blocks the scan writer and the
//! writer never blocks readers for longer than one map operation. Writes
//! replace whole entries.

mod entry;
pub mod persist;

pub use entry::MediaEntry;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use posterwall_common::{EntryId, MediaKind, ResolutionState, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What [`LibraryIndex::upsert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Default)]
struct IndexInner {
    entries: HashMap<EntryId, Arc<MediaEntry>>,
    by_path: HashMap<PathBuf, EntryId>,
    cycle: u64,
}

impl IndexInner {
    fn insert(&mut self, entry: Arc<MediaEntry>) {
        self.by_path.insert(entry.source_path.clone(), entry.id);
        self.entries.insert(entry.id, entry);
    }

    fn tombstone(&mut self, id: EntryId, cycle: u64) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) if !entry.is_tombstoned() => {
                Arc::make_mut(entry).tombstoned_at = Some(cycle);
                true
            }
            _ => false,
        }
    }
}

/// In-memory media index, optionally backed by a JSON file.
pub struct LibraryIndex {
    inner: RwLock<IndexInner>,
    persistence_path: Option<PathBuf>,
}

impl LibraryIndex {
    /// Empty index. Persisted to `persistence_path` on [`persist`](Self::persist)
    /// when one is given.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: RwLock::new(IndexInner::default()),
            persistence_path,
        }
    }

    /// Load the index at `path`, or start empty when it does not exist.
    ///
    /// A file that cannot be read as an index at all is moved aside to
    /// `<path>.corrupt` and the index starts empty; damaged individual
    /// records are dropped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let loaded = match persist::load(&path) {
            Ok(loaded) => loaded,
            Err(posterwall_common::Error::IndexCorruption(reason)) => {
                let backup = path.with_extension("json.corrupt");
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    "Index file unreadable, starting empty: {}",
                    reason
                );
                std::fs::rename(&path, &backup)?;
                persist::LoadedIndex::default()
            }
            Err(e) => return Err(e),
        };

        let mut inner = IndexInner {
            cycle: loaded.cycle,
            ..IndexInner::default()
        };
        for entry in loaded.entries {
            inner.insert(Arc::new(entry));
        }

        info!(
            path = %path.display(),
            entries = inner.entries.len(),
            dropped = loaded.dropped,
            "Loaded library index"
        );

        Ok(Self {
            inner: RwLock::new(inner),
            persistence_path: Some(path),
        })
    }

    pub fn persistence_path(&self) -> Option<&Path> {
        self.persistence_path.as_deref()
    }

    /// Write the index to its backing file, if any.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        let (cycle, entries) = {
            let inner = self.inner.read();
            (inner.cycle, inner.entries.values().cloned().collect::<Vec<_>>())
        };
        persist::save(path, cycle, entries.iter().map(Arc::as_ref))?;
        debug!(path = %path.display(), entries = entries.len(), "Persisted library index");
        Ok(())
    }

    /// Start a new scan cycle and return its number.
    pub fn begin_cycle(&self) -> u64 {
        let mut inner = self.inner.write();
        inner.cycle += 1;
        inner.cycle
    }

    /// Number of the most recently started cycle.
    pub fn current_cycle(&self) -> u64 {
        self.inner.read().cycle
    }

    pub fn get(&self, id: EntryId) -> Option<Arc<MediaEntry>> {
        self.inner.read().entries.get(&id).cloned()
    }

    /// The entry currently backed by `path`, tombstoned or not.
    pub fn entry_for_path(&self, path: &Path) -> Option<Arc<MediaEntry>> {
        let inner = self.inner.read();
        let id = inner.by_path.get(path)?;
        inner.entries.get(id).cloned()
    }

    /// Live (non-tombstoned) entries of one kind, ordered by title then
    /// year, season and episode.
    pub fn list_by_kind(&self, kind: MediaKind) -> Vec<Arc<MediaEntry>> {
        let mut entries: Vec<_> = {
            let inner = self.inner.read();
            inner
                .entries
                .values()
                .filter(|e| e.kind == kind && !e.is_tombstoned())
                .cloned()
                .collect()
        };
        entries.sort_by_cached_key(|e| e.sort_key());
        entries
    }

    /// Every entry, tombstoned ones included, in no particular order.
    pub fn snapshot(&self) -> Vec<Arc<MediaEntry>> {
        self.inner.read().entries.values().cloned().collect()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .entries
            .values()
            .filter(|e| !e.is_tombstoned())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `incoming` or merge it into the existing entry with its id.
    ///
    /// Merging never moves a `Resolved` entry back to another state and
    /// never replaces a non-empty poster or synopsis with an empty one.
    /// Upserting clears a tombstone. If the incoming source path was backing
    /// a different entry, that entry is tombstoned.
    pub fn upsert(&self, incoming: MediaEntry) -> UpsertOutcome {
        let mut inner = self.inner.write();
        let cycle = inner.cycle;

        let previous = inner.by_path.get(&incoming.source_path).copied();
        if let Some(other) = previous {
            if other != incoming.id && inner.tombstone(other, cycle) {
                debug!(
                    path = %incoming.source_path.display(),
                    old = %other,
                    new = %incoming.id,
                    "Source path now backs a different entry"
                );
            }
        }

        let Some(existing) = inner.entries.get(&incoming.id).cloned() else {
            inner.insert(Arc::new(incoming));
            return UpsertOutcome::Inserted;
        };

        let merged = merge(&existing, incoming);
        if merged == *existing {
            return UpsertOutcome::Unchanged;
        }

        if merged.source_path != existing.source_path
            && inner.by_path.get(&existing.source_path) == Some(&existing.id)
        {
            inner.by_path.remove(&existing.source_path);
        }
        inner.insert(Arc::new(merged));
        UpsertOutcome::Updated
    }

    /// Tombstone the given entries in `cycle`. Returns the ids that were live.
    pub fn mark_removed(&self, ids: &[EntryId], cycle: u64) -> Vec<EntryId> {
        let mut inner = self.inner.write();
        ids.iter()
            .copied()
            .filter(|id| inner.tombstone(*id, cycle))
            .collect()
    }

    /// Drop entries tombstoned in a cycle before `before_cycle`.
    pub fn purge_tombstoned(&self, before_cycle: u64) -> Vec<EntryId> {
        let mut inner = self.inner.write();
        let doomed: Vec<EntryId> = inner
            .entries
            .values()
            .filter(|e| e.tombstoned_at.is_some_and(|c| c < before_cycle))
            .map(|e| e.id)
            .collect();

        for id in &doomed {
            if let Some(entry) = inner.entries.remove(id) {
                if inner.by_path.get(&entry.source_path) == Some(id) {
                    inner.by_path.remove(&entry.source_path);
                }
            }
        }
        doomed
    }

    /// Whether an entry must be reprocessed: its file changed since the last
    /// scan, or it never reached a settled resolution.
    pub fn is_stale(entry: &MediaEntry, file_mod_time: DateTime<Utc>) -> bool {
        file_mod_time > entry.last_scanned_at || entry.resolution_state.needs_resolution()
    }
}

/// Combine an existing entry with an incoming version of it.
fn merge(existing: &MediaEntry, incoming: MediaEntry) -> MediaEntry {
    let mut merged = incoming;

    if existing.resolution_state == ResolutionState::Resolved
        && merged.resolution_state != ResolutionState::Resolved
    {
        merged.resolution_state = ResolutionState::Resolved;
        merged.last_resolved_at = existing.last_resolved_at;
        merged.canonical_title = existing.canonical_title.clone();
        merged.external_id = existing.external_id.clone();
    }

    fn keep_non_empty(incoming: &mut Option<String>, existing: &Option<String>) {
        let incoming_empty = incoming.as_deref().map_or(true, str::is_empty);
        let existing_set = existing.as_deref().is_some_and(|s| !s.is_empty());
        if incoming_empty && existing_set {
            incoming.clone_from(existing);
        }
    }
    keep_non_empty(&mut merged.poster_url, &existing.poster_url);
    keep_non_empty(&mut merged.synopsis, &existing.synopsis);
    keep_non_empty(&mut merged.canonical_title, &existing.canonical_title);
    keep_non_empty(&mut merged.external_id, &existing.external_id);

    if merged.last_resolved_at.is_none() {
        merged.last_resolved_at = existing.last_resolved_at;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Resolution, ResolvedMetadata};
    use assert_matches::assert_matches;
    use chrono::Duration;
    use posterwall_parser::classify;

    fn entry(dir: &str, filename: &str) -> MediaEntry {
        let now = Utc::now();
        MediaEntry::from_guess(
            &classify(dir, filename),
            PathBuf::from(format!("/share/{dir}/{filename}")),
            100,
            now,
            now,
        )
    }

    fn resolved(mut e: MediaEntry, poster: &str) -> MediaEntry {
        e.apply_resolution(
            Resolution::Resolved(ResolvedMetadata {
                canonical_title: e.title.clone(),
                year: e.year,
                poster_url: Some(poster.to_string()),
                synopsis: Some("synopsis".into()),
                external_id: "1".into(),
            }),
            Utc::now(),
        );
        e
    }

    #[test]
    fn test_upsert_insert_then_unchanged() {
        let index = LibraryIndex::new(None);
        let e = entry("", "Heat.1995.mkv");
        assert_eq!(index.upsert(e.clone()), UpsertOutcome::Inserted);
        assert_eq!(index.upsert(e.clone()), UpsertOutcome::Unchanged);
        assert_eq!(index.len(), 1);
        assert_eq!(*index.get(e.id).unwrap(), e);
    }

    #[test]
    fn test_resolved_never_regresses() {
        let index = LibraryIndex::new(None);
        let e = entry("", "Heat.1995.mkv");
        index.upsert(resolved(e.clone(), "https://img/heat.jpg"));

        let mut unresolved = e.clone();
        unresolved.last_scanned_at = Utc::now() + Duration::seconds(5);
        assert_eq!(index.upsert(unresolved), UpsertOutcome::Updated);

        let stored = index.get(e.id).unwrap();
        assert_eq!(stored.resolution_state, ResolutionState::Resolved);
        assert_eq!(stored.poster_url.as_deref(), Some("https://img/heat.jpg"));
        assert_eq!(stored.synopsis.as_deref(), Some("synopsis"));

        let mut failed = e.clone();
        failed.mark_failed(Utc::now());
        index.upsert(failed);
        assert_eq!(
            index.get(e.id).unwrap().resolution_state,
            ResolutionState::Resolved
        );
    }

    #[test]
    fn test_empty_poster_never_overwrites() {
        let index = LibraryIndex::new(None);
        let e = entry("", "Heat.1995.mkv");
        index.upsert(resolved(e.clone(), "https://img/heat.jpg"));

        let mut again = resolved(e.clone(), "");
        again.synopsis = None;
        index.upsert(again);
        let stored = index.get(e.id).unwrap();
        assert_eq!(stored.poster_url.as_deref(), Some("https://img/heat.jpg"));
        assert_eq!(stored.synopsis.as_deref(), Some("synopsis"));

        index.upsert(resolved(e.clone(), "https://img/new.jpg"));
        assert_eq!(
            index.get(e.id).unwrap().poster_url.as_deref(),
            Some("https://img/new.jpg")
        );
    }

    #[test]
    fn test_failed_entry_can_be_requeued() {
        let index = LibraryIndex::new(None);
        let mut e = entry("", "Heat.1995.mkv");
        e.mark_failed(Utc::now());
        index.upsert(e.clone());

        let requeued = entry("", "Heat.1995.mkv");
        index.upsert(requeued);
        assert_eq!(
            index.get(e.id).unwrap().resolution_state,
            ResolutionState::Unresolved
        );
    }

    #[test]
    fn test_path_reassignment_tombstones_previous_entry() {
        let index = LibraryIndex::new(None);
        let first = entry("", "Heat.1995.mkv");
        index.upsert(first.clone());

        let mut second = entry("", "Ronin.1998.mkv");
        second.source_path = first.source_path.clone();
        index.upsert(second.clone());

        assert!(index.get(first.id).unwrap().is_tombstoned());
        assert_eq!(index.entry_for_path(&first.source_path).unwrap().id, second.id);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_tombstone_restore_and_purge() {
        let index = LibraryIndex::new(None);
        let e = entry("", "Heat.1995.mkv");
        index.upsert(e.clone());

        let cycle = index.begin_cycle();
        assert_eq!(index.mark_removed(&[e.id], cycle), vec![e.id]);
        assert!(index.mark_removed(&[e.id], cycle).is_empty());
        assert!(index.list_by_kind(MediaKind::Movie).is_empty());
        assert!(index.get(e.id).is_some());

        // Same cycle: not purged yet.
        assert!(index.purge_tombstoned(cycle).is_empty());

        // Restored by an upsert.
        assert_eq!(index.upsert(e.clone()), UpsertOutcome::Updated);
        assert!(!index.get(e.id).unwrap().is_tombstoned());

        index.mark_removed(&[e.id], cycle);
        let next = index.begin_cycle();
        assert_eq!(index.purge_tombstoned(next), vec![e.id]);
        assert!(index.get(e.id).is_none());
        assert!(index.entry_for_path(&e.source_path).is_none());
    }

    #[test]
    fn test_list_by_kind_ordering() {
        let index = LibraryIndex::new(None);
        for (dir, name) in [
            ("", "zodiac.2007.mkv"),
            ("", "Alien.1979.mkv"),
            ("", "alien.1986.mkv"),
            ("", "Show.S01E02.mkv"),
            ("", "Show.S01E01.mkv"),
            ("", "Another.S02E01.mkv"),
        ] {
            index.upsert(entry(dir, name));
        }

        let movies: Vec<_> = index
            .list_by_kind(MediaKind::Movie)
            .iter()
            .map(|e| (e.title.clone(), e.year))
            .collect();
        assert_eq!(
            movies,
            vec![
                ("Alien".to_string(), Some(1979)),
                ("alien".to_string(), Some(1986)),
                ("zodiac".to_string(), Some(2007)),
            ]
        );

        let episodes: Vec<_> = index
            .list_by_kind(MediaKind::Episode)
            .iter()
            .map(|e| (e.title.clone(), e.episode))
            .collect();
        assert_eq!(
            episodes,
            vec![
                ("Another".to_string(), Some(1)),
                ("Show".to_string(), Some(1)),
                ("Show".to_string(), Some(2)),
            ]
        );
    }

    #[test]
    fn test_is_stale() {
        let e = entry("", "Heat.1995.mkv");
        assert!(LibraryIndex::is_stale(&e, e.file_modified_at));

        let settled = resolved(e.clone(), "p");
        assert!(!LibraryIndex::is_stale(&settled, settled.last_scanned_at));
        assert!(LibraryIndex::is_stale(
            &settled,
            settled.last_scanned_at + Duration::seconds(1)
        ));

        let mut not_found = e.clone();
        not_found.apply_resolution(Resolution::NotFound, Utc::now());
        assert!(!LibraryIndex::is_stale(&not_found, not_found.last_scanned_at));
    }

    #[test]
    fn test_persist_and_open() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index.json");

        let index = LibraryIndex::new(Some(path.clone()));
        let e = resolved(entry("", "Heat.1995.mkv"), "https://img/heat.jpg");
        index.upsert(e.clone());
        index.begin_cycle();
        index.persist().unwrap();

        let reopened = LibraryIndex::open(&path).unwrap();
        assert_eq!(*reopened.get(e.id).unwrap(), e);
        assert_eq!(reopened.current_cycle(), 1);
        assert_eq!(reopened.entry_for_path(&e.source_path).unwrap().id, e.id);
    }

    #[test]
    fn test_open_corrupt_file_starts_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "garbage").unwrap();

        let index = LibraryIndex::open(&path).unwrap();
        assert!(index.is_empty());
        assert!(dir.path().join("index.json.corrupt").exists());
        assert_matches!(index.persistence_path(), Some(p) if p == path);
    }
}
