//! Media library scanner.
//!
//! [`ScanOrchestrator`] owns the scan cycle. One cycle at a time walks the
//! movie and TV roots of the share, classifies every video file, reconciles
//! the result against the [`LibraryIndex`], resolves metadata for the entries
//! that need it through a bounded worker pool, and commits.
//!
//! ```text
//! Idle -> Scanning -> Reconciling -> Resolving -> Idle
//!            \
//!             -> Error (share unavailable) -> Idle
//! ```
//!
//! Workers never touch the index: they send outcomes over a channel to the
//! cycle task, which is the only writer.

mod result;
pub mod scheduler;

pub use result::{ScanError, ScanResult, ScanSummary};
pub use scheduler::{ScanScheduler, ScanTrigger};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use posterwall_common::paths::is_video_file;
use posterwall_common::EntryId;
use posterwall_parser::{MediaGuess, PathClassifier};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::events::{EventBus, LibraryEvent};
use crate::library::{LibraryIndex, MediaEntry};
use crate::metadata::{
    CatalogError, MetadataResolver, Resolution, RetryDecision, RetryPolicy,
};
use crate::share::{ShareAccess, ShareError, ShareFile};

/// Where the orchestrator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    Idle,
    Scanning,
    Reconciling,
    Resolving,
    Error,
}

/// Scan tunables, taken from `[library]` and `[retry]`.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub share_root: PathBuf,
    pub movies_subpath: String,
    pub tv_subpath: String,
    /// Number of resolver workers.
    pub resolver_concurrency: usize,
    pub retry: RetryPolicy,
}

impl ScanSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            share_root: config.library.share_root.clone(),
            movies_subpath: config.library.movies_subpath.clone(),
            tv_subpath: config.library.tv_subpath.clone(),
            resolver_concurrency: config.library.resolver_concurrency.max(1),
            retry: RetryPolicy::from(&config.retry),
        }
    }

    fn roots(&self) -> [PathBuf; 2] {
        [
            self.share_root.join(&self.movies_subpath),
            self.share_root.join(&self.tv_subpath),
        ]
    }
}

/// State shared between the orchestrator and its running cycle.
#[derive(Debug)]
struct CycleState {
    running: AtomicBool,
    phase: RwLock<ScanPhase>,
    last: RwLock<Option<ScanSummary>>,
    idle: Notify,
}

/// Releases the single-cycle guard on drop, panics included.
struct CycleGuard {
    state: Arc<CycleState>,
}

impl CycleGuard {
    fn set_phase(&self, phase: ScanPhase) {
        debug!(?phase, "Scan phase");
        *self.state.phase.write() = phase;
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        *self.state.phase.write() = ScanPhase::Idle;
        self.state.running.store(false, Ordering::Release);
        self.state.idle.notify_waiters();
    }
}

/// A queued metadata lookup.
#[derive(Debug, Clone)]
struct ResolveJob {
    id: EntryId,
    guess: MediaGuess,
}

/// Result of one job after retries.
struct ResolveOutcome {
    job: ResolveJob,
    result: Result<Resolution, CatalogError>,
    attempts: u32,
}

/// A video file found during the listing phase.
struct FoundFile {
    root: PathBuf,
    file: ShareFile,
}

/// Drives scan cycles.
pub struct ScanOrchestrator {
    share: Arc<dyn ShareAccess>,
    resolver: Arc<MetadataResolver>,
    index: Arc<LibraryIndex>,
    events: EventBus,
    settings: ScanSettings,
    classifier: PathClassifier,
    state: Arc<CycleState>,
}

impl ScanOrchestrator {
    pub fn new(
        share: Arc<dyn ShareAccess>,
        resolver: Arc<MetadataResolver>,
        index: Arc<LibraryIndex>,
        events: EventBus,
        settings: ScanSettings,
    ) -> Self {
        Self {
            share,
            resolver,
            index,
            events,
            settings,
            classifier: PathClassifier::new(),
            state: Arc::new(CycleState {
                running: AtomicBool::new(false),
                phase: RwLock::new(ScanPhase::Idle),
                last: RwLock::new(None),
                idle: Notify::new(),
            }),
        }
    }

    pub fn index(&self) -> &Arc<LibraryIndex> {
        &self.index
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn phase(&self) -> ScanPhase {
        *self.state.phase.read()
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Summary of the most recent finished cycle.
    pub fn last_summary(&self) -> Option<ScanSummary> {
        self.state.last.read().clone()
    }

    /// Wait until no cycle is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }

    fn try_acquire(&self) -> Option<CycleGuard> {
        self.state
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                state: Arc::clone(&self.state),
            })
    }

    /// Run one cycle to completion.
    ///
    /// Returns `None` without doing anything when a cycle is already running;
    /// the request is not queued.
    pub async fn run_cycle(&self, force: bool) -> Option<ScanResult> {
        let Some(guard) = self.try_acquire() else {
            debug!("Scan already running, ignoring request");
            return None;
        };
        Some(self.run_guarded(&guard, force).await)
    }

    /// Start a cycle in the background. `None` when one is already running.
    pub fn spawn_cycle(self: &Arc<Self>, force: bool) -> Option<JoinHandle<ScanResult>> {
        let Some(guard) = self.try_acquire() else {
            debug!("Scan already running, ignoring request");
            return None;
        };
        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let result = this.run_guarded(&guard, force).await;
            drop(guard);
            result
        }))
    }

    async fn run_guarded(&self, guard: &CycleGuard, force: bool) -> ScanResult {
        let started_at = Utc::now();
        info!(force, root = %self.settings.share_root.display(), "Library scan started");
        self.events.broadcast(LibraryEvent::ScanStarted {
            forced: force,
            at: started_at,
        });

        guard.set_phase(ScanPhase::Scanning);
        if let Err(e) = self.share.check_available(&self.settings.share_root) {
            return self.fail_cycle(guard, started_at, e);
        }

        let cycle = self.index.begin_cycle();
        self.resolver.clear_cache();

        let mut result = ScanResult::empty(started_at);
        result.cycle = cycle;

        let found = match self.list_share(&mut result).await {
            Ok(found) => found,
            Err(e) => return self.fail_cycle(guard, started_at, e),
        };

        guard.set_phase(ScanPhase::Reconciling);
        let before: HashMap<EntryId, Arc<MediaEntry>> = self
            .index
            .snapshot()
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        let jobs = self.reconcile(found, force, cycle, &mut result);

        guard.set_phase(ScanPhase::Resolving);
        self.resolve_all(jobs, &mut result).await;

        self.diff(&before, &mut result);

        if let Err(e) = self.index.persist() {
            error!("Failed to persist library index: {}", e);
            let path = self.index.persistence_path().unwrap_or(Path::new(""));
            result.errors.push(ScanError::new(path, e));
        }

        result.finished_at = Utc::now();
        info!(
            cycle,
            added = result.added.len(),
            updated = result.updated.len(),
            removed = result.removed.len(),
            errors = result.errors.len(),
            "Library scan complete"
        );
        self.events.broadcast(LibraryEvent::ScanCompleted {
            cycle,
            added: result.added.len(),
            updated: result.updated.len(),
            removed: result.removed.len(),
            errors: result.errors.len(),
        });
        *self.state.last.write() = Some(result.summary(None));
        result
    }

    fn fail_cycle(
        &self,
        guard: &CycleGuard,
        started_at: chrono::DateTime<Utc>,
        err: ShareError,
    ) -> ScanResult {
        guard.set_phase(ScanPhase::Error);
        error!("Library scan failed: {}", err);

        let mut result = ScanResult::empty(started_at);
        result.errors.push(ScanError::new(err.path(), &err));
        result.finished_at = Utc::now();

        self.events.broadcast(LibraryEvent::ScanFailed {
            error: err.to_string(),
        });
        *self.state.last.write() = Some(result.summary(Some(err.to_string())));
        result
    }

    /// List video files under both roots. Runs on the blocking pool since the
    /// share listing is synchronous I/O.
    async fn list_share(&self, result: &mut ScanResult) -> Result<Vec<FoundFile>, ShareError> {
        let share = Arc::clone(&self.share);
        let roots = self.settings.roots();
        let share_root = self.settings.share_root.clone();

        let listing = tokio::task::spawn_blocking(move || {
            let mut found = Vec::new();
            let mut errors = Vec::new();
            for root in roots {
                let files = match share.list_files(&root) {
                    Ok(files) => files,
                    Err(ShareError::Unavailable { path, reason }) => {
                        warn!(path = %path.display(), "Library folder missing, treating as empty: {}", reason);
                        continue;
                    }
                    Err(e) => {
                        errors.push(ScanError::new(e.path(), &e));
                        continue;
                    }
                };
                for item in files {
                    match item {
                        Ok(file) if is_video_file(&file.path) => found.push(FoundFile {
                            root: root.clone(),
                            file,
                        }),
                        Ok(file) => debug!(path = %file.path.display(), "Skipping non-video file"),
                        Err(e) => {
                            warn!("Listing error: {}", e);
                            errors.push(ScanError::new(e.path(), &e));
                        }
                    }
                }
            }
            (found, errors)
        })
        .await;

        match listing {
            Ok((found, errors)) => {
                result.errors.extend(errors);
                Ok(found)
            }
            Err(e) => Err(ShareError::unavailable(share_root, format!("listing task failed: {e}"))),
        }
    }

    /// Classify, match against the index, and queue what needs resolving.
    fn reconcile(
        &self,
        mut found: Vec<FoundFile>,
        force: bool,
        cycle: u64,
        result: &mut ScanResult,
    ) -> VecDeque<ResolveJob> {
        found.sort_by(|a, b| a.file.path.cmp(&b.file.path));

        let now = Utc::now();
        let mut jobs = VecDeque::new();
        let mut claimed: HashMap<EntryId, PathBuf> = HashMap::new();
        let mut present: HashSet<PathBuf> = HashSet::new();

        for FoundFile { root, file } in found {
            let (dir, filename) = split_relative(&file.path, &root);
            let guess = self.classifier.classify(&dir, &filename);
            let id = guess.entry_id();

            if let Some(first) = claimed.get(&id) {
                warn!(
                    path = %file.path.display(),
                    first = %first.display(),
                    "Duplicate media identity, skipping"
                );
                result.errors.push(ScanError::new(
                    &file.path,
                    format!("same {} as {}", guess.kind, first.display()),
                ));
                continue;
            }
            claimed.insert(id, file.path.clone());
            present.insert(file.path.clone());

            let existing = self.index.get(id);
            let needs_resolution = match &existing {
                None => true,
                Some(e) => force || e.is_tombstoned() || LibraryIndex::is_stale(e, file.modified),
            };

            let incoming = match &existing {
                Some(e) if !needs_resolution => {
                    if e.source_path == file.path {
                        continue;
                    }
                    // Moved within the share: same identity, new location.
                    let mut moved = MediaEntry::clone(e);
                    moved.source_path = file.path.clone();
                    moved.file_size = file.size;
                    moved.file_modified_at = file.modified;
                    moved.last_scanned_at = now;
                    moved
                }
                _ => MediaEntry::from_guess(&guess, file.path.clone(), file.size, file.modified, now),
            };

            let outcome = self.index.upsert(incoming);
            debug!(path = %file.path.display(), %id, ?outcome, needs_resolution, "Reconciled");

            if needs_resolution {
                jobs.push_back(ResolveJob { id, guess });
            }
        }

        let missing: Vec<EntryId> = self
            .index
            .snapshot()
            .into_iter()
            .filter(|e| !e.is_tombstoned() && !present.contains(&e.source_path))
            .map(|e| e.id)
            .collect();
        let tombstoned = self.index.mark_removed(&missing, cycle);
        if !tombstoned.is_empty() {
            info!(count = tombstoned.len(), "Marked missing entries as removed");
        }

        let purged = self.index.purge_tombstoned(cycle);
        if !purged.is_empty() {
            info!(count = purged.len(), "Purged entries missing for more than one scan");
        }

        jobs
    }

    /// Fan jobs out to the worker pool and apply results one at a time.
    async fn resolve_all(&self, jobs: VecDeque<ResolveJob>, result: &mut ScanResult) {
        if jobs.is_empty() {
            return;
        }

        let workers = self.settings.resolver_concurrency.max(1).min(jobs.len());
        info!(jobs = jobs.len(), workers, "Resolving metadata");

        let queue = Arc::new(Mutex::new(jobs));
        let (tx, mut rx) = mpsc::channel::<ResolveOutcome>(workers * 2);
        let mut pool = JoinSet::new();

        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let resolver = Arc::clone(&self.resolver);
            let policy = self.settings.retry;
            pool.spawn(async move {
                loop {
                    let Some(job) = queue.lock().pop_front() else {
                        break;
                    };
                    let (result, attempts) = resolve_with_retry(&resolver, &job.guess, policy).await;
                    let outcome = ResolveOutcome {
                        job,
                        result,
                        attempts,
                    };
                    if tx.send(outcome).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        while let Some(outcome) = rx.recv().await {
            self.apply_outcome(outcome, result);
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!("Resolver worker failed: {}", e);
            }
        }
    }

    fn apply_outcome(&self, outcome: ResolveOutcome, result: &mut ScanResult) {
        let Some(current) = self.index.get(outcome.job.id) else {
            debug!(id = %outcome.job.id, "Entry vanished before its metadata arrived");
            return;
        };

        let now = Utc::now();
        let mut entry = MediaEntry::clone(&current);
        match outcome.result {
            Ok(resolution) => entry.apply_resolution(resolution, now),
            Err(e) => {
                warn!(
                    path = %entry.source_path.display(),
                    attempts = outcome.attempts,
                    "Metadata lookup failed: {}",
                    e
                );
                result.errors.push(ScanError::new(
                    &entry.source_path,
                    format!("metadata lookup failed after {} attempts: {e}", outcome.attempts),
                ));
                entry.mark_failed(now);
            }
        }
        self.index.upsert(entry);
    }

    /// Fill `added`, `updated` and `removed` by comparing against `before`.
    fn diff(&self, before: &HashMap<EntryId, Arc<MediaEntry>>, result: &mut ScanResult) {
        let after = self.index.snapshot();
        let mut live_after = HashSet::new();

        for entry in &after {
            if entry.is_tombstoned() {
                continue;
            }
            live_after.insert(entry.id);
            match before.get(&entry.id) {
                Some(old) if !old.is_tombstoned() => {
                    if content_changed(old, entry) {
                        result.updated.push(MediaEntry::clone(entry));
                    }
                }
                _ => result.added.push(MediaEntry::clone(entry)),
            }
        }

        result.removed = before
            .values()
            .filter(|e| !e.is_tombstoned() && !live_after.contains(&e.id))
            .map(|e| e.id)
            .collect();

        result.added.sort_by_cached_key(|e| e.sort_key());
        result.updated.sort_by_cached_key(|e| e.sort_key());
        result.removed.sort();
    }
}

/// Ask the resolver, retrying transient failures per `policy`.
async fn resolve_with_retry(
    resolver: &MetadataResolver,
    guess: &MediaGuess,
    policy: RetryPolicy,
) -> (Result<Resolution, CatalogError>, u32) {
    let mut state = policy.start();
    loop {
        match resolver.resolve(guess).await {
            Ok(resolution) => return (Ok(resolution), state.failures() + 1),
            Err(e) => match state.record_failure() {
                RetryDecision::RetryAfter(delay) => {
                    debug!(
                        title = %guess.title,
                        attempt = state.failures(),
                        delay_ms = delay.as_millis() as u64,
                        "Transient catalog failure, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => return (Err(e), state.failures()),
            },
        }
    }
}

/// Whether two versions of an entry differ in anything but scan bookkeeping.
fn content_changed(old: &MediaEntry, new: &MediaEntry) -> bool {
    let mut normalized = new.clone();
    normalized.last_scanned_at = old.last_scanned_at;
    normalized.last_resolved_at = old.last_resolved_at;
    normalized != *old
}

/// Split `path` into its directory relative to `root` and its filename.
fn split_relative(path: &Path, root: &Path) -> (String, String) {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let filename = relative
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = relative
        .parent()
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();
    (dir, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_relative() {
        let (dir, name) = split_relative(
            Path::new("/mnt/media/tv/Show/Season 1/S01E01.mkv"),
            Path::new("/mnt/media/tv"),
        );
        assert_eq!(dir, "Show/Season 1");
        assert_eq!(name, "S01E01.mkv");

        let (dir, name) = split_relative(Path::new("/mnt/media/movies/Heat.mkv"), Path::new("/mnt/media/movies"));
        assert_eq!(dir, "");
        assert_eq!(name, "Heat.mkv");
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config::default();
        let settings = ScanSettings::from_config(&config);
        assert_eq!(settings.resolver_concurrency, 4);
        assert_eq!(
            settings.roots(),
            [
                PathBuf::from("/mnt/media/movies"),
                PathBuf::from("/mnt/media/tv")
            ]
        );
    }

    #[test]
    fn test_content_changed_ignores_bookkeeping() {
        let now = Utc::now();
        let guess = posterwall_parser::classify("", "Heat.1995.mkv");
        let old = MediaEntry::from_guess(&guess, PathBuf::from("/m/Heat.1995.mkv"), 1, now, now);

        let mut rescanned = old.clone();
        rescanned.last_scanned_at = now + chrono::Duration::seconds(30);
        rescanned.last_resolved_at = Some(now);
        assert!(!content_changed(&old, &rescanned));

        let mut resized = old.clone();
        resized.file_size = 2;
        assert!(content_changed(&old, &resized));
    }
}
