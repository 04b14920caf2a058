//! Shared test harness for integration tests.
//!
//! Provides an in-memory [`StubShare`], a scriptable [`StubCatalog`], and
//! [`TestHarness`] which wires them into a full orchestrator, index and
//! [`AppContext`]. The [`with_server`](TestHarness::with_server) constructor
//! starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use posterwall::config::Config;
use posterwall::events::EventBus;
use posterwall::library::LibraryIndex;
use posterwall::metadata::{
    Catalog, CatalogCandidate, CatalogDetails, CatalogError, MetadataResolver, ResolverSettings,
    RetryPolicy,
};
use posterwall::scanner::{ScanOrchestrator, ScanSettings, ScanTrigger};
use posterwall::server::{create_router, AppContext};
use posterwall::share::{ShareAccess, ShareError, ShareFile, ShareListing};
use posterwall_common::{normalize_title, MediaKind};

pub const SHARE_ROOT: &str = "/share";

/// A fixed point in the past, so files never look modified after a scan.
pub fn old_mtime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Share
// ---------------------------------------------------------------------------

/// In-memory share keyed by absolute path.
#[derive(Default)]
pub struct StubShare {
    files: Mutex<BTreeMap<PathBuf, ShareFile>>,
    unavailable: AtomicBool,
}

impl StubShare {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file below the share root, e.g. `"movies/Heat.1995.mkv"`.
    pub fn add(&self, relative: &str) -> PathBuf {
        self.add_with(relative, old_mtime(), 1_000)
    }

    pub fn add_with(&self, relative: &str, modified: DateTime<Utc>, size: u64) -> PathBuf {
        let path = Path::new(SHARE_ROOT).join(relative);
        self.files.lock().insert(
            path.clone(),
            ShareFile {
                path: path.clone(),
                modified,
                size,
            },
        );
        path
    }

    pub fn remove(&self, relative: &str) {
        self.files.lock().remove(&Path::new(SHARE_ROOT).join(relative));
    }

    /// Bump a file's modification time to now.
    pub fn touch(&self, relative: &str) {
        if let Some(file) = self.files.lock().get_mut(&Path::new(SHARE_ROOT).join(relative)) {
            file.modified = Utc::now() + chrono::Duration::seconds(1);
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ShareAccess for StubShare {
    fn list_files(&self, root: &Path) -> Result<ShareListing, ShareError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ShareError::unavailable(root, "share offline"));
        }
        let files: Vec<_> = self
            .files
            .lock()
            .values()
            .filter(|f| f.path.starts_with(root))
            .cloned()
            .map(Ok)
            .collect();
        Ok(Box::new(files.into_iter()))
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, ShareError> {
        if self.files.lock().contains_key(path) {
            Ok(Vec::new())
        } else {
            Err(ShareError::io(path, "no such file"))
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Catalog double that knows every title, with scriptable failures.
///
/// Search answers with a single candidate echoing the query; details return
/// a poster URL derived from the external id.
#[derive(Default)]
pub struct StubCatalog {
    delay: Duration,
    /// Transient failures still to serve, per normalized title.
    failures: Mutex<HashMap<String, u32>>,
    unknown_titles: Mutex<HashSet<String>>,
    searches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Fail the next `times` searches for `title` with a transient error.
    pub fn fail_times(&self, title: &str, times: u32) {
        self.failures.lock().insert(normalize_title(title), times);
    }

    /// Answer searches for `title` with no candidates.
    pub fn forget(&self, title: &str) {
        self.unknown_titles.lock().insert(normalize_title(title));
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        InFlight(&self.in_flight)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Catalog for StubCatalog {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn search(
        &self,
        _kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<CatalogCandidate>, CatalogError> {
        let _guard = self.enter().await;
        self.searches.fetch_add(1, Ordering::SeqCst);

        let key = normalize_title(title);
        {
            let mut failures = self.failures.lock();
            if let Some(remaining) = failures.get_mut(&key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(CatalogError::transient("HTTP 503"));
                }
            }
        }
        if self.unknown_titles.lock().contains(&key) {
            return Ok(Vec::new());
        }

        Ok(vec![CatalogCandidate {
            title: title.to_string(),
            year,
            popularity: 1.0,
            external_id: key.replace(' ', "-"),
        }])
    }

    async fn details(
        &self,
        _kind: MediaKind,
        external_id: &str,
    ) -> Result<CatalogDetails, CatalogError> {
        let _guard = self.enter().await;
        Ok(CatalogDetails {
            title: external_id.replace('-', " "),
            poster_url: Some(format!("https://img.test/{external_id}.jpg")),
            synopsis: Some(format!("About {external_id}")),
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Fast settings: no pacing, millisecond retry backoff.
pub fn test_settings(concurrency: usize) -> (ScanSettings, ResolverSettings) {
    let scan = ScanSettings {
        share_root: PathBuf::from(SHARE_ROOT),
        movies_subpath: "movies".into(),
        tv_subpath: "tv".into(),
        resolver_concurrency: concurrency,
        retry: RetryPolicy {
            base_delay: Duration::from_millis(1),
            factor: 2,
            max_attempts: 3,
        },
    };
    let resolver = ResolverSettings {
        min_request_interval: Duration::ZERO,
        request_timeout: Duration::from_secs(2),
        ..ResolverSettings::default()
    };
    (scan, resolver)
}

/// A fully wired orchestrator over stub collaborators.
pub struct TestHarness {
    pub share: Arc<StubShare>,
    pub catalog: Arc<StubCatalog>,
    pub index: Arc<LibraryIndex>,
    pub orchestrator: Arc<ScanOrchestrator>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_catalog(StubCatalog::new(), 4, None)
    }

    pub fn with_catalog(
        catalog: StubCatalog,
        concurrency: usize,
        index_path: Option<PathBuf>,
    ) -> Self {
        let share = Arc::new(StubShare::new());
        let catalog = Arc::new(catalog);
        let index = Arc::new(LibraryIndex::new(index_path));
        let (scan_settings, resolver_settings) = test_settings(concurrency);

        let resolver = MetadataResolver::new(
            Arc::clone(&catalog) as Arc<dyn Catalog>,
            resolver_settings,
        );
        let orchestrator = Arc::new(ScanOrchestrator::new(
            Arc::clone(&share) as Arc<dyn ShareAccess>,
            Arc::new(resolver),
            Arc::clone(&index),
            EventBus::new(),
            scan_settings,
        ));

        Self {
            share,
            catalog,
            index,
            orchestrator,
        }
    }

    pub fn ctx(&self) -> AppContext {
        AppContext {
            index: Arc::clone(&self.index),
            scans: ScanTrigger::new(Arc::clone(&self.orchestrator)),
            config: Arc::new(Config::default()),
        }
    }

    /// Start an Axum server on a random port and return its address.
    pub async fn with_server(&self) -> SocketAddr {
        let app = create_router(self.ctx(), None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }
}
