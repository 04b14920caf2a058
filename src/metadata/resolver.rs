//! Guess-to-metadata resolution.
//!
//! [`MetadataResolver`] turns a [`MediaGuess`] into catalog metadata: it
//! searches, ranks the candidates, and fetches details for the best one. All
//! catalog requests share one fixed-interval rate limiter and are individually
//! bounded by a timeout. Terminal outcomes are cached per scan cycle so many
//! episodes of one series cost a single search, even when several workers ask
//! for the same series at once.

use std::cmp::Ordering;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use governor::{Quota, RateLimiter};
use posterwall_common::{normalize_title, MediaKind};
use posterwall_parser::MediaGuess;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::catalog::{Catalog, CatalogCandidate, CatalogError};
use crate::config::CatalogConfig;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Metadata attached to an entry on successful resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMetadata {
    /// Title as the catalog spells it.
    pub canonical_title: String,
    pub year: Option<u16>,
    pub poster_url: Option<String>,
    pub synopsis: Option<String>,
    pub external_id: String,
}

/// Terminal outcome of resolving a guess.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedMetadata),
    NotFound,
}

/// Tunables for [`MetadataResolver`].
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Guesses below this confidence are never looked up.
    pub confidence_threshold: f64,
    /// Minimum normalised-title similarity for a candidate to be accepted.
    pub similarity_threshold: f64,
    /// Per-request bound; elapsing counts as a transient failure.
    pub request_timeout: Duration,
    /// Spacing between outbound requests; zero disables pacing.
    pub min_request_interval: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&CatalogConfig::default())
    }
}

impl From<&CatalogConfig> for ResolverSettings {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            similarity_threshold: config.similarity_threshold,
            request_timeout: config.request_timeout(),
            min_request_interval: config.min_request_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: MediaKind,
    title: String,
    year: Option<u16>,
}

/// Resolves guesses against a [`Catalog`].
pub struct MetadataResolver {
    catalog: Arc<dyn Catalog>,
    settings: ResolverSettings,
    limiter: Option<DirectLimiter>,
    /// One cell per key; concurrent callers await the same lookup.
    cache: DashMap<CacheKey, Arc<OnceCell<Resolution>>>,
}

impl MetadataResolver {
    pub fn new(catalog: Arc<dyn Catalog>, settings: ResolverSettings) -> Self {
        let limiter = Quota::with_period(settings.min_request_interval)
            .map(|q| RateLimiter::direct(q.allow_burst(NonZeroU32::MIN)));

        Self {
            catalog,
            settings,
            limiter,
            cache: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Forget cached outcomes. Called at the start of every scan cycle.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached terminal outcomes.
    pub fn cache_len(&self) -> usize {
        self.cache.iter().filter(|cell| cell.initialized()).count()
    }

    /// Resolve a guess to catalog metadata.
    ///
    /// Returns `Ok(Resolution::NotFound)` for weak guesses, empty result sets,
    /// poor title matches and catalog "not found" answers. Only transient
    /// failures come back as `Err`, and those are never cached.
    pub async fn resolve(&self, guess: &MediaGuess) -> Result<Resolution, CatalogError> {
        if guess.confidence < self.settings.confidence_threshold || guess.title.trim().is_empty()
        {
            debug!(
                title = %guess.title,
                confidence = guess.confidence,
                "Guess below confidence threshold, skipping catalog lookup"
            );
            return Ok(Resolution::NotFound);
        }

        let kind = match guess.kind {
            MediaKind::Episode => MediaKind::Episode,
            MediaKind::Movie | MediaKind::Unknown => MediaKind::Movie,
        };
        let key = CacheKey {
            kind,
            title: normalize_title(&guess.title),
            year: guess.year,
        };

        // Clone the cell out so no map guard is held across the await.
        let cell = self.cache.entry(key).or_default().clone();
        if let Some(hit) = cell.get() {
            debug!(title = %guess.title, "Resolver cache hit");
            return Ok(hit.clone());
        }

        // A failed lookup leaves the cell empty for the next caller.
        cell.get_or_try_init(|| self.lookup(kind, &guess.title, guess.year))
            .await
            .cloned()
    }

    async fn lookup(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> Result<Resolution, CatalogError> {
        let candidates = match self.paced(self.catalog.search(kind, title, year)).await {
            Ok(candidates) => candidates,
            Err(CatalogError::NotFound(_)) => return Ok(Resolution::NotFound),
            Err(e) => return Err(e),
        };

        let Some(best) = pick_best(candidates, title, year, self.settings.similarity_threshold)
        else {
            debug!(%title, ?year, "No catalog candidate close enough");
            return Ok(Resolution::NotFound);
        };

        let details = match self
            .paced(self.catalog.details(kind, &best.external_id))
            .await
        {
            Ok(details) => details,
            Err(CatalogError::NotFound(_)) => return Ok(Resolution::NotFound),
            Err(e) => return Err(e),
        };

        info!(
            catalog = self.catalog.name(),
            %title,
            external_id = %best.external_id,
            "Resolved metadata"
        );

        let canonical_title = if details.title.is_empty() {
            best.title
        } else {
            details.title
        };
        Ok(Resolution::Resolved(ResolvedMetadata {
            canonical_title,
            year: best.year,
            poster_url: details.poster_url.filter(|s| !s.is_empty()),
            synopsis: details.synopsis.filter(|s| !s.is_empty()),
            external_id: best.external_id,
        }))
    }

    /// Wait for the shared limiter, then run `request` under the timeout.
    async fn paced<T, F>(&self, request: F) -> Result<T, CatalogError>
    where
        F: std::future::Future<Output = Result<T, CatalogError>>,
    {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        tokio::time::timeout(self.settings.request_timeout, request)
            .await
            .map_err(|_| {
                CatalogError::transient(format!(
                    "request timed out after {:?}",
                    self.settings.request_timeout
                ))
            })?
    }
}

/// Similarity of two titles after normalisation, 0.0 - 1.0.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_title(a), &normalize_title(b))
}

/// Rank candidates and return the best acceptable one.
///
/// Order: exact normalised-title match first, then year proximity (unknown
/// years last), then popularity. The first candidate in that order whose
/// similarity reaches `threshold` wins.
pub fn pick_best(
    mut candidates: Vec<CatalogCandidate>,
    title: &str,
    year: Option<u16>,
    threshold: f64,
) -> Option<CatalogCandidate> {
    let wanted = normalize_title(title);
    let year_distance = |c: &CatalogCandidate| match (year, c.year) {
        (Some(q), Some(r)) => u32::from(q.abs_diff(r)),
        (None, _) => 0,
        (Some(_), None) => u32::MAX,
    };

    candidates.sort_by(|a, b| {
        let exact_a = normalize_title(&a.title) == wanted;
        let exact_b = normalize_title(&b.title) == wanted;
        exact_b
            .cmp(&exact_a)
            .then_with(|| year_distance(a).cmp(&year_distance(b)))
            .then_with(|| {
                b.popularity
                    .partial_cmp(&a.popularity)
                    .unwrap_or(Ordering::Equal)
            })
    });

    candidates
        .into_iter()
        .find(|c| title_similarity(&c.title, title) >= threshold)
}
