//! Trait definition and types for the external metadata catalog.
//!
//! This module defines the [`Catalog`] trait that catalog backends (TMDB and
//! test doubles) implement, along with the data types returned by catalog
//! queries and the [`CatalogError`] taxonomy the resolver and retry logic key
//! off.

use async_trait::async_trait;
use posterwall_common::MediaKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single catalog request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The catalog has definitively no such item. Terminal.
    #[error("not found in catalog: {0}")]
    NotFound(String),

    /// Timeout, rate limiting, server error, connection failure or a
    /// malformed payload. Worth retrying.
    #[error("transient catalog error: {0}")]
    Transient(String),
}

impl CatalogError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCandidate {
    /// Display title (movie title or series name).
    pub title: String,
    /// Release or first-air year, if known.
    pub year: Option<u16>,
    /// Catalog popularity score; only used to break ranking ties.
    pub popularity: f64,
    /// Catalog-specific identifier used for the details lookup.
    pub external_id: String,
}

/// Full details for one catalog item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogDetails {
    pub title: String,
    /// Fully-qualified poster image URL.
    pub poster_url: Option<String>,
    /// Overview text.
    pub synopsis: Option<String>,
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// Async trait for an external movie/TV metadata catalog.
///
/// Implementations perform exactly one remote request per call; pacing,
/// timeouts, caching and retries are layered on top by
/// [`MetadataResolver`](super::MetadataResolver) and the scan workers.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Short, lowercase identifier for this catalog (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Search for movies (`MediaKind::Movie`) or series (`MediaKind::Episode`)
    /// matching `title`, optionally constrained by `year`.
    async fn search(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<CatalogCandidate>, CatalogError>;

    /// Fetch details for the item identified by `external_id`.
    async fn details(
        &self,
        kind: MediaKind,
        external_id: &str,
    ) -> Result<CatalogDetails, CatalogError>;
}
