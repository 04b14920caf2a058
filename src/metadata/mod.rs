//! Metadata resolution against an external catalog.
//!
//! # Module layout
//!
//! - [`catalog`] -- Catalog trait, query result types and error taxonomy.
//! - [`providers`] -- Concrete catalogs (TMDB).
//! - [`resolver`] -- Guess-to-metadata resolution with pacing, timeouts and a
//!   per-cycle cache.
//! - [`retry`] -- Retry state machine driven by the scan workers.

pub mod catalog;
pub mod providers;
pub mod resolver;
pub mod retry;

pub use catalog::{Catalog, CatalogCandidate, CatalogDetails, CatalogError};
pub use resolver::{MetadataResolver, Resolution, ResolvedMetadata, ResolverSettings};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
