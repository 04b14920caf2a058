//! Concrete catalog implementations.
//!
//! Each submodule wraps a single external API and implements the
//! [`Catalog`](super::Catalog) trait.

pub mod tmdb;

pub use tmdb::TmdbCatalog;
