//! Posterwall-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across posterwall:
//!
//! - **Typed IDs**: Deterministic identifiers for library entries
//! - **Core Types**: Enums for media kinds and resolution states
//! - **Path Utilities**: Functions to detect media files by extension
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use posterwall_common::{EntryId, MediaKind, Error, Result};
//! use posterwall_common::paths::is_video_file;
//! use std::path::Path;
//!
//! // Identity-derived IDs are stable across runs
//! let a = EntryId::for_movie("The Matrix", Some(1999));
//! let b = EntryId::for_movie("the  matrix", Some(1999));
//! assert_eq!(a, b);
//!
//! // Work with media kinds
//! let kind = MediaKind::Movie;
//! assert_eq!(kind.to_string(), "movie");
//!
//! // Check file types
//! assert!(is_video_file(Path::new("movie.mkv")));
//!
//! // Use common error types
//! fn example() -> Result<()> {
//!     Err(Error::not_found("entry"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
