//! Posterwall - poster wall indexer for a shared media folder
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod events;
pub mod library;
pub mod metadata;
pub mod scanner;
pub mod server;
pub mod share;
