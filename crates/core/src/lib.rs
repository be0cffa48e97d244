//! storesync core - Shared types library.
//!
//! This crate provides common types used across all storesync components:
//! - `server` - Sync service, HTTP API and store repositories
//! - `cli` - Command-line tools for schema setup and one-off syncs
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, remote identities, amounts and date ranges

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
