//! Core types for storesync.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod date_range;
pub mod id;
pub mod money;
pub mod remote_id;

pub use date_range::{DATE_FORMAT, DateRange, DateRangeError, MAX_RANGE_DAYS};
pub use id::*;
pub use money::{AmountError, RawAmount, parse_amount};
pub use remote_id::RemoteId;
