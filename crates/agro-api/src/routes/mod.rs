//! # API Route Modules
//!
//! - `producers`: create, partially update and delete producers with their
//!   farms.
//! - `dashboard`: read-only totals across all farms.

pub mod dashboard;
pub mod producers;
