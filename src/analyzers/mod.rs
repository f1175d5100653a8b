//! Traffic aggregation.
//!
//! Groups accepted records by hour of day, day type, rainfall and snowfall,
//! and computes guarded averages for each group.

pub mod aggregate;
pub mod types;
pub mod utility;
