//! Transformation module.
//!
//! This module turns normalized rows into finished reports:
//! - Grouper: classified-row filter, rider sort and grouping
//! - Aggregate: subtotal, spacer and grand-total rows
//! - Split: per-category buckets and Forsyth billing fields
//! - Pipeline: main entry points

pub mod aggregate;
pub mod grouper;
pub mod pipeline;
pub mod split;

pub use aggregate::{aggregate, Aggregated};
pub use grouper::{person_groups, retain_classified, sort_by_person, Runs};
pub use pipeline::*;
pub use split::{split_table, ForsythBilling};
