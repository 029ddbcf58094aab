//! # Ridefare - ride-share expense export cleaning
//!
//! Ridefare turns ride-share business exports (several header layouts, two
//! headerless provider formats, CSV or XLSX) into billing workbooks: one row
//! per ride, grouped by rider with subtotals, optionally split by county
//! code with the Forsyth co-pay columns filled in.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV / XLSX │────▶│   Parser    │────▶│   Schema    │────▶│  Transform  │────▶ XLSX
//! │  (any enc)  │     │  (auto-enc) │     │ (normalize) │     │ (subtotals) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ridefare::{normalize_and_aggregate, SourceFile};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = normalize_and_aggregate(&SourceFile::from_path("rides.csv")?)?;
//!     std::fs::write("cleaned_report.xlsx", &report.workbook)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells, tables, rider keys and billing categories
//! - [`parser`] - CSV/XLSX reading with encoding and separator detection
//! - [`schema`] - Layout detection and canonical column normalization
//! - [`transform`] - Grouping, subtotals, split and pipeline entry points
//! - [`export`] - Workbook writer
//! - [`config`] - Server configuration from the environment
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Reading
pub mod parser;
pub mod schema;

// Transformation
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod config;
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExportError,
    PipelineError,
    PipelineResult,
    SchemaError,
    ServerError,
    SourceError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Category, Cell, PersonKey, Table, CANONICAL_COLUMNS};

// =============================================================================
// Re-exports - Parsing and schema
// =============================================================================

pub use parser::{parse_bytes, parse_file, read_table, ParsedSource};
pub use schema::{normalize, normalize_table, Layout, LayoutInfo, NormalizedSource, Provider};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    inspect,
    merge,
    normalize_and_aggregate,
    split,
    split_source,
    Report,
    ReportSummary,
    SourceFile,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{write_workbook, ExportOptions, Shade};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use config::ServerConfig;
pub use api::types::{error_response, SplitLinks};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
