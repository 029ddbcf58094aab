//! Error types for the ride-share report pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`SourceError`] - Reading upload bytes (format, encoding, CSV, XLSX)
//! - [`SchemaError`] - Locating a known layout and required columns
//! - [`ExportError`] - Writing the output workbook
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP adapter errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while reading an uploaded file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Neither delimited text nor a spreadsheet.
    #[error("Unsupported file format for '{filename}' (content type: {})", .content_type.as_deref().unwrap_or("unknown"))]
    UnsupportedFormat {
        filename: String,
        content_type: Option<String>,
    },

    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited text.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook could not be opened or has no sheets.
    #[error("Invalid spreadsheet: {0}")]
    Spreadsheet(String),

    /// Nothing but blank rows.
    #[error("File is empty")]
    EmptyFile,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors while reconciling a source onto the canonical schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No known header layout could be located.
    #[error("Could not detect a known export layout: {}", .attempts.join("; "))]
    Detection { attempts: Vec<String> },

    /// Required columns absent after normalization.
    #[error("Missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while materializing a workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writer failure.
    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by the public operations in
/// [`crate::transform::pipeline`]. Every failure surfaces as exactly one
/// human-readable message.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source reading error.
    #[error("{0}")]
    Source(#[from] SourceError),

    /// Schema detection or validation error.
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// Workbook writing error.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// No row carries a classification code.
    #[error("No rows with an Internal Note to report on")]
    NoClassifiedRows,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source reading.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for normalization.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for workbook export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
