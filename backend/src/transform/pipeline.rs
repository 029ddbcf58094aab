//! High-level pipeline API for ride-share expense reports.
//!
//! This module provides easy-to-use functions that combine all steps:
//! reading, normalization, filtering, grouping, aggregation and export.
//!
//! # Example
//!
//! ```rust,ignore
//! use ridefare::transform::{normalize_and_aggregate, SourceFile};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = SourceFile::from_path("rides.csv")?;
//!     let report = normalize_and_aggregate(&source)?;
//!     std::fs::write("cleaned_report.xlsx", &report.workbook)?;
//!     println!("{} riders, total {:.2}", report.summary.groups, report.summary.grand_total);
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::aggregate::{aggregate, Aggregated};
use super::grouper::{retain_classified, sort_by_person};
use super::split::{split_table, FORSYTH_COLUMNS};
use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult, SourceResult};
use crate::export::{write_workbook, ExportOptions};
use crate::models::{Category, Table, FARES_ONLY, TRANSACTION_AMOUNT};
use crate::parser::{parse_bytes, read_table, ParsedSource};
use crate::schema::{normalize, LayoutInfo};

/// Sheet name of cleaned and merged reports
pub const CLEANED_SHEET: &str = "CleanedData";

/// Sheet name of split reports
pub const SPLIT_SHEET: &str = "Sheet1";

/// An uploaded or on-disk input file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

impl SourceFile {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self::new(bytes, filename, None))
    }

    fn parse(&self) -> SourceResult<ParsedSource> {
        parse_bytes(&self.bytes, &self.filename, self.content_type.as_deref())
    }
}

/// Counts reported alongside every output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Classified input rows
    pub data_rows: usize,
    /// Riders
    pub groups: usize,
    /// Column carrying the grand total
    pub total_column: Option<String>,
    pub grand_total: f64,
}

/// A finished report: the table for previews plus the rendered workbook.
#[derive(Debug, Clone)]
pub struct Report {
    pub table: Table,
    pub workbook: Vec<u8>,
    pub summary: ReportSummary,
}

impl Report {
    fn render(aggregated: Aggregated, options: &ExportOptions) -> PipelineResult<Self> {
        let workbook = write_workbook(&aggregated.table, options)?;
        Ok(Self {
            summary: ReportSummary {
                data_rows: aggregated.data_rows,
                groups: aggregated.groups,
                total_column: aggregated.total_column.map(String::from),
                grand_total: aggregated.grand_total,
            },
            table: aggregated.table,
            workbook,
        })
    }
}

/// Read and normalize one source, returning the canonical table and the
/// detection summary. No rows are filtered.
pub fn inspect(source: &SourceFile) -> PipelineResult<(LayoutInfo, Table)> {
    let parsed = read_source(source)?;
    let normalized = normalize(&parsed)?;
    Ok((normalized.info(&parsed), normalized.table))
}

/// Clean one export: normalize, keep classified rows, group by rider and
/// add subtotals.
pub fn normalize_and_aggregate(source: &SourceFile) -> PipelineResult<Report> {
    let table = prepare(source)?;
    finish(table)
}

/// Clean two exports and combine them into one report.
pub fn merge(a: &SourceFile, b: &SourceFile) -> PipelineResult<Report> {
    let mut combined = prepare(a)?;
    combined.append(prepare(b)?);
    sort_by_person(&mut combined);
    log_success(format!("Merged {} rows from {} and {}", combined.len(), a.filename, b.filename));
    finish(combined)
}

/// Split a cleaned or merged report into per-category reports.
///
/// Returns an empty map when the table has no Internal Note column.
pub fn split(table: &Table) -> PipelineResult<BTreeMap<Category, Report>> {
    log_info("✂️  Splitting by Internal Note...");
    let buckets = split_table(table);
    if buckets.is_empty() {
        log_warning("Nothing to split: 'Internal Note' missing or empty");
    }

    let mut reports = BTreeMap::new();
    for (category, aggregated) in buckets {
        let mut currency: Vec<&str> = aggregated.total_column.into_iter().collect();
        if category == Category::Forsyth {
            currency.extend(FORSYTH_COLUMNS);
        }
        let options = ExportOptions::new(SPLIT_SHEET).with_currency(&currency);
        log_success(format!(
            "{}: {} rows, {} riders",
            category, aggregated.data_rows, aggregated.groups
        ));
        reports.insert(category, Report::render(aggregated, &options)?);
    }
    Ok(reports)
}

/// Split a previously produced report file.
pub fn split_source(source: &SourceFile) -> PipelineResult<BTreeMap<Category, Report>> {
    let table = read_table(&source.bytes, &source.filename, source.content_type.as_deref())?;
    log_success(format!("Read {} rows from {}", table.len(), source.filename));
    split(&table)
}

fn read_source(source: &SourceFile) -> PipelineResult<ParsedSource> {
    log_info(format!("📖 Reading {}...", source.filename));
    let parsed = source.parse()?;
    if let (Some(encoding), Some(delimiter)) = (&parsed.encoding, parsed.delimiter) {
        log_success(format!("Detected encoding: {}", encoding));
        log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    }
    log_success(format!("Read {} raw rows", parsed.grid.len()));
    Ok(parsed)
}

/// Normalize, filter and sort one source.
fn prepare(source: &SourceFile) -> PipelineResult<Table> {
    let parsed = read_source(source)?;
    let mut table = normalize(&parsed)?.table;

    let before = table.len();
    retain_classified(&mut table);
    let dropped = before - table.len();
    if dropped > 0 {
        log_info(format!("Skipped {} row(s) without an Internal Note", dropped));
    }
    sort_by_person(&mut table);
    Ok(table)
}

fn finish(table: Table) -> PipelineResult<Report> {
    if table.is_empty() {
        return Err(PipelineError::NoClassifiedRows);
    }

    log_info("📦 Grouping by rider...");
    let aggregated = aggregate(&table);
    log_success(format!(
        "{} rows, {} riders, total {:.2}",
        aggregated.data_rows, aggregated.groups, aggregated.grand_total
    ));

    let options = ExportOptions::new(CLEANED_SHEET)
        .with_shading()
        .with_currency(&[TRANSACTION_AMOUNT, FARES_ONLY]);
    Report::render(aggregated, &options)
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, INTERNAL_NOTE, TRIPS_COUNT};

    fn csv(name: &str, body: &str) -> SourceFile {
        SourceFile::new(body.as_bytes().to_vec(), name, None)
    }

    #[test]
    fn test_clean_requires_classified_rows() {
        let src = csv("a.csv", "First Name,Last Name,Internal Note\nAnn,Lee,\n");
        assert!(matches!(normalize_and_aggregate(&src), Err(PipelineError::NoClassifiedRows)));
    }

    #[test]
    fn test_clean_summary() {
        let src = csv(
            "a.csv",
            "First Name,Last Name,Internal Note,Transaction Amount\nAnn,Lee,FCC,10\nAnn,Lee,FCC,15\nBo,Ray,,4\n",
        );
        let report = normalize_and_aggregate(&src).unwrap();
        assert_eq!(report.summary.data_rows, 2);
        assert_eq!(report.summary.groups, 1);
        assert_eq!(report.summary.grand_total, 25.0);
        assert_eq!(report.summary.total_column.as_deref(), Some(FARES_ONLY));
        assert!(report.workbook.starts_with(b"PK"));
    }

    #[test]
    fn test_merge_keeps_riders_apart() {
        let a = csv("a.csv", "First Name,Last Name,Internal Note,Transaction Amount\nBo,Ray,FCM,4\n");
        let b = csv("b.csv", "First Name,Last Name,Internal Note,Transaction Amount\nAnn,Lee,DTF,6\n");
        let report = merge(&a, &b).unwrap();
        let t = &report.table;
        // Lee, subtotal, spacer, Ray, subtotal, spacer, grand total
        assert_eq!(t.len(), 7);
        assert_eq!(t.get(0, INTERNAL_NOTE), &Cell::Text("DTF".into()));
        assert_eq!(t.get(1, TRANSACTION_AMOUNT), &Cell::Number(6.0));
        assert_eq!(t.get(4, TRANSACTION_AMOUNT), &Cell::Number(4.0));
        assert_eq!(t.get(6, FARES_ONLY), &Cell::Number(10.0));
        assert_eq!(report.summary.groups, 2);
    }

    #[test]
    fn test_split_of_merged_report() {
        let a = csv("a.csv", "First Name,Last Name,Internal Note,Transaction Amount\nBo,Ray,FCM,4\n");
        let b = csv("b.csv", "First Name,Last Name,Internal Note,Transaction Amount\nAnn,Lee,DTF,20\n");
        let merged = merge(&a, &b).unwrap();
        let reports = split(&merged.table).unwrap();
        assert_eq!(reports.keys().copied().collect::<Vec<_>>(), vec![Category::Forsyth, Category::Fulton]);

        let forsyth = &reports[&Category::Forsyth];
        assert_eq!(forsyth.summary.data_rows, 1);
        assert_eq!(forsyth.summary.grand_total, 20.0);
        assert!(!forsyth.table.has_column(TRIPS_COUNT));
    }

    fn provider_a_ride(guest_first: &str, amount: &str) -> String {
        use crate::schema::layouts::PROVIDER_A_HEADERS;
        PROVIDER_A_HEADERS
            .iter()
            .map(|h| match *h {
                "Request Type" => "Standard",
                "First Name" => "Boss",
                "Last Name" => "Account",
                "Guest First Name" => guest_first,
                "Guest Last Name" => "Rider",
                "Internal Note" => "FCC",
                "Transaction Amount in Local Currency (incl. Taxes)" => amount,
                _ => "x",
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn test_merge_headerless_exports_by_guest() {
        let a = csv("a.csv", &provider_a_ride("Ann", "12.50"));
        let b = csv("b.csv", &provider_a_ride("Cy", "7.50"));
        let report = merge(&a, &b).unwrap();
        assert_eq!(report.summary.data_rows, 2);
        assert_eq!(report.summary.groups, 2);
        assert_eq!(report.summary.grand_total, 20.0);
        assert_eq!(report.table.get(0, crate::models::FIRST_NAME), &Cell::Text("Ann".into()));
    }

    #[test]
    fn test_inspect_reports_layout() {
        let src = csv("a.csv", "Ride ID,First Name,Last Name,Internal Note\nr1,Ann,Lee,\n");
        let (info, table) = inspect(&src).unwrap();
        assert_eq!(info.layout, "headered export");
        assert_eq!(info.delimiter, Some(','));
        assert_eq!(table.len(), 1);
    }
}
