//! Domain models for the ride-share report pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Cell`] - A single typed spreadsheet value (empty, number or text)
//! - [`Table`] - Ordered columns plus rows of cells aligned with them
//! - [`Category`] - Billing bucket produced by the split operation
//! - [`PersonKey`] - Rider identity used for sorting and grouping

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// Column names
// =============================================================================

pub const PICKUP_DATE: &str = "Pickup Date (Local)";
pub const PICKUP_TIME: &str = "Pickup Time (Local)";
pub const FIRST_NAME: &str = "First Name";
pub const LAST_NAME: &str = "Last Name";
pub const EMAIL_INFO: &str = "Email Info";
pub const DISTANCE: &str = "Distance (miles)";
pub const PICKUP_ADDRESS: &str = "Pickup Address";
pub const DROPOFF_ADDRESS: &str = "Drop-off Address";
pub const TRANSACTION_TYPE: &str = "Transaction Type";
pub const INTERNAL_NOTE: &str = "Internal Note";
pub const TRANSACTION_AMOUNT: &str = "Transaction Amount";
pub const PASSENGER_NUMBER: &str = "Passenger Number";

pub const LOCAL_AMOUNT: &str = "Transaction Amount in Local Currency (incl. Taxes)";
pub const TRIPS_COUNT: &str = "Trips Count";
pub const FARES_ONLY: &str = "Fares Only";
pub const FARE: &str = "Fare";

/// Output columns every normalized record carries, in order.
pub const CANONICAL_COLUMNS: [&str; 12] = [
    PICKUP_DATE,
    PICKUP_TIME,
    FIRST_NAME,
    LAST_NAME,
    EMAIL_INFO,
    DISTANCE,
    PICKUP_ADDRESS,
    DROPOFF_ADDRESS,
    TRANSACTION_TYPE,
    INTERNAL_NOTE,
    TRANSACTION_AMOUNT,
    PASSENGER_NUMBER,
];

// =============================================================================
// Cell
// =============================================================================

/// One spreadsheet value.
///
/// Serializes untagged so a preview row reads as plain JSON
/// (`null`, `12.5`, `"FCC"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Text cell, or `Empty` when the text is blank.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    /// Type a raw textual value the way a reader infers it: blank values are
    /// empty, anything that parses as a finite number is numeric.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() && looks_numeric(trimmed) => Cell::Number(n),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(_) => false,
            Cell::Text(s) => s.trim().is_empty(),
        }
    }

    /// Numeric coercion. Never fails: unparseable values are `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Render as text. Integral numbers print without a fraction so phone
    /// numbers and counts survive a round trip through a numeric column.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
        }
    }

    /// Same cell coerced to a number, or `Empty` when coercion fails.
    pub fn to_numeric(&self) -> Cell {
        self.as_number().map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::text(s)
    }
}

impl From<Option<f64>> for Cell {
    fn from(n: Option<f64>) -> Self {
        n.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn looks_numeric(s: &str) -> bool {
    // Rust accepts "inf", "NaN" and friends; a spreadsheet reader does not.
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Round half away from zero to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Table
// =============================================================================

/// Ordered column names plus rows of cells aligned with them.
///
/// Every row always has exactly `columns.len()` cells; column operations
/// keep rows in step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from a header row and data rows. Short rows are padded
    /// with empty cells, long rows are truncated.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Self {
            columns,
            rows: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// First of `candidates` present in this table. Evaluated once per
    /// table, not per row.
    pub fn first_present<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.has_column(c))
    }

    /// Cell at `row` in column `name`; `Empty` when either is absent.
    pub fn get(&self, row: usize, name: &str) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.column_index(name)
            .and_then(|col| self.rows.get(row).and_then(|r| r.get(col)))
            .unwrap_or(&EMPTY)
    }

    /// Set a cell, adding the column if needed.
    pub fn set(&mut self, row: usize, name: &str, value: Cell) {
        let col = self.ensure_column(name);
        if let Some(r) = self.rows.get_mut(row) {
            r[col] = value;
        }
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    /// Row with every cell empty.
    pub fn push_blank_row(&mut self) {
        self.rows.push(vec![Cell::Empty; self.columns.len()]);
    }

    /// Index of `name`, appending an empty column when missing.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Cell::Empty);
        }
        self.columns.len() - 1
    }

    /// Rename every column called `from`.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        for col in self.columns.iter_mut().filter(|c| c.as_str() == from) {
            *col = to.to_string();
        }
    }

    pub fn rename_columns(&mut self, map: &[(&str, &str)]) {
        for (from, to) in map {
            self.rename_column(from, to);
        }
    }

    pub fn map_column_names(&mut self, f: impl Fn(&str) -> String) {
        for col in &mut self.columns {
            *col = f(col);
        }
    }

    /// Keep only columns matching `keep`, preserving order.
    fn retain_columns(&mut self, keep: impl Fn(usize, &str) -> bool) {
        let mask: Vec<bool> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| keep(i, c))
            .collect();
        let mut i = 0;
        self.columns.retain(|_| {
            i += 1;
            mask[i - 1]
        });
        for row in &mut self.rows {
            let mut i = 0;
            row.retain(|_| {
                i += 1;
                mask[i - 1]
            });
        }
    }

    /// Drop every column whose name is in `names`. Absent names are ignored.
    pub fn drop_columns(&mut self, names: &[&str]) {
        self.retain_columns(|_, c| !names.contains(&c));
    }

    /// Remove later columns that repeat an earlier name.
    pub fn dedup_columns(&mut self) {
        let firsts: Vec<bool> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| self.columns[..i].iter().all(|prev| prev != c))
            .collect();
        self.retain_columns(|i, _| firsts[i]);
    }

    /// Reorder to exactly `names`, dropping other columns and adding missing
    /// ones as empty.
    pub fn project(&mut self, names: &[&str]) {
        let sources: Vec<Option<usize>> = names.iter().map(|n| self.column_index(n)).collect();
        for row in &mut self.rows {
            let projected = sources
                .iter()
                .map(|src| src.map(|i| std::mem::take(&mut row[i])).unwrap_or_default())
                .collect();
            *row = projected;
        }
        self.columns = names.iter().map(|n| n.to_string()).collect();
    }

    /// Keep only the `names` that are present, in the order given.
    pub fn project_present(&mut self, names: &[&str]) {
        let present: Vec<&str> = names.iter().copied().filter(|n| self.has_column(n)).collect();
        self.project(&present);
    }

    /// Move the named (present) columns to the end, in the order given.
    pub fn move_to_end(&mut self, names: &[&str]) {
        let present: Vec<&str> = names.iter().copied().filter(|n| self.has_column(n)).collect();
        let mut order: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !present.contains(&c.as_str()))
            .cloned()
            .collect();
        order.extend(present.iter().map(|s| s.to_string()));
        let order: Vec<&str> = order.iter().map(String::as_str).collect();
        self.project(&order);
    }

    /// Apply `f` to every cell of column `name`, if present.
    pub fn map_column(&mut self, name: &str, f: impl Fn(&Cell) -> Cell) {
        if let Some(col) = self.column_index(name) {
            for row in &mut self.rows {
                row[col] = f(&row[col]);
            }
        }
    }

    pub fn retain_rows(&mut self, keep: impl Fn(&Table, usize) -> bool) {
        let mask: Vec<bool> = (0..self.rows.len()).map(|i| keep(self, i)).collect();
        let mut i = 0;
        self.rows.retain(|_| {
            i += 1;
            mask[i - 1]
        });
    }

    /// Stable sort of rows.
    pub fn sort_rows_by(&mut self, cmp: impl Fn(&Table, usize, usize) -> Ordering) {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| cmp(self, a, b));
        let mut taken: Vec<Option<Vec<Cell>>> = std::mem::take(&mut self.rows)
            .into_iter()
            .map(Some)
            .collect();
        self.rows = order
            .into_iter()
            .filter_map(|i| taken[i].take())
            .collect();
    }

    /// Append another table's rows, aligning by column name. Columns only
    /// present in `other` are appended.
    pub fn append(&mut self, other: Table) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|c| self.ensure_column(c))
            .collect();
        for row in other.rows {
            let mut aligned = vec![Cell::Empty; self.columns.len()];
            for (cell, &target) in row.into_iter().zip(&mapping) {
                aligned[target] = cell;
            }
            self.rows.push(aligned);
        }
    }

    /// Header row followed by data rows, as a reader would see the sheet.
    pub fn to_grid(&self) -> Vec<Vec<Cell>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.columns.iter().map(|c| Cell::Text(c.clone())).collect());
        grid.extend(self.rows.iter().cloned());
        grid
    }

    /// Rows as JSON objects keyed by column name, for previews.
    pub fn to_records(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| (c.clone(), serde_json::to_value(v).unwrap_or_default()))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// Person key
// =============================================================================

/// Rider identity. Equality is exact (grouping); ordering is
/// case-insensitive on (last, first, passenger) (sorting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonKey {
    pub passenger: String,
    pub last: String,
    pub first: String,
}

impl PersonKey {
    pub fn of(table: &Table, row: usize) -> Self {
        Self {
            passenger: table.get(row, PASSENGER_NUMBER).to_text().trim().to_string(),
            last: table.get(row, LAST_NAME).to_text().trim().to_string(),
            first: table.get(row, FIRST_NAME).to_text().trim().to_string(),
        }
    }
}

/// Compare two key cells: numerically when both are numbers, otherwise as
/// lowercased text.
pub fn compare_key_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        _ => a.to_text().to_lowercase().cmp(&b.to_text().to_lowercase()),
    }
}

// =============================================================================
// Category
// =============================================================================

/// Billing bucket for the split operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// DTF, DTFCE
    Forsyth,
    /// FCC, FCM, FCSH, FCSC
    Fulton,
    /// Any other non-empty code
    #[serde(rename = "Other_report")]
    Other,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Forsyth, Category::Fulton, Category::Other];

    /// Bucket for a classification code; `None` for blank codes.
    pub fn classify(code: &str) -> Option<Self> {
        let code = code.trim().to_uppercase();
        match code.as_str() {
            "" => None,
            "DTF" | "DTFCE" => Some(Category::Forsyth),
            "FCC" | "FCM" | "FCSH" | "FCSC" => Some(Category::Fulton),
            _ => Some(Category::Other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Forsyth => "Forsyth",
            Category::Fulton => "Fulton",
            Category::Other => "Other_report",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![Cell::from(1.0), Cell::from("x"), Cell::Empty],
                vec![Cell::from(2.0), Cell::from("y")],
            ],
        )
    }

    #[test]
    fn test_infer_types() {
        assert_eq!(Cell::infer("  "), Cell::Empty);
        assert_eq!(Cell::infer("12.50"), Cell::Number(12.5));
        assert_eq!(Cell::infer("FCC"), Cell::Text("FCC".into()));
        assert_eq!(Cell::infer("inf"), Cell::Text("inf".into()));
        assert_eq!(Cell::infer("2024-01-05"), Cell::Text("2024-01-05".into()));
    }

    #[test]
    fn test_numeric_coercion_never_fails() {
        assert_eq!(Cell::Text(" 7.25 ".into()).as_number(), Some(7.25));
        assert_eq!(Cell::Text("n/a".into()).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
        assert_eq!(Cell::Text("abc".into()).to_numeric(), Cell::Empty);
    }

    #[test]
    fn test_integral_numbers_render_without_fraction() {
        assert_eq!(Cell::Number(5551234567.0).to_text(), "5551234567");
        assert_eq!(Cell::Number(12.5).to_text(), "12.5");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let t = sample();
        assert_eq!(t.rows()[1].len(), 3);
        assert!(t.get(1, "c").is_empty());
        assert!(t.get(0, "missing").is_empty());
    }

    #[test]
    fn test_dedup_keeps_first() {
        let mut t = sample();
        t.rename_column("c", "a");
        t.dedup_columns();
        assert_eq!(t.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(t.get(0, "a"), &Cell::Number(1.0));
    }

    #[test]
    fn test_project_adds_missing_and_drops_extra() {
        let mut t = sample();
        t.project(&["b", "z"]);
        assert_eq!(t.columns(), &["b".to_string(), "z".to_string()]);
        assert_eq!(t.get(0, "b"), &Cell::Text("x".into()));
        assert!(t.get(0, "z").is_empty());
    }

    #[test]
    fn test_move_to_end() {
        let mut t = sample();
        t.move_to_end(&["a", "nope"]);
        assert_eq!(t.columns().last().map(String::as_str), Some("a"));
        assert_eq!(t.get(1, "a"), &Cell::Number(2.0));
    }

    #[test]
    fn test_append_aligns_by_name() {
        let mut t = sample();
        let other = Table::from_rows(
            vec!["c".into(), "d".into()],
            vec![vec![Cell::from("c1"), Cell::from("d1")]],
        );
        t.append(other);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(2, "c"), &Cell::Text("c1".into()));
        assert_eq!(t.get(2, "d"), &Cell::Text("d1".into()));
        assert!(t.get(0, "d").is_empty());
    }

    #[test]
    fn test_category_classification() {
        assert_eq!(Category::classify(" dtfce "), Some(Category::Forsyth));
        assert_eq!(Category::classify("FCSH"), Some(Category::Fulton));
        assert_eq!(Category::classify("XYZ"), Some(Category::Other));
        assert_eq!(Category::classify("   "), None);
        assert_eq!(Category::Other.to_string(), "Other_report");
    }

    #[test]
    fn test_key_cells_compare_case_insensitively() {
        let a = Cell::from("adams");
        let b = Cell::from("Baker");
        assert_eq!(compare_key_cells(&a, &b), Ordering::Less);
        assert_eq!(compare_key_cells(&Cell::Number(10.0), &Cell::Number(9.0)), Ordering::Greater);
    }
}
