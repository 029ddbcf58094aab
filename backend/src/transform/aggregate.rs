//! Per-rider subtotals and the grand total.
//!
//! Output layout for each group: its data rows (with `Trips Count = 1`),
//! one subtotal row, one blank spacer row. One grand-total row follows the
//! last group.

use std::ops::Range;

use crate::api::logs::log_warning;
use crate::models::{round2, Cell, Table, FARES_ONLY, LOCAL_AMOUNT, TRANSACTION_AMOUNT, TRIPS_COUNT};

use super::grouper::person_groups;

/// Candidates for the monetary column, most specific first.
pub const AMOUNT_COLUMNS: [&str; 2] = [TRANSACTION_AMOUNT, LOCAL_AMOUNT];

/// Result of an aggregation run.
#[derive(Debug, Clone)]
pub struct Aggregated {
    pub table: Table,
    pub data_rows: usize,
    pub groups: usize,
    /// Column holding the grand total, if the output has one
    pub total_column: Option<&'static str>,
    pub grand_total: f64,
}

/// Sum of coerced values. Non-blank values that fail coercion are counted
/// in `skipped` and left out of the sum.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Tally {
    pub sum: f64,
    pub skipped: usize,
}

impl Tally {
    pub fn add(&mut self, cell: &Cell) {
        match cell.as_number() {
            Some(n) => self.sum += n,
            None if !cell.is_blank() => self.skipped += 1,
            None => {}
        }
    }

    pub fn of<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut tally = Tally::default();
        for cell in cells {
            tally.add(cell);
        }
        tally
    }
}

/// Group a filtered, person-sorted table and interleave subtotal, spacer
/// and grand-total rows. `Fares Only` mirrors the amount column and ends up
/// as the last column.
pub fn aggregate(input: &Table) -> Aggregated {
    let mut source = input.clone();
    let amount_col = source.first_present(&AMOUNT_COLUMNS).unwrap_or(TRANSACTION_AMOUNT);
    let amount_idx = source.ensure_column(amount_col);
    let fares_idx = source.ensure_column(FARES_ONLY);
    let fares: Vec<Cell> = source.rows().iter().map(|r| r[amount_idx].clone()).collect();
    for (row, value) in fares.into_iter().enumerate() {
        source.set(row, FARES_ONLY, value);
    }

    let groups = person_groups(&source);
    let mut out = Table::new(source.columns().iter().cloned());
    out.ensure_column(TRIPS_COUNT);

    let skipped: usize = groups
        .iter()
        .map(|range| emit_group(&source, range.clone(), amount_col, &mut out).skipped)
        .sum();

    let grand_total = round2(Tally::of(out.rows().iter().map(|r| &r[fares_idx])).sum);
    out.push_blank_row();
    let last = out.len() - 1;
    out.set(last, FARES_ONLY, Cell::Number(grand_total));
    out.move_to_end(&[FARES_ONLY]);

    if skipped > 0 {
        log_warning(format!(
            "{} non-numeric value(s) in '{}' left out of subtotals",
            skipped, amount_col
        ));
    }

    Aggregated {
        table: out,
        data_rows: input.len(),
        groups: groups.len(),
        total_column: Some(FARES_ONLY),
        grand_total,
    }
}

/// Copy one group's rows into `out`, each with `Trips Count = 1`, then the
/// subtotal and spacer rows. Returns the tally of the group's amount column.
pub fn emit_group(source: &Table, range: Range<usize>, amount_col: &str, out: &mut Table) -> Tally {
    let count = range.len();
    let mut tally = Tally::default();

    for row in range {
        tally.add(source.get(row, amount_col));
        push_aligned(source, row, out);
        let idx = out.len() - 1;
        out.set(idx, TRIPS_COUNT, Cell::Number(1.0));
    }

    out.push_blank_row();
    let subtotal = out.len() - 1;
    out.set(subtotal, amount_col, Cell::Number(round2(tally.sum)));
    out.set(subtotal, TRIPS_COUNT, Cell::Number(count as f64));
    out.push_blank_row();

    tally
}

/// Append `source` row `row` to `out`, aligning by column name.
fn push_aligned(source: &Table, row: usize, out: &mut Table) {
    let cells = out
        .columns()
        .iter()
        .map(|c| source.get(row, c).clone())
        .collect();
    out.push_row(cells);
}
