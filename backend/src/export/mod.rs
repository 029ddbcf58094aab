//! Spreadsheet materializer.
//!
//! Renders a [`Table`] to XLSX bytes with `rust_xlsxwriter`: bold header,
//! thin borders on every cell, currency format on money columns and, for
//! cleaned reports, a fill color per classification code.

use std::collections::HashMap;

use rust_xlsxwriter::{Format, FormatBorder, Workbook};

use crate::error::ExportResult;
use crate::models::{Cell, Table, INTERNAL_NOTE, TRIPS_COUNT};

pub const CURRENCY_FORMAT: &str = "\"$\"#,##0.00";

/// Row fill keyed by classification code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shade {
    /// FCC, light blue
    Fcc,
    /// FCM, light green
    Fcm,
    /// FCSH, light yellow
    Fcsh,
    /// FCSC, light orange
    Fcsc,
    /// DTF, light purple
    Dtf,
    /// Anything else, light gray
    Other,
}

impl Shade {
    const ALL: [Shade; 6] = [Shade::Fcc, Shade::Fcm, Shade::Fcsh, Shade::Fcsc, Shade::Dtf, Shade::Other];

    pub fn for_code(code: &str) -> Self {
        match code.trim() {
            "FCC" => Shade::Fcc,
            "FCM" => Shade::Fcm,
            "FCSH" => Shade::Fcsh,
            "FCSC" => Shade::Fcsc,
            "DTF" => Shade::Dtf,
            _ => Shade::Other,
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            Shade::Fcc => 0xD9E1F2,
            Shade::Fcm => 0xE2EFDA,
            Shade::Fcsh => 0xFFF2CC,
            Shade::Fcsc => 0xFCE4D6,
            Shade::Dtf => 0xE4DFEC,
            Shade::Other => 0xD9D9D9,
        }
    }
}

/// How a table is rendered.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub sheet_name: String,
    /// Fill data rows by classification code
    pub shading: bool,
    pub currency_columns: Vec<String>,
}

impl ExportOptions {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            shading: false,
            currency_columns: Vec::new(),
        }
    }

    pub fn with_shading(mut self) -> Self {
        self.shading = true;
        self
    }

    pub fn with_currency<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.currency_columns
            .extend(columns.iter().map(|c| c.as_ref().to_string()));
        self
    }
}

/// Prebuilt cell formats, one per (fill, currency) pair.
struct Styles {
    header: Format,
    cells: HashMap<(Option<Shade>, bool), Format>,
}

impl Styles {
    fn new() -> Self {
        let base = Format::new().set_border(FormatBorder::Thin);
        let mut cells = HashMap::new();
        for shade in std::iter::once(None).chain(Shade::ALL.into_iter().map(Some)) {
            let fill = match shade {
                Some(s) => base.clone().set_background_color(s.color()),
                None => base.clone(),
            };
            cells.insert((shade, true), fill.clone().set_num_format(CURRENCY_FORMAT));
            cells.insert((shade, false), fill);
        }
        Self {
            header: Format::new().set_bold().set_border(FormatBorder::Thin),
            cells,
        }
    }

    fn cell(&self, shade: Option<Shade>, currency: bool) -> &Format {
        &self.cells[&(shade, currency)]
    }
}

/// Render `table` as a single-sheet workbook.
pub fn write_workbook(table: &Table, options: &ExportOptions) -> ExportResult<Vec<u8>> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(&options.sheet_name)?;

    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &styles.header)?;
    }

    let currency: Vec<bool> = table
        .columns()
        .iter()
        .map(|c| options.currency_columns.iter().any(|m| m == c))
        .collect();

    for (idx, row) in table.rows().iter().enumerate() {
        let shade = if options.shading { row_shade(table, idx) } else { None };
        let out_row = idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let format = styles.cell(shade, currency[col]);
            let col = col as u16;
            match cell {
                Cell::Number(n) => sheet.write_number_with_format(out_row, col, *n, format)?,
                Cell::Text(s) => sheet.write_string_with_format(out_row, col, s, format)?,
                Cell::Empty => sheet.write_blank(out_row, col, format)?,
            };
        }
    }

    sheet.autofit();
    Ok(workbook.save_to_buffer()?)
}

/// Fill for a data row; summary rows (blank Trips Count) and rows without
/// a code stay unfilled.
fn row_shade(table: &Table, row: usize) -> Option<Shade> {
    if table.get(row, TRIPS_COUNT).is_blank() {
        return None;
    }
    let note = table.get(row, INTERNAL_NOTE);
    if note.is_blank() {
        return None;
    }
    Some(Shade::for_code(&note.to_text()))
}
