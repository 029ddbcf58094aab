//! Source reader: delimited text or spreadsheet bytes into a raw cell grid.
//!
//! Encoding and delimiter are auto-detected for text exports. No header row
//! is assumed here; locating the header is the normalizer's job.

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use std::io::Cursor;
use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::models::{Cell, Table};

/// Kind of upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// CSV / TSV text export
    Delimited,
    /// XLSX, XLS, XLSB or ODS workbook (first sheet)
    Spreadsheet,
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

impl SourceFormat {
    /// Detect from file extension, then MIME type, then magic bytes.
    pub fn detect(filename: &str, content_type: Option<&str>, bytes: &[u8]) -> SourceResult<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv" | "tsv" | "txt") => return Ok(SourceFormat::Delimited),
            Some("xlsx" | "xlsm" | "xls" | "xlsb" | "ods") => return Ok(SourceFormat::Spreadsheet),
            _ => {}
        }

        let mime = content_type
            .map(|c| c.split(';').next().unwrap_or("").trim().to_ascii_lowercase());
        match mime.as_deref() {
            Some("text/csv" | "text/plain" | "application/csv" | "text/tab-separated-values") => {
                return Ok(SourceFormat::Delimited)
            }
            Some(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                | "application/vnd.ms-excel"
                | "application/vnd.ms-excel.sheet.binary.macroenabled.12"
                | "application/vnd.oasis.opendocument.spreadsheet",
            ) => return Ok(SourceFormat::Spreadsheet),
            _ => {}
        }

        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            return Ok(SourceFormat::Spreadsheet);
        }

        Err(SourceError::UnsupportedFormat {
            filename: filename.to_string(),
            content_type: content_type.map(String::from),
        })
    }
}

/// Raw rows read from a source, before any header is chosen.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    /// All rows, including whatever header/preamble rows the file has
    pub grid: Vec<Vec<Cell>>,
    pub format: SourceFormat,
    /// Detected text encoding (delimited only)
    pub encoding: Option<String>,
    /// Detected delimiter (delimited only)
    pub delimiter: Option<char>,
}

impl ParsedSource {
    /// Cell at absolute (row, col); `Empty` outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.grid
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Table using row `header_row` as column names and everything below
    /// it as data. Fully blank data rows are skipped.
    pub fn with_header(&self, header_row: usize) -> Table {
        let columns: Vec<String> = self
            .grid
            .get(header_row)
            .map(|r| r.iter().map(Cell::to_text).collect())
            .unwrap_or_default();

        let rows = self
            .grid
            .iter()
            .skip(header_row + 1)
            .filter(|r| !r.iter().all(Cell::is_blank))
            .cloned()
            .collect();

        Table::from_rows(columns, rows)
    }

    /// Table with the given column names and every row as data.
    pub fn with_columns(&self, columns: &[&str]) -> Table {
        let rows = self
            .grid
            .iter()
            .filter(|r| !r.iter().all(Cell::is_blank))
            .cloned()
            .collect();
        Table::from_rows(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    /// Number of columns in the widest row.
    pub fn width(&self) -> usize {
        self.grid.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // UTF-8 and anything unrecognised: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences over the first lines.
/// Comma wins ties; ride-share exports are comma separated.
pub fn detect_delimiter(content: &str) -> char {
    let sample: Vec<&str> = content.lines().take(8).collect();

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = sample
            .iter()
            .map(|line| line.matches(sep).count())
            .max()
            .unwrap_or(0);
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Read upload bytes into a raw grid.
pub fn parse_bytes(bytes: &[u8], filename: &str, content_type: Option<&str>) -> SourceResult<ParsedSource> {
    if bytes.is_empty() {
        return Err(SourceError::EmptyFile);
    }
    match SourceFormat::detect(filename, content_type, bytes)? {
        SourceFormat::Delimited => parse_delimited(bytes),
        SourceFormat::Spreadsheet => parse_spreadsheet(bytes),
    }
}

/// Read a file from disk into a raw grid.
pub fn parse_file<P: AsRef<Path>>(path: P) -> SourceResult<ParsedSource> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    parse_bytes(&bytes, name, None)
}

/// Read a previously produced report: row 0 is the header.
pub fn read_table(bytes: &[u8], filename: &str, content_type: Option<&str>) -> SourceResult<Table> {
    let parsed = parse_bytes(bytes, filename, content_type)?;
    let mut table = parsed.with_header(0);
    table.map_column_names(|c| c.trim().to_string());
    Ok(table)
}

/// Parse delimited text with auto-detected encoding and delimiter.
pub fn parse_delimited(bytes: &[u8]) -> SourceResult<ParsedSource> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(Cell::infer).collect::<Vec<_>>());
    }

    let grid = trim_trailing_columns(grid);
    if grid.is_empty() {
        return Err(SourceError::EmptyFile);
    }

    Ok(ParsedSource {
        grid,
        format: SourceFormat::Delimited,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
    })
}

/// Parse the first worksheet of a workbook. The container (XLSX, XLS,
/// XLSB, ODS) is recognized from the bytes, not the file name.
pub fn parse_spreadsheet(bytes: &[u8]) -> SourceResult<ParsedSource> {
    let mut workbook: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| SourceError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceError::Spreadsheet("workbook has no worksheets".into()))?
        .map_err(|e| SourceError::Spreadsheet(e.to_string()))?;

    // calamine ranges start at the first used cell, not at A1
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(data_to_cell));
        grid.push(cells);
    }

    let grid = trim_trailing_columns(grid);
    if grid.is_empty() {
        return Err(SourceError::EmptyFile);
    }

    Ok(ParsedSource {
        grid,
        format: SourceFormat::Spreadsheet,
        encoding: None,
        delimiter: None,
    })
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if dt.as_f64() < 1.0 => Cell::Text(ts.format("%H:%M:%S").to_string()),
            Some(ts) if dt.as_f64().fract() == 0.0 => Cell::Text(ts.format("%Y-%m-%d").to_string()),
            Some(ts) => Cell::Text(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

/// Drop trailing columns that are empty in every row (trailing delimiters,
/// stray formatting in a sheet).
fn trim_trailing_columns(mut grid: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    let used = grid
        .iter()
        .map(|row| {
            row.iter()
                .rposition(|c| !c.is_blank())
                .map(|i| i + 1)
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0);

    for row in &mut grid {
        row.truncate(used);
    }

    while grid.last().is_some_and(|r| r.iter().all(Cell::is_blank)) {
        grid.pop();
    }

    grid
}
