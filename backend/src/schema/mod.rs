//! Schema normalizer.
//!
//! Reconciles the known export layouts onto [`CANONICAL_COLUMNS`]:
//!
//! ```text
//! raw grid ─► detect layout ─► read table ─► layout cleanup ─► required check
//!                                                                  │
//!   canonical table ◄─ trim keys ◄─ project ◄─ rename + dedupe ◄─ deny-list
//! ```

pub mod detect;
pub mod layouts;

pub use detect::{detect_layout, Layout, Provider, Strategy};

use serde::Serialize;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{SchemaError, SchemaResult};
use crate::models::{
    Cell, Table, CANONICAL_COLUMNS, EMAIL_INFO, FIRST_NAME, INTERNAL_NOTE, LAST_NAME,
    PASSENGER_NUMBER, TRANSACTION_TYPE,
};
use crate::parser::{ParsedSource, SourceFormat};
use layouts::{
    COLUMN_RENAMES, DENIED_COLUMNS, EMAIL, EXPENSE_MEMO, GUEST_FIRST_NAME, GUEST_LAST_NAME,
    HEADERLESS_RENAMES, REQUESTER_EMAIL, RIDE_STATUS,
};

/// Label used when neither note column is present.
const NOTE_REQUIREMENT: &str = "Internal Note or Expense Memo";

/// A source reconciled onto the canonical schema.
#[derive(Debug, Clone)]
pub struct NormalizedSource {
    pub table: Table,
    pub layout: Layout,
    pub format: SourceFormat,
}

/// Detection summary for `inspect`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    pub layout: String,
    pub format: String,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub row_count: usize,
}

impl NormalizedSource {
    pub fn info(&self, source: &ParsedSource) -> LayoutInfo {
        LayoutInfo {
            layout: self.layout.describe(),
            format: format!("{:?}", self.format),
            encoding: source.encoding.clone(),
            delimiter: source.delimiter,
            row_count: self.table.len(),
        }
    }
}

/// Normalize a raw grid onto the canonical schema.
pub fn normalize(source: &ParsedSource) -> SchemaResult<NormalizedSource> {
    let layout = detect_layout(source).map_err(|attempts| SchemaError::Detection { attempts })?;
    log_success(format!("Detected layout: {}", layout.describe()));
    if let Layout::CommonCourtesy { fallback: true, .. } = layout {
        log_warning("Common courtesy header row not found, reading row 1 as header");
    }

    let mut table = layout.read(source);
    log_info(format!("Source has {} columns, {} rows", table.columns().len(), table.len()));

    match layout {
        Layout::CommonCourtesy { .. } => copy_guest_names(&mut table),
        Layout::Headerless(_) => clean_headerless(&mut table),
        Layout::Headered => {}
    }

    let table = canonicalize(table, &layout)?;
    Ok(NormalizedSource {
        table,
        layout,
        format: source.format,
    })
}

/// Normalize a table that already has column names, e.g. a previous
/// report. A canonical table comes back unchanged.
pub fn normalize_table(table: &Table) -> SchemaResult<Table> {
    let mut table = table.clone();
    table.map_column_names(detect::clean_column_name);
    canonicalize(table, &Layout::Headered)
}

/// Steps shared by every layout once column names are known.
fn canonicalize(mut table: Table, layout: &Layout) -> SchemaResult<Table> {
    swap_guest_identity(&mut table);
    check_required(&table, layout)?;

    if layout.is_common_courtesy() {
        // Email is renamed into Email Info below; the feed's own
        // Transaction Type carries nothing useful.
        let denied: Vec<&str> = DENIED_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != EMAIL)
            .chain(std::iter::once(TRANSACTION_TYPE))
            .collect();
        table.drop_columns(&denied);
    } else {
        table.drop_columns(&DENIED_COLUMNS);
    }

    table.rename_columns(&COLUMN_RENAMES);
    table.dedup_columns();
    table.project(&CANONICAL_COLUMNS);

    for col in [FIRST_NAME, LAST_NAME, PASSENGER_NUMBER] {
        table.map_column(col, |c| Cell::text(c.to_text().trim()));
    }

    Ok(table)
}

/// Common-courtesy feeds name the rider in the guest columns.
fn copy_guest_names(table: &mut Table) {
    for (guest, target) in [(GUEST_FIRST_NAME, FIRST_NAME), (GUEST_LAST_NAME, LAST_NAME)] {
        let Some(src) = table.column_index(guest) else {
            continue;
        };
        let values: Vec<Cell> = table.rows().iter().map(|r| r[src].clone()).collect();
        table.ensure_column(target);
        for (row, value) in values.into_iter().enumerate() {
            table.set(row, target, value);
        }
    }
    table.drop_columns(&[GUEST_FIRST_NAME, GUEST_LAST_NAME]);
}

/// When both identities are present the guest wins.
fn swap_guest_identity(table: &mut Table) {
    let all_present = [FIRST_NAME, LAST_NAME, GUEST_FIRST_NAME, GUEST_LAST_NAME]
        .iter()
        .all(|c| table.has_column(c));
    if all_present {
        table.drop_columns(&[FIRST_NAME, LAST_NAME]);
        table.rename_column(GUEST_FIRST_NAME, FIRST_NAME);
        table.rename_column(GUEST_LAST_NAME, LAST_NAME);
    }
}

/// Fold the provider-specific columns of a headerless export into their
/// canonical names, then keep only canonical columns. Guest names and the
/// local-currency amount must be resolved before the cut.
fn clean_headerless(table: &mut Table) {
    swap_guest_identity(table);
    table.rename_columns(&HEADERLESS_RENAMES);
    table.dedup_columns();
    coalesce_into(table, TRANSACTION_TYPE, &[RIDE_STATUS, TRANSACTION_TYPE]);
    coalesce_into(table, EMAIL_INFO, &[EMAIL, REQUESTER_EMAIL]);
    table.drop_columns(&[RIDE_STATUS, EMAIL, REQUESTER_EMAIL]);
    table.project_present(&CANONICAL_COLUMNS);
}

/// Set `target` to the first non-blank value among `sources`, per row.
/// Does nothing when no source column exists.
fn coalesce_into(table: &mut Table, target: &str, sources: &[&str]) {
    let present: Vec<&str> = sources.iter().copied().filter(|c| table.has_column(c)).collect();
    if present.is_empty() {
        return;
    }
    let values: Vec<Cell> = (0..table.len())
        .map(|row| {
            present
                .iter()
                .map(|c| table.get(row, c))
                .find(|c| !c.is_blank())
                .cloned()
                .unwrap_or_default()
        })
        .collect();
    table.ensure_column(target);
    for (row, value) in values.into_iter().enumerate() {
        table.set(row, target, value);
    }
}

fn check_required(table: &Table, layout: &Layout) -> SchemaResult<()> {
    let mut missing: Vec<String> = [FIRST_NAME, LAST_NAME]
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if !table.has_column(INTERNAL_NOTE) && !table.has_column(EXPENSE_MEMO) {
        missing.push(NOTE_REQUIREMENT.to_string());
    }

    if missing.is_empty() {
        return Ok(());
    }

    match layout {
        Layout::CommonCourtesy { fallback: true, .. } => Err(SchemaError::Detection {
            attempts: vec![format!(
                "common courtesy: header row not found in rows 1, 5 or 6 (missing {})",
                missing.join(", ")
            )],
        }),
        _ => Err(SchemaError::MissingColumns { missing }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DISTANCE, TRANSACTION_AMOUNT};
    use crate::parser::parse_bytes;
    use layouts::{PROVIDER_A_HEADERS, PROVIDER_B_HEADERS};

    fn canonical() -> Vec<String> {
        CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn normalize_csv(csv: &str) -> SchemaResult<NormalizedSource> {
        let parsed = parse_bytes(csv.as_bytes(), "rides.csv", None).unwrap();
        normalize(&parsed)
    }

    fn headerless_row(headers: &[&str], values: &[(&str, &str)]) -> String {
        headers
            .iter()
            .map(|h| {
                values
                    .iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_else(|| "x".to_string())
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn test_headered_export() {
        let csv = "Ride ID,Last Name,First Name,Internal Note,Transaction Amount,Ride Fare,Expense Memo\n\
                   r1, Lee ,Ann,FCC,12.5,10,memo\n";
        let out = normalize_csv(csv).unwrap();
        assert_eq!(out.layout, Layout::Headered);
        assert_eq!(out.table.columns(), canonical().as_slice());
        assert_eq!(out.table.get(0, LAST_NAME), &Cell::Text("Lee".into()));
        // Internal Note comes first, so the renamed memo is deduplicated away
        assert_eq!(out.table.get(0, INTERNAL_NOTE), &Cell::Text("FCC".into()));
        assert_eq!(out.table.get(0, TRANSACTION_AMOUNT), &Cell::Number(12.5));
    }

    #[test]
    fn test_expense_memo_satisfies_note_requirement() {
        let csv = "Passenger Number,First Name,Last Name,Expense Memo,Ride Status\n\
                   5551234567,Ann,Lee,DTF,Completed\n";
        let out = normalize_csv(csv).unwrap();
        assert_eq!(out.table.get(0, INTERNAL_NOTE), &Cell::Text("DTF".into()));
        assert_eq!(out.table.get(0, TRANSACTION_TYPE), &Cell::Text("Completed".into()));
        assert_eq!(out.table.get(0, PASSENGER_NUMBER), &Cell::Text("5551234567".into()));
    }

    #[test]
    fn test_missing_columns_lists_every_absent_column() {
        let csv = "Ride ID,Last Name,Amount\nr1,Lee,4\n";
        match normalize_csv(csv) {
            Err(SchemaError::MissingColumns { missing }) => {
                assert_eq!(missing, vec!["First Name".to_string(), NOTE_REQUIREMENT.to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_guest_identity_wins() {
        let csv = "First Name,Last Name,Guest First Name,Guest Last Name,Internal Note\n\
                   Boss,Person,Ann,Lee,FCC\n";
        let out = normalize_csv(csv).unwrap();
        assert_eq!(out.table.get(0, FIRST_NAME), &Cell::Text("Ann".into()));
        assert_eq!(out.table.get(0, LAST_NAME), &Cell::Text("Lee".into()));
    }

    #[test]
    fn test_common_courtesy_export() {
        let csv = "Report,Common Courtesy Rides\n\
                   Generated,2024-05-01\n\
                   ,\n\
                   ,\n\
                   Trip/Eats ID,Guest First Name,Guest Last Name,Email,Transaction Type,Ride Status,Expense Memo,Transaction Amount in Local Currency (incl. Taxes)\n\
                   t1, Ann ,Lee,ann@example.com,Charge,Completed,FCM,18.25\n";
        let out = normalize_csv(csv).unwrap();
        assert!(out.layout.is_common_courtesy());
        assert_eq!(out.table.columns(), canonical().as_slice());
        let t = &out.table;
        assert_eq!(t.get(0, FIRST_NAME), &Cell::Text("Ann".into()));
        assert_eq!(t.get(0, EMAIL_INFO), &Cell::Text("ann@example.com".into()));
        // source Transaction Type is dropped; Ride Status is renamed into it
        assert_eq!(t.get(0, TRANSACTION_TYPE), &Cell::Text("Completed".into()));
        assert_eq!(t.get(0, INTERNAL_NOTE), &Cell::Text("FCM".into()));
        assert_eq!(t.get(0, TRANSACTION_AMOUNT), &Cell::Number(18.25));
    }

    #[test]
    fn test_common_courtesy_header_on_sixth_row() {
        let csv = "Report,Common Courtesy Rides\n\
                   Generated,2024-05-01\n\
                   ,\n\
                   ,\n\
                   Account,Acme\n\
                   Trip/Eats ID,Guest First Name,Guest Last Name,Expense Memo,Transaction Amount in Local Currency (incl. Taxes)\n\
                   t1,Cy,Dunn,DTF,7\n";
        let out = normalize_csv(csv).unwrap();
        assert_eq!(out.layout, Layout::CommonCourtesy { header_row: 5, fallback: false });
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.get(0, LAST_NAME), &Cell::Text("Dunn".into()));
        assert_eq!(out.table.get(0, INTERNAL_NOTE), &Cell::Text("DTF".into()));
        assert_eq!(out.table.get(0, TRANSACTION_AMOUNT), &Cell::Number(7.0));
    }

    #[test]
    fn test_common_courtesy_xlsx_upload() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Report").unwrap();
        sheet.write_string(0, 1, "Common Courtesy Rides").unwrap();
        let header = [
            "Trip/Eats ID",
            "Guest First Name",
            "Guest Last Name",
            "Email",
            "Expense Memo",
            "Transaction Amount in Local Currency (incl. Taxes)",
        ];
        for (col, name) in header.iter().enumerate() {
            sheet.write_string(4, col as u16, *name).unwrap();
        }
        for (col, value) in ["t1", "Ann", "Lee", "ann@example.com", "FCSH"].iter().enumerate() {
            sheet.write_string(5, col as u16, *value).unwrap();
        }
        sheet.write_number(5, 5, 31.4).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = parse_bytes(&bytes, "rides.xlsx", None).unwrap();
        let out = normalize(&parsed).unwrap();
        assert_eq!(out.layout, Layout::CommonCourtesy { header_row: 4, fallback: false });
        assert_eq!(out.format, SourceFormat::Spreadsheet);
        assert_eq!(out.table.columns(), canonical().as_slice());
        let t = &out.table;
        assert_eq!(t.get(0, FIRST_NAME), &Cell::Text("Ann".into()));
        assert_eq!(t.get(0, EMAIL_INFO), &Cell::Text("ann@example.com".into()));
        assert_eq!(t.get(0, INTERNAL_NOTE), &Cell::Text("FCSH".into()));
        assert_eq!(t.get(0, TRANSACTION_AMOUNT), &Cell::Number(31.4));
    }

    #[test]
    fn test_common_courtesy_fallback_fails_as_detection() {
        let csv = "a,Common Courtesy\nb,c\n";
        assert!(matches!(normalize_csv(csv), Err(SchemaError::Detection { .. })));
    }

    #[test]
    fn test_headerless_provider_a() {
        let row = headerless_row(
            &PROVIDER_A_HEADERS,
            &[
                ("Request Type", "Standard"),
                ("First Name", "Ann"),
                ("Last Name", "Lee"),
                ("Email", ""),
                ("Ride Status", "Completed"),
                ("Transaction Type", "Charge"),
                ("Internal Note", "FCSC"),
                ("Distance (mi)", "3.2"),
                ("Transaction Amount in Local Currency (incl. Taxes)", "9.75"),
                ("Passenger Number", "5551234567"),
            ],
        );
        let out = normalize_csv(&row).unwrap();
        assert_eq!(out.layout, Layout::Headerless(Provider::A));
        assert_eq!(out.table.columns(), canonical().as_slice());
        let t = &out.table;
        assert_eq!(t.get(0, TRANSACTION_TYPE), &Cell::Text("Completed".into()));
        assert_eq!(t.get(0, DISTANCE), &Cell::Number(3.2));
        assert!(t.get(0, EMAIL_INFO).is_empty());
        assert_eq!(t.get(0, TRANSACTION_AMOUNT), &Cell::Number(9.75));
    }

    #[test]
    fn test_headerless_guest_names_win() {
        let row = headerless_row(
            &PROVIDER_A_HEADERS,
            &[
                ("Request Type", "Standard"),
                ("First Name", "Boss"),
                ("Last Name", "Account"),
                ("Guest First Name", " Ann "),
                ("Guest Last Name", "Rider"),
                ("Internal Note", "FCC"),
                ("Transaction Amount in Local Currency (incl. Taxes)", "12.50"),
            ],
        );
        let out = normalize_csv(&row).unwrap();
        assert_eq!(out.layout, Layout::Headerless(Provider::A));
        let t = &out.table;
        assert_eq!(t.get(0, FIRST_NAME), &Cell::Text("Ann".into()));
        assert_eq!(t.get(0, LAST_NAME), &Cell::Text("Rider".into()));
        assert_eq!(t.get(0, TRANSACTION_AMOUNT), &Cell::Number(12.5));
    }

    #[test]
    fn test_headerless_provider_b_email_fallback() {
        let row = headerless_row(
            &PROVIDER_B_HEADERS,
            &[
                ("Drop-off Date (UTC)", "2024-03-01"),
                ("First Name", "Bo"),
                ("Last Name", "Ray"),
                ("Email", ""),
                ("Requester Email", "desk@example.com"),
                ("Transaction Type", "Ride"),
                ("Internal Note", "DTF"),
                ("Transaction Amount", "22"),
            ],
        );
        let out = normalize_csv(&row).unwrap();
        assert_eq!(out.layout, Layout::Headerless(Provider::B));
        let t = &out.table;
        assert_eq!(t.get(0, EMAIL_INFO), &Cell::Text("desk@example.com".into()));
        assert_eq!(t.get(0, TRANSACTION_TYPE), &Cell::Text("Ride".into()));
        assert_eq!(t.get(0, TRANSACTION_AMOUNT), &Cell::Number(22.0));
    }

    #[test]
    fn test_renormalizing_is_a_no_op() {
        let csv = "Ride ID,Last Name,First Name,Internal Note,Transaction Amount,Passenger Number\n\
                   r1,Lee,Ann,FCC,12.5,555\nr2,Ray,Bo,,3,556\n";
        let first = normalize_csv(csv).unwrap().table;
        let again = normalize_table(&first).unwrap();
        assert_eq!(first, again);

        let regrid = ParsedSource {
            grid: first.to_grid(),
            format: SourceFormat::Spreadsheet,
            encoding: None,
            delimiter: None,
        };
        assert_eq!(normalize(&regrid).unwrap().table, first);
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let a = "First Name,Last Name,Internal Note,Passenger Number\nAnn,Lee,FCC,1\n";
        let b = "Internal Note,Passenger Number,Last Name,First Name\nFCC,1,Lee,Ann\n";
        assert_eq!(normalize_csv(a).unwrap().table, normalize_csv(b).unwrap().table);
    }
}
