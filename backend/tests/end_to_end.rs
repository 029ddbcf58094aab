//! Whole-pipeline checks: files on disk in, workbooks on disk out, read
//! back with calamine.

use std::fs;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use ridefare::{
    merge, normalize_and_aggregate, split_source, Category, PipelineError, SourceFile,
};
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

const HEADER: &str = "Pickup Date (Local),First Name,Last Name,Internal Note,Transaction Amount,Passenger Number";

/// A read-back worksheet, addressed by header name.
struct Sheet {
    header: Vec<String>,
    rows: Vec<Vec<Data>>,
}

impl Sheet {
    fn open(path: &Path, name: &str) -> Self {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let range = workbook.worksheet_range(name).unwrap();
        assert_eq!(range.start(), Some((0, 0)));

        let mut rows = range.rows().map(|r| r.to_vec());
        let header = rows
            .next()
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect();
        Self {
            header,
            rows: rows.collect(),
        }
    }

    fn col(&self, name: &str) -> usize {
        self.header
            .iter()
            .position(|h| h == name)
            .unwrap_or_else(|| panic!("no column {name} in {:?}", self.header))
    }

    fn value(&self, row: usize, name: &str) -> &Data {
        self.rows[row].get(self.col(name)).unwrap_or(&Data::Empty)
    }

    fn number(&self, row: usize, name: &str) -> f64 {
        match self.value(row, name) {
            Data::Float(f) => *f,
            Data::Int(i) => *i as f64,
            other => panic!("row {row} {name}: expected a number, got {other:?}"),
        }
    }

    fn is_blank(&self, row: usize, name: &str) -> bool {
        matches!(self.value(row, name), Data::Empty)
            || matches!(self.value(row, name), Data::String(s) if s.is_empty())
    }
}

fn write_csv(dir: &Path, name: &str, rows: &[&str]) -> SourceFile {
    let path = dir.join(name);
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    fs::write(&path, body).unwrap();
    SourceFile::from_path(&path).unwrap()
}

#[test]
fn clean_csv_groups_and_totals() {
    let dir = tempdir().unwrap();
    let source = write_csv(
        dir.path(),
        "rides.csv",
        &[
            "2024-05-01,Ann,Lee,FCC,10,555",
            "2024-05-02,Bo,Ray,,99,556",
            "2024-05-03,Ann,Lee,FCC,15,555",
        ],
    );

    let report = normalize_and_aggregate(&source).unwrap();
    assert_eq!(report.summary.data_rows, 2);
    assert_eq!(report.summary.groups, 1);
    assert_eq!(report.summary.grand_total, 25.0);

    let out = dir.path().join("cleaned_report.xlsx");
    fs::write(&out, &report.workbook).unwrap();
    let sheet = Sheet::open(&out, "CleanedData");

    assert_eq!(sheet.header.last().map(String::as_str), Some("Fares Only"));
    assert!(sheet.header.iter().any(|h| h == "Trips Count"));

    // two rides, subtotal, spacer, grand total
    assert_eq!(sheet.number(0, "Fares Only"), 10.0);
    assert_eq!(sheet.number(1, "Fares Only"), 15.0);
    assert_eq!(sheet.number(0, "Trips Count"), 1.0);
    assert_eq!(sheet.number(2, "Transaction Amount"), 25.0);
    assert_eq!(sheet.number(2, "Trips Count"), 2.0);
    assert!(sheet.is_blank(2, "Internal Note"));
    assert_eq!(sheet.number(4, "Fares Only"), 25.0);
}

#[test]
fn clean_xlsx_upload() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in ["First Name", "Last Name", "Internal Note", "Transaction Amount"]
        .iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    let rides = [("Cy", "Dunn", "DTF", 12.5), ("Ann", "Lee", "FCM", 7.25)];
    for (i, (first, last, note, amount)) in rides.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *first).unwrap();
        sheet.write_string(row, 1, *last).unwrap();
        sheet.write_string(row, 2, *note).unwrap();
        sheet.write_number(row, 3, *amount).unwrap();
    }
    let bytes = workbook.save_to_buffer().unwrap();

    let report = normalize_and_aggregate(&SourceFile::new(bytes, "rides.xlsx", None)).unwrap();
    assert_eq!(report.summary.data_rows, 2);
    assert_eq!(report.summary.groups, 2);
    assert_eq!(report.summary.grand_total, 19.75);
}

#[test]
fn merge_orders_riders_across_files() {
    let dir = tempdir().unwrap();
    let a = write_csv(dir.path(), "a.csv", &["2024-05-01,Bo,Ray,FCM,4,556"]);
    let b = write_csv(
        dir.path(),
        "b.csv",
        &["2024-05-02,Ann,Lee,DTF,20,555", "2024-05-03,Ann,Lee,FCSH,6.5,555"],
    );

    let report = merge(&a, &b).unwrap();
    assert_eq!(report.summary.groups, 2);
    assert_eq!(report.summary.grand_total, 30.5);

    let out = dir.path().join("merged_report.xlsx");
    fs::write(&out, &report.workbook).unwrap();
    let sheet = Sheet::open(&out, "CleanedData");

    // Lee (2 rides) sorts before Ray
    assert_eq!(sheet.value(0, "Last Name"), &Data::String("Lee".into()));
    assert_eq!(sheet.value(1, "Last Name"), &Data::String("Lee".into()));
    assert_eq!(sheet.number(2, "Transaction Amount"), 26.5);
    assert_eq!(sheet.value(4, "Last Name"), &Data::String("Ray".into()));
    assert_eq!(sheet.number(5, "Transaction Amount"), 4.0);
    assert_eq!(sheet.number(7, "Fares Only"), 30.5);
}

#[test]
fn split_merged_report_into_category_files() {
    let dir = tempdir().unwrap();
    let a = write_csv(dir.path(), "a.csv", &["2024-05-01,Bo,Ray,FCM,4,556"]);
    let b = write_csv(
        dir.path(),
        "b.csv",
        &["2024-05-02,Ann,Lee,DTF,20,555", "2024-05-03,Cy,Dunn,XYZ,9,557"],
    );
    let merged_path = dir.path().join("merged_report.xlsx");
    fs::write(&merged_path, merge(&a, &b).unwrap().workbook).unwrap();

    let reports = split_source(&SourceFile::from_path(&merged_path).unwrap()).unwrap();
    assert_eq!(
        reports.keys().copied().collect::<Vec<_>>(),
        vec![Category::Forsyth, Category::Fulton, Category::Other]
    );

    for (category, report) in &reports {
        fs::write(dir.path().join(format!("{category}.xlsx")), &report.workbook).unwrap();
    }
    assert!(dir.path().join("Other_report.xlsx").exists());

    let forsyth = Sheet::open(&dir.path().join("Forsyth.xlsx"), "Sheet1");
    assert!(!forsyth.header.iter().any(|h| h == "Trips Count"));
    assert_eq!(
        &forsyth.header[forsyth.header.len() - 3..],
        ["Internal Note", "TOTAL Forsyth Bill", "TOTAL Rider Cost Rider Bill"]
    );
    assert_eq!(forsyth.number(0, "Rider Co-Pay"), 5.0);
    assert_eq!(forsyth.number(0, "Post Co-Pay Cost"), 15.0);
    assert_eq!(forsyth.number(0, "Forsyth Bill"), 8.0);
    assert_eq!(forsyth.number(0, "Rider Share over $13"), 7.0);
    assert_eq!(forsyth.number(0, "Rider Cost Rider Bill"), 12.0);
    assert_eq!(forsyth.number(0, "TOTAL Forsyth Bill"), 8.0);
    assert_eq!(forsyth.number(0, "TOTAL Rider Cost Rider Bill"), 12.0);

    let fulton = Sheet::open(&dir.path().join("Fulton.xlsx"), "Sheet1");
    assert!(!fulton.header.iter().any(|h| h == "Rider Co-Pay"));
    assert_eq!(fulton.number(0, "Fares Only"), 4.0);
    assert_eq!(reports[&Category::Fulton].summary.grand_total, 4.0);
}

#[test]
fn unclassified_export_is_rejected() {
    let dir = tempdir().unwrap();
    let source = write_csv(dir.path(), "rides.csv", &["2024-05-01,Ann,Lee,,10,555"]);
    assert!(matches!(
        normalize_and_aggregate(&source),
        Err(PipelineError::NoClassifiedRows)
    ));
}
