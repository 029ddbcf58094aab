//! Layout detection.
//!
//! Each strategy either locates a header layout in the raw grid or explains
//! why it does not apply. Strategies are tried in order and the first that
//! locates a layout wins; this is not a search for a best match.

use crate::models::{Cell, Table};
use crate::parser::ParsedSource;

use super::layouts::{
    COMMON_COURTESY_HEADER_PROBE, COMMON_COURTESY_HEADER_ROWS, COMMON_COURTESY_MARKER,
    HEADER_ANCHORS, PROVIDER_A_HEADERS, PROVIDER_B_HEADERS, PROVIDER_PROBE_COLUMN,
};

/// Headerless export provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    A,
    B,
}

impl Provider {
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            Provider::A => &PROVIDER_A_HEADERS,
            Provider::B => &PROVIDER_B_HEADERS,
        }
    }

    /// Provider A has text in the probe column, provider B has digits.
    fn classify(probe: &Cell) -> Self {
        if probe.to_text().chars().any(|c| c.is_ascii_digit()) {
            Provider::B
        } else {
            Provider::A
        }
    }
}

/// Layout located in a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Shifted header; `fallback` when no header row matched the probe and
    /// row 0 was used instead.
    CommonCourtesy { header_row: usize, fallback: bool },
    /// Header names in row 0.
    Headered,
    /// No header row; column names come from the provider's fixed list.
    Headerless(Provider),
}

impl Layout {
    pub fn is_common_courtesy(&self) -> bool {
        matches!(self, Layout::CommonCourtesy { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            Layout::CommonCourtesy { header_row, fallback: false } => {
                format!("common courtesy (header row {})", header_row)
            }
            Layout::CommonCourtesy { fallback: true, .. } => {
                "common courtesy (header row not found, using row 0)".to_string()
            }
            Layout::Headered => "headered export".to_string(),
            Layout::Headerless(Provider::A) => "headerless provider A export".to_string(),
            Layout::Headerless(Provider::B) => "headerless provider B export".to_string(),
        }
    }

    /// Build a table from the grid according to this layout.
    pub fn read(&self, source: &ParsedSource) -> Table {
        let mut table = match self {
            Layout::CommonCourtesy { header_row, .. } => source.with_header(*header_row),
            Layout::Headered => source.with_header(0),
            Layout::Headerless(provider) => source.with_columns(provider.headers()),
        };
        table.map_column_names(clean_column_name);
        table
    }
}

/// Strip byte-order-mark artifacts and surrounding whitespace.
pub fn clean_column_name(name: &str) -> String {
    name.replace('\u{feff}', "").trim().to_string()
}

/// One way of locating a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CommonCourtesy,
    Headered,
    Headerless,
}

impl Strategy {
    pub const ORDER: [Strategy; 3] = [Strategy::CommonCourtesy, Strategy::Headered, Strategy::Headerless];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::CommonCourtesy => "common courtesy",
            Strategy::Headered => "headered",
            Strategy::Headerless => "headerless",
        }
    }

    /// Locate a layout, or explain why this strategy does not apply.
    pub fn locate(&self, source: &ParsedSource) -> Result<Layout, String> {
        match self {
            Strategy::CommonCourtesy => locate_common_courtesy(source),
            Strategy::Headered => locate_headered(source),
            Strategy::Headerless => locate_headerless(source),
        }
    }
}

/// Try each strategy in order. On failure, returns every strategy's reason.
pub fn detect_layout(source: &ParsedSource) -> Result<Layout, Vec<String>> {
    let mut attempts = Vec::new();
    for strategy in Strategy::ORDER {
        match strategy.locate(source) {
            Ok(layout) => return Ok(layout),
            Err(reason) => attempts.push(format!("{}: {}", strategy.name(), reason)),
        }
    }
    Err(attempts)
}

fn has_common_courtesy_marker(source: &ParsedSource) -> bool {
    source.cell(0, 1).to_text().contains(COMMON_COURTESY_MARKER)
}

fn locate_common_courtesy(source: &ParsedSource) -> Result<Layout, String> {
    if !has_common_courtesy_marker(source) {
        return Err(format!("no '{}' marker in row 1, column 2", COMMON_COURTESY_MARKER));
    }

    let header_row = COMMON_COURTESY_HEADER_ROWS.into_iter().find(|&idx| {
        source.grid.get(idx).is_some_and(|row| {
            row.iter()
                .any(|c| c.to_text().to_lowercase().contains(COMMON_COURTESY_HEADER_PROBE))
        })
    });

    Ok(match header_row {
        Some(header_row) => Layout::CommonCourtesy { header_row, fallback: false },
        None => Layout::CommonCourtesy { header_row: 0, fallback: true },
    })
}

fn locate_headered(source: &ParsedSource) -> Result<Layout, String> {
    let header: Vec<String> = source
        .grid
        .first()
        .map(|row| row.iter().map(|c| clean_column_name(&c.to_text())).collect())
        .unwrap_or_default();

    if HEADER_ANCHORS.iter().any(|anchor| header.iter().any(|h| h == anchor)) {
        Ok(Layout::Headered)
    } else {
        Err(format!("none of {} in row 1", HEADER_ANCHORS.join(", ")))
    }
}

fn locate_headerless(source: &ParsedSource) -> Result<Layout, String> {
    let first_width = source.grid.first().map(Vec::len).unwrap_or(0);
    if first_width <= PROVIDER_PROBE_COLUMN {
        return Err(format!(
            "first row has {} columns, need at least {}",
            first_width,
            PROVIDER_PROBE_COLUMN + 1
        ));
    }

    let provider = Provider::classify(source.cell(0, PROVIDER_PROBE_COLUMN));
    let expected = provider.headers().len();
    let width = source.width();
    if width > expected {
        return Err(format!(
            "{} columns found, provider {:?} exports have {}",
            width, provider, expected
        ));
    }

    Ok(Layout::Headerless(provider))
}
