//! Filter, sort and group normalized rows by rider.
//!
//! # Architecture
//!
//! ```text
//! normalized rows          sorted rows             groups
//! ┌──────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ Ray  Bo   FCC    │     │ Lee  Ann  FCC   │     │ Lee Ann: [0, 1] │
//! │ Lee  Ann  FCC    │  →  │ Lee  Ann  DTF   │  →  ├─────────────────┤
//! │ Lee  Ann  DTF    │     │ Ray  Bo   FCC   │     │ Ray Bo:  [2]    │
//! │ Kim  Jo   (none) │     └─────────────────┘     └─────────────────┘
//! └──────────────────┘
//! ```
//!
//! Groups are maximal runs of adjacent rows with equal [`PersonKey`]s, so
//! they are only meaningful on input sorted with [`sort_by_person`].

use std::ops::Range;

use crate::models::{compare_key_cells, PersonKey, Table, FIRST_NAME, INTERNAL_NOTE, LAST_NAME, PASSENGER_NUMBER};

/// Keep rows whose Internal Note is non-blank.
pub fn retain_classified(table: &mut Table) {
    table.retain_rows(|t, row| !t.get(row, INTERNAL_NOTE).is_blank());
}

/// Stable sort by (Last Name, First Name, Passenger Number).
pub fn sort_by_person(table: &mut Table) {
    table.sort_rows_by(|t, a, b| {
        [LAST_NAME, FIRST_NAME, PASSENGER_NUMBER]
            .iter()
            .map(|col| compare_key_cells(t.get(a, col), t.get(b, col)))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Row ranges of each rider, in order.
pub fn person_groups(table: &Table) -> Vec<Range<usize>> {
    Runs::new((0..table.len()).map(|row| PersonKey::of(table, row))).collect()
}

/// Iterator over maximal runs of equal consecutive items, yielding the index
/// range of each run.
pub struct Runs<I: Iterator> {
    iter: std::iter::Peekable<std::iter::Enumerate<I>>,
}

impl<I: Iterator> Runs<I> {
    pub fn new(iter: I) -> Self {
        Self {
            iter: iter.enumerate().peekable(),
        }
    }
}

impl<I> Iterator for Runs<I>
where
    I: Iterator,
    I::Item: PartialEq,
{
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, key) = self.iter.next()?;
        let mut end = start + 1;
        while let Some((idx, _)) = self.iter.next_if(|(_, next)| *next == key) {
            end = idx + 1;
        }
        Some(start..end)
    }
}
