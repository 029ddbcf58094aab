//! Split a report into billing categories.
//!
//! Rows are bucketed by their classification code; each bucket is grouped
//! and subtotalled like a cleaned report. Forsyth rows also carry the
//! co-pay billing fields:
//!
//! | Field                  | Value                                  |
//! |------------------------|----------------------------------------|
//! | Rider Co-Pay           | 5.00                                   |
//! | Post Co-Pay Cost       | fare - co-pay                          |
//! | Forsyth Bill           | post co-pay cost clamped to 0..=8      |
//! | Rider Share over $13   | max(0, fare - 13)                      |
//! | Rider Cost Rider Bill  | co-pay + share over $13                |
//!
//! plus per-rider totals of the bill columns on each rider's last row.

use std::collections::BTreeMap;

use crate::models::{
    round2, Category, Cell, Table, EMAIL_INFO, FARE, FARES_ONLY, INTERNAL_NOTE, LOCAL_AMOUNT,
    PASSENGER_NUMBER, TRANSACTION_AMOUNT, TRANSACTION_TYPE, TRIPS_COUNT,
};

use super::aggregate::{emit_group, Aggregated, Tally, AMOUNT_COLUMNS};
use super::grouper::{person_groups, sort_by_person};

pub const RIDER_CO_PAY: &str = "Rider Co-Pay";
pub const POST_CO_PAY_COST: &str = "Post Co-Pay Cost";
pub const FORSYTH_BILL: &str = "Forsyth Bill";
pub const RIDER_SHARE_OVER_13: &str = "Rider Share over $13";
pub const RIDER_COST_RIDER_BILL: &str = "Rider Cost Rider Bill";
pub const TOTAL_FORSYTH_BILL: &str = "TOTAL Forsyth Bill";
pub const TOTAL_RIDER_COST_RIDER_BILL: &str = "TOTAL Rider Cost Rider Bill";

const CO_PAY: f64 = 5.0;
const BILL_CAP: f64 = 8.0;
const RIDER_SHARE_THRESHOLD: f64 = 13.0;

/// Fare source for the billing fields and the grand total.
pub const FARE_COLUMNS: [&str; 2] = [FARE, FARES_ONLY];

/// Columns removed from every bucket.
const DROPPED_COLUMNS: [&str; 5] = [
    TRANSACTION_TYPE,
    TRANSACTION_AMOUNT,
    PASSENGER_NUMBER,
    EMAIL_INFO,
    TRIPS_COUNT,
];

/// Columns stored as numbers in bucket output.
const NUMERIC_COLUMNS: [&str; 12] = [
    TRANSACTION_AMOUNT,
    LOCAL_AMOUNT,
    FARE,
    FARES_ONLY,
    TRIPS_COUNT,
    RIDER_CO_PAY,
    POST_CO_PAY_COST,
    FORSYTH_BILL,
    RIDER_SHARE_OVER_13,
    RIDER_COST_RIDER_BILL,
    TOTAL_FORSYTH_BILL,
    TOTAL_RIDER_COST_RIDER_BILL,
];

/// Forsyth-only columns, trailing everything else.
pub const FORSYTH_COLUMNS: [&str; 7] = [
    RIDER_CO_PAY,
    POST_CO_PAY_COST,
    FORSYTH_BILL,
    RIDER_SHARE_OVER_13,
    RIDER_COST_RIDER_BILL,
    TOTAL_RIDER_COST_RIDER_BILL,
    TOTAL_FORSYTH_BILL,
];

/// The very last columns of every bucket, in this order.
const END_COLUMNS: [&str; 3] = [INTERNAL_NOTE, TOTAL_FORSYTH_BILL, TOTAL_RIDER_COST_RIDER_BILL];

/// Billing fields for one Forsyth ride.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForsythBilling {
    pub rider_co_pay: f64,
    pub post_co_pay_cost: Option<f64>,
    pub forsyth_bill: Option<f64>,
    pub rider_share_over_13: Option<f64>,
    pub rider_cost_rider_bill: Option<f64>,
}

impl ForsythBilling {
    /// Fields for a fare; everything fare-derived is `None` without one.
    pub fn for_fare(fare: Option<f64>) -> Self {
        let rider_co_pay = CO_PAY;
        let post_co_pay_cost = fare.map(|f| round2(f - rider_co_pay));
        let forsyth_bill = post_co_pay_cost.map(|p| round2(p.clamp(0.0, BILL_CAP)));
        let rider_share_over_13 = fare.map(|f| round2((f - RIDER_SHARE_THRESHOLD).max(0.0)));
        let rider_cost_rider_bill = rider_share_over_13.map(|share| round2(rider_co_pay + share));
        Self {
            rider_co_pay,
            post_co_pay_cost,
            forsyth_bill,
            rider_share_over_13,
            rider_cost_rider_bill,
        }
    }

    fn write(&self, table: &mut Table, row: usize) {
        table.set(row, RIDER_CO_PAY, Cell::Number(self.rider_co_pay));
        table.set(row, POST_CO_PAY_COST, self.post_co_pay_cost.into());
        table.set(row, FORSYTH_BILL, self.forsyth_bill.into());
        table.set(row, RIDER_SHARE_OVER_13, self.rider_share_over_13.into());
        table.set(row, RIDER_COST_RIDER_BILL, self.rider_cost_rider_bill.into());
    }
}

/// Partition rows by category. Rows with a blank code (including the
/// summary rows of a previous report) belong to no bucket. Empty buckets
/// are omitted.
pub fn partition(table: &Table) -> BTreeMap<Category, Table> {
    let mut buckets: BTreeMap<Category, Table> = BTreeMap::new();
    for (idx, row) in table.rows().iter().enumerate() {
        let Some(category) = Category::classify(&table.get(idx, INTERNAL_NOTE).to_text()) else {
            continue;
        };
        buckets
            .entry(category)
            .or_insert_with(|| Table::new(table.columns().iter().cloned()))
            .push_row(row.clone());
    }
    buckets
}

/// Split a report into per-category outputs. Empty when the table has no
/// Internal Note column.
pub fn split_table(table: &Table) -> BTreeMap<Category, Aggregated> {
    if !table.has_column(INTERNAL_NOTE) {
        return BTreeMap::new();
    }
    partition(table)
        .into_iter()
        .map(|(category, bucket)| (category, build_bucket(category, bucket)))
        .collect()
}

fn build_bucket(category: Category, mut bucket: Table) -> Aggregated {
    let data_rows = bucket.len();
    sort_by_person(&mut bucket);

    let is_forsyth = category == Category::Forsyth;
    if is_forsyth {
        let fare_col = bucket.first_present(&FARE_COLUMNS);
        for row in 0..bucket.len() {
            let fare = fare_col.and_then(|c| bucket.get(row, c).as_number());
            ForsythBilling::for_fare(fare).write(&mut bucket, row);
        }
    }

    let amount_col = bucket.first_present(&AMOUNT_COLUMNS).unwrap_or(TRANSACTION_AMOUNT);
    bucket.ensure_column(amount_col);
    bucket.ensure_column(TRIPS_COUNT);

    let groups = person_groups(&bucket);
    let mut out = Table::new(bucket.columns().iter().cloned());
    for range in &groups {
        emit_group(&bucket, range.clone(), amount_col, &mut out);
        if is_forsyth {
            // data rows are followed by the subtotal and spacer rows
            let last_out = out.len() - 3;
            for (bill, total) in [
                (FORSYTH_BILL, TOTAL_FORSYTH_BILL),
                (RIDER_COST_RIDER_BILL, TOTAL_RIDER_COST_RIDER_BILL),
            ] {
                let tally = Tally::of(range.clone().map(|r| bucket.get(r, bill)));
                out.ensure_column(total);
                out.set(last_out, total, Cell::Number(round2(tally.sum)));
            }
        }
    }

    out.drop_columns(&DROPPED_COLUMNS);
    for col in NUMERIC_COLUMNS {
        out.map_column(col, Cell::to_numeric);
    }
    if is_forsyth {
        for col in FORSYTH_COLUMNS {
            out.ensure_column(col);
        }
        out.move_to_end(&FORSYTH_COLUMNS);
    }
    out.move_to_end(&END_COLUMNS);

    let total_column = out.first_present(&FARE_COLUMNS);
    let mut grand_total = 0.0;
    if let Some(col) = total_column {
        grand_total = round2(Tally::of((0..out.len()).map(|r| out.get(r, col))).sum);
        out.push_blank_row();
        let last = out.len() - 1;
        out.set(last, col, Cell::Number(grand_total));
    }

    Aggregated {
        table: out,
        data_rows,
        groups: groups.len(),
        total_column,
        grand_total,
    }
}
