//! Combiner: inner-join a cases rolled series and a tests rolled series on
//! date into the fixed combined-report schema.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::table::{Table, Value};

/// The combined report's column set, in output order.
pub const REPORT_COLUMNS: [&str; 5] = [
    "date",
    "cases_roll",
    "deaths_roll",
    "total_roll",
    "positive_rate_roll",
];

/// Join two rolled series (each already reduced to one grouping key) on
/// `date`. Dates present on only one side are dropped; the reporting use case
/// only cares about dates with full data.
pub fn combine(cases: &Table, tests: &Table) -> Result<Table> {
    let cases_date = cases.column_index("date").context("cases series")?;
    let cases_roll = cases.column_index("cases_roll").context("cases series")?;
    let deaths_roll = cases.column_index("deaths_roll").context("cases series")?;
    let tests_date = tests.column_index("date").context("tests series")?;
    let total_roll = tests.column_index("total_roll").context("tests series")?;
    let rate_roll = tests
        .column_index("positive_rate_roll")
        .context("tests series")?;

    let mut by_date: HashMap<NaiveDate, usize> = HashMap::with_capacity(tests.rows.len());
    for (idx, row) in tests.rows.iter().enumerate() {
        if let Some(date) = row[tests_date].as_date() {
            by_date.entry(date).or_insert(idx);
        }
    }

    let mut out = Table::new(REPORT_COLUMNS.iter().map(|c| c.to_string()).collect());
    for row in &cases.rows {
        let date = row[cases_date]
            .as_date()
            .context("cases series has a non-date 'date' cell")?;
        let Some(&tests_idx) = by_date.get(&date) else {
            continue;
        };
        out.push_row(vec![
            Value::Date(date),
            row[cases_roll].clone(),
            row[deaths_roll].clone(),
            tests.rows[tests_idx][total_roll].clone(),
            tests.rows[tests_idx][rate_roll].clone(),
        ])?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    fn cases_side(days: &[u32]) -> Table {
        let mut t = Table::new(vec![
            "date".into(),
            "county".into(),
            "cases_roll".into(),
            "deaths_roll".into(),
        ]);
        for &d in days {
            t.push_row(vec![
                Value::Date(day(d)),
                Value::Str("Oakland".into()),
                Value::Num(d as f64),
                Value::Num(0.5),
            ])
            .unwrap();
        }
        t
    }

    fn tests_side(days: &[u32]) -> Table {
        let mut t = Table::new(vec![
            "date".into(),
            "county".into(),
            "total_roll".into(),
            "positive_rate_roll".into(),
        ]);
        for &d in days {
            t.push_row(vec![
                Value::Date(day(d)),
                Value::Str("Oakland".into()),
                Value::Num(100.0),
                Value::Num(0.1),
            ])
            .unwrap();
        }
        t
    }

    #[test]
    fn joins_on_date_with_fixed_schema() -> Result<()> {
        let combined = combine(&cases_side(&[14, 15]), &tests_side(&[14, 15]))?;
        assert_eq!(combined.headers, REPORT_COLUMNS);
        assert_eq!(combined.rows.len(), 2);
        assert_eq!(combined.rows[0][1], Value::Num(14.0));
        assert_eq!(combined.rows[0][3], Value::Num(100.0));
        Ok(())
    }

    #[test]
    fn dates_missing_from_either_side_are_dropped() -> Result<()> {
        // 16 only on the cases side, 13 only on the tests side.
        let combined = combine(&cases_side(&[14, 15, 16]), &tests_side(&[13, 14, 15]))?;
        let dates: Vec<NaiveDate> = combined
            .rows
            .iter()
            .map(|r| r[0].as_date().unwrap())
            .collect();
        assert_eq!(dates, vec![day(14), day(15)]);
        Ok(())
    }

    #[test]
    fn null_rolling_values_pass_through() -> Result<()> {
        let mut cases = cases_side(&[14]);
        cases.rows[0][2] = Value::Null;
        let combined = combine(&cases, &tests_side(&[14]))?;
        assert_eq!(combined.rows[0][1], Value::Null);
        Ok(())
    }
}
