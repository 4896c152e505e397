//! Terminal report: the most recent row of a rolled tests series for one
//! grouping key. Rounding here is presentation only and never feeds back
//! into stored values.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::table::Table;

/// Latest-row snapshot for one grouping key.
#[derive(Debug, PartialEq)]
pub struct Latest {
    pub date: NaiveDate,
    pub positive_rate: Option<f64>,
    pub positive_rate_roll: Option<f64>,
}

/// Pull the most recent row out of a rolled tests series.
pub fn latest(tests_rolled: &Table) -> Result<Latest> {
    let date_idx = tests_rolled.column_index("date")?;
    let rate_idx = tests_rolled.column_index("positive_rate")?;
    let roll_idx = tests_rolled.column_index("positive_rate_roll")?;

    let row = tests_rolled
        .rows
        .last()
        .context("no rows for the requested grouping key")?;
    Ok(Latest {
        date: row[date_idx]
            .as_date()
            .context("latest row has a non-date 'date' cell")?,
        positive_rate: row[rate_idx].as_num(),
        positive_rate_roll: row[roll_idx].as_num(),
    })
}

/// Render the snapshot, rates rounded to 4 decimals, unknowns as "n/a".
pub fn render(latest: &Latest) -> String {
    format!(
        "date: {}\npositive_rate: {}\npositive_rate_roll: {}\n",
        latest.date.format("%Y-%m-%d"),
        render_rate(latest.positive_rate),
        render_rate(latest.positive_rate_roll),
    )
}

fn render_rate(rate: Option<f64>) -> String {
    match rate {
        Some(value) => format!("{:.4}", value),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn rolled(rows: &[(u32, Option<f64>, Option<f64>)]) -> Table {
        let mut table = Table::new(vec![
            "date".into(),
            "county".into(),
            "positive_rate".into(),
            "positive_rate_roll".into(),
        ]);
        for (day, rate, roll) in rows {
            let num = |v: &Option<f64>| v.map(Value::Num).unwrap_or(Value::Null);
            table
                .push_row(vec![
                    Value::Date(NaiveDate::from_ymd_opt(2021, 3, *day).unwrap()),
                    Value::Str("Oakland".into()),
                    num(rate),
                    num(roll),
                ])
                .unwrap();
        }
        table
    }

    #[test]
    fn latest_takes_the_last_row() -> Result<()> {
        let table = rolled(&[(14, Some(0.08), None), (15, Some(0.125), Some(0.1))]);
        let snapshot = latest(&table)?;
        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2021, 3, 15).unwrap());
        assert_eq!(snapshot.positive_rate, Some(0.125));
        assert_eq!(snapshot.positive_rate_roll, Some(0.1));
        Ok(())
    }

    #[test]
    fn render_rounds_and_marks_unknowns() {
        let snapshot = Latest {
            date: NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            positive_rate: Some(0.123456),
            positive_rate_roll: None,
        };
        assert_eq!(
            render(&snapshot),
            "date: 2021-03-15\npositive_rate: 0.1235\npositive_rate_roll: n/a\n"
        );
    }

    #[test]
    fn empty_series_is_an_error() {
        let table = rolled(&[]);
        assert!(latest(&table).is_err());
    }
}
