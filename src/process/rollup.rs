//! Group rollup engine: trailing 7-period moving averages per grouping key.
//!
//! Rows are partitioned by the `county` column into one buffer per key, keys
//! ordered by first appearance in the input. Rows inside a partition are taken
//! in input order; callers are responsible for that order being chronological.
//! Each designated column gains a `<source>_roll` column whose value at row
//! `i` is the mean of the trailing 7 rows, `Null` while fewer than 7 rows have
//! been seen or when any input in the window is `Null`. Partitions are
//! concatenated back in first-seen key order.

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::table::{Table, Value};

/// Trailing window length; the "7-day average" of the reports.
pub const WINDOW: usize = 7;

const GROUP_COLUMN: &str = "county";
const UPDATED_COLUMN: &str = "updated";

/// Suffix convention for rolled columns: `cases` -> `cases_roll`.
pub fn rolled_name(source: &str) -> String {
    format!("{}_roll", source)
}

/// Produce a rolled table: `drop_cols` removed, one `<source>_roll` column
/// appended per entry of `roll_cols`.
pub fn roll_by_group(table: Table, roll_cols: &[&str], drop_cols: &[&str]) -> Result<Table> {
    let mut dropped: Vec<&str> = drop_cols.to_vec();
    dropped.push(UPDATED_COLUMN);
    let table = table.drop_columns(&dropped);

    let group_idx = table
        .column_index(GROUP_COLUMN)
        .context("rollup requires a grouping column")?;
    let roll_indices = roll_cols
        .iter()
        .map(|col| table.column_index(col))
        .collect::<Result<Vec<_>>>()
        .context("rollup requires every designated column")?;

    // One partition buffer per key, keyed by first appearance.
    let mut order: Vec<Vec<usize>> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let key = row[group_idx]
            .as_str()
            .with_context(|| format!("row {} has a non-string grouping key", row_idx))?;
        match seen.get(key) {
            Some(&slot) => order[slot].push(row_idx),
            None => {
                seen.insert(key.to_string(), order.len());
                order.push(vec![row_idx]);
            }
        }
    }

    let mut headers = table.headers.clone();
    for col in roll_cols {
        headers.push(rolled_name(col));
    }

    let mut out = Table::new(headers);
    for partition in &order {
        let rolled: Vec<Vec<Value>> = roll_indices
            .iter()
            .map(|&col| {
                let series: Vec<&Value> = partition.iter().map(|&r| &table.rows[r][col]).collect();
                rolling_mean(&series)
            })
            .collect();
        for (pos, &row_idx) in partition.iter().enumerate() {
            let mut row = table.rows[row_idx].clone();
            for col_values in &rolled {
                row.push(col_values[pos].clone());
            }
            out.push_row(row)?;
        }
    }
    Ok(out)
}

/// Trailing simple moving average over one partition's column. `Null` until
/// `WINDOW` rows are available and for any window containing a `Null` input;
/// there is no partial-window fallback.
fn rolling_mean(series: &[&Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        if i + 1 < WINDOW {
            out.push(Value::Null);
            continue;
        }
        let window = &series[i + 1 - WINDOW..=i];
        let mut sum = 0.0;
        let mut complete = true;
        for value in window {
            match value.as_num() {
                Some(n) => sum += n,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        out.push(if complete {
            Value::Num(sum / WINDOW as f64)
        } else {
            Value::Null
        });
    }
    out
}
