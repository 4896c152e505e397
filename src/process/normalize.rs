//! Schema normalizer: raw source headers to the canonical schema, raw string
//! cells to typed values.
//!
//! Header rule: lowercase, "." replaced with "_"; explicit overrides (e.g.
//! `MessageDate` -> `date`) win over the rule. The `date` column is parsed to
//! a calendar date and any `updated` audit column is dropped before further
//! processing. A row with an unparseable date or an empty county is a fatal
//! schema error: the whole refresh aborts rather than persist a partial
//! dataset.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

use crate::table::{Table, Value};

const DATE_COLUMN: &str = "date";
const COUNTY_COLUMN: &str = "county";
const UPDATED_COLUMN: &str = "updated";

/// Normalize a raw table: canonical headers, typed cells, `updated` dropped.
pub fn normalize(raw: &Table, overrides: &[(&str, &str)]) -> Result<Table> {
    let headers = canonical_headers(&raw.headers, overrides)?;
    let date_idx = headers
        .iter()
        .position(|h| h == DATE_COLUMN)
        .context("normalized table has no 'date' column")?;
    let county_idx = headers
        .iter()
        .position(|h| h == COUNTY_COLUMN)
        .context("normalized table has no 'county' column")?;

    let mut table = Table::new(headers);
    for (row_idx, row) in raw.rows.iter().enumerate() {
        let typed = row
            .iter()
            .enumerate()
            .map(|(col, cell)| type_cell(cell, col == date_idx, col == county_idx))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("normalizing row {}", row_idx))?;
        table.push_row(typed)?;
    }

    Ok(table.drop_columns(&[UPDATED_COLUMN]))
}

/// Canonical name per raw header: override first, else lowercase with "."
/// transliterated to "_". Duplicate results are a schema error.
fn canonical_headers(raw: &[String], overrides: &[(&str, &str)]) -> Result<Vec<String>> {
    let mut headers = Vec::with_capacity(raw.len());
    for name in raw {
        let canonical = overrides
            .iter()
            .find(|(from, _)| from == name)
            .map(|(_, to)| to.to_string())
            .unwrap_or_else(|| name.to_lowercase().replace('.', "_"));
        if headers.contains(&canonical) {
            bail!("duplicate column '{}' after renaming", canonical);
        }
        headers.push(canonical);
    }
    Ok(headers)
}

fn type_cell(cell: &Value, is_date: bool, is_county: bool) -> Result<Value> {
    // Already-typed cells pass through so normalization is idempotent.
    let text = match cell {
        Value::Str(s) => s.trim(),
        other => return Ok(other.clone()),
    };

    if is_date {
        return Ok(Value::Date(parse_date(text)?));
    }
    if is_county {
        if text.is_empty() {
            bail!("empty county");
        }
        return Ok(Value::Str(text.to_string()));
    }
    if text.is_empty() {
        return Ok(Value::Null);
    }
    match text.parse::<f64>() {
        Ok(n) => Ok(Value::Num(n)),
        Err(_) => Ok(Value::Str(text.to_string())),
    }
}

/// Parse a source date string to a calendar date, discarding any time-of-day.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    if text.is_empty() {
        bail!("empty date");
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Ok(date);
        }
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt.date());
        }
    }
    bail!("unparseable date '{}'", text);
}
