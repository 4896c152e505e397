//! The rollup pipeline: normalize -> derive -> (aggregate) -> roll -> combine.
//!
//! Each stage is a pure table-to-table function; the only state between
//! stages is the table passed along. Dataset-specific knobs (rename
//! overrides, drop lists, rolled columns) live in [`DatasetSpec`] so the same
//! engine runs both datasets.

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::debug;

use crate::table::Table;

pub mod combine;
pub mod derive;
pub mod normalize;
pub mod region;
pub mod rollup;

use region::GroupKey;

/// Everything dataset-specific about one of the two source tables.
pub struct DatasetSpec {
    /// Short name for logs.
    pub name: &'static str,
    /// Link label on the source page ("Public Use Datasets" section).
    pub title: &'static str,
    /// Where the downloaded source file is cached.
    pub raw_path: &'static str,
    /// Where the normalized table is persisted.
    pub cache_path: &'static str,
    /// Where the rolled table is persisted.
    pub roll_path: &'static str,
    /// Raw header -> canonical header overrides.
    pub rename_overrides: &'static [(&'static str, &'static str)],
    /// Non-rollup columns removed before partitioning.
    pub drop_cols: &'static [&'static str],
    /// Columns that gain a `_roll` counterpart.
    pub roll_cols: &'static [&'static str],
    /// Rate columns: re-derived after any summation, never summed.
    pub rate_cols: &'static [&'static str],
    /// Derivation rule run after normalization (and again after aggregation).
    pub derive: Option<fn(Table) -> Result<Table>>,
}

pub static CASES: DatasetSpec = DatasetSpec {
    name: "cases",
    title: "Cases and Deaths by County by Date of Onset of Symptoms and Date of Death",
    raw_path: "data/cases_source.csv",
    cache_path: "cases.csv",
    roll_path: "cases_roll.csv",
    rename_overrides: &[("MessageDate", "date")],
    drop_cols: &["cases_cumulative", "deaths_cumulative"],
    roll_cols: &["cases", "deaths"],
    rate_cols: &[],
    derive: None,
};

pub static TESTS: DatasetSpec = DatasetSpec {
    name: "tests",
    title: "Diagnostic Tests by Result and County",
    raw_path: "data/tests_source.csv",
    cache_path: "tests.csv",
    roll_path: "tests_roll.csv",
    rename_overrides: &[("MessageDate", "date")],
    drop_cols: &["negative"],
    roll_cols: &["positive_rate", "total"],
    rate_cols: &["positive_rate"],
    derive: Some(derive::positive_rate),
};

/// Normalize a raw table under the dataset's rename rules.
pub fn normalized(raw: &Table, spec: &DatasetSpec) -> Result<Table> {
    normalize::normalize(raw, spec.rename_overrides)
        .with_context(|| format!("normalizing {} dataset", spec.name))
}

/// Derive the dataset's rate columns (if any) and roll every county.
pub fn rolled(normalized: Table, spec: &DatasetSpec) -> Result<Table> {
    let table = match spec.derive {
        Some(rule) => rule(normalized)?,
        None => normalized,
    };
    debug!(dataset = spec.name, rows = table.rows.len(), "rolling");
    rollup::roll_by_group(table, spec.roll_cols, spec.drop_cols)
        .with_context(|| format!("rolling {} dataset", spec.name))
}

/// Roll the series for one grouping key: a county's slice of the full rolled
/// table, or a region's synthetic series (summed members, rates re-derived
/// last, then rolled).
pub fn rolled_for_key(normalized: Table, spec: &DatasetSpec, key: &GroupKey) -> Result<Table> {
    match key {
        GroupKey::County(name) => rolled(normalized, spec)?.filter_str_eq("county", name),
        GroupKey::Region { label, members } => {
            let table = match spec.derive {
                Some(rule) => rule(normalized)?,
                None => normalized,
            };
            let summed = region::aggregate_region(&table, members, label, spec.rate_cols)
                .with_context(|| format!("aggregating region '{}'", label))?;
            rolled(summed, spec)
        }
    }
}

/// Distinct county names in a normalized table.
pub fn counties(table: &Table) -> Result<HashSet<String>> {
    let idx = table.column_index("county")?;
    Ok(table
        .rows
        .iter()
        .filter_map(|row| row[idx].as_str().map(str::to_string))
        .collect())
}
