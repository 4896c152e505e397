//! Region aggregation: sum member counties into one synthetic series.
//!
//! Rates are never summed. The aggregator drops rate columns, sums the
//! additive numeric columns per date, tags rows with the region label, and
//! leaves rate re-derivation to the caller as the last step.

use std::collections::{BTreeMap, HashSet};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;

use crate::table::{Table, Value};

/// Named multi-county regions. Membership is fixed configuration, not data.
static REGIONS: Lazy<BTreeMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    BTreeMap::from([
        ("tricounty", &["Oakland", "Wayne", "Macomb"][..]),
        ("west_michigan", &["Kent", "Ottawa", "Muskegon"][..]),
    ])
});

/// What a report label resolves to: one county, or a named region.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    County(String),
    Region {
        label: String,
        members: Vec<String>,
    },
}

impl GroupKey {
    /// The value tagged into the `county` column of the rolled series.
    pub fn label(&self) -> &str {
        match self {
            GroupKey::County(name) => name,
            GroupKey::Region { label, .. } => label,
        }
    }
}

/// Resolve a report label: a known region name, else a literal county name
/// (title-cased) when that county occurs in the data, else a lookup error.
pub fn resolve_group_key(label: &str, known_counties: &HashSet<String>) -> Result<GroupKey> {
    let lowered = label.to_lowercase();
    if let Some(members) = REGIONS.get(lowered.as_str()) {
        return Ok(GroupKey::Region {
            label: lowered,
            members: members.iter().map(|m| m.to_string()).collect(),
        });
    }
    let county = title_case(label);
    if known_counties.contains(&county) {
        return Ok(GroupKey::County(county));
    }
    bail!("'{}' is neither a known region nor a county in the data", label);
}

fn title_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Sum the member counties of `label` into one series, one row per date in
/// ascending date order. `rate_cols` are dropped, never summed; callers
/// re-derive them afterward from the summed numerators and denominators.
pub fn aggregate_region(
    table: &Table,
    members: &[String],
    label: &str,
    rate_cols: &[&str],
) -> Result<Table> {
    let table = table.clone().drop_columns(rate_cols);

    let date_idx = table.column_index("date")?;
    let county_idx = table.column_index("county")?;
    let member_set: HashSet<&str> = members.iter().map(String::as_str).collect();

    // Per-date running sums for every non-key column, None until a number is seen.
    let width = table.headers.len();
    let mut sums: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let county = row[county_idx]
            .as_str()
            .with_context(|| format!("row {} has a non-string county", row_idx))?;
        if !member_set.contains(county) {
            continue;
        }
        let date = row[date_idx]
            .as_date()
            .with_context(|| format!("row {} has a non-date 'date' cell", row_idx))?;
        let acc = sums.entry(date).or_insert_with(|| vec![None; width]);
        for (col, cell) in row.iter().enumerate() {
            if col == date_idx || col == county_idx {
                continue;
            }
            match cell {
                Value::Num(n) => *acc[col].get_or_insert(0.0) += n,
                Value::Null => {}
                other => bail!(
                    "column '{}' holds non-additive value {:?}; cannot sum across counties",
                    table.headers[col],
                    other
                ),
            }
        }
    }

    let mut out = Table::new(table.headers.clone());
    for (date, acc) in sums {
        let row = (0..width)
            .map(|col| {
                if col == date_idx {
                    Value::Date(date)
                } else if col == county_idx {
                    Value::Str(label.to_string())
                } else {
                    match acc[col] {
                        Some(n) => Value::Num(n),
                        None => Value::Null,
                    }
                }
            })
            .collect();
        out.push_row(row)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::derive;

    fn known(counties: &[&str]) -> HashSet<String> {
        counties.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn region_label_resolves_to_members() -> Result<()> {
        let key = resolve_group_key("Tricounty", &known(&["Oakland"]))?;
        match key {
            GroupKey::Region { label, members } => {
                assert_eq!(label, "tricounty");
                assert_eq!(members, vec!["Oakland", "Wayne", "Macomb"]);
            }
            other => panic!("expected region, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn unknown_label_falls_back_to_literal_county() -> Result<()> {
        let key = resolve_group_key("van buren", &known(&["Van Buren", "Kent"]))?;
        assert_eq!(key, GroupKey::County("Van Buren".into()));
        Ok(())
    }

    #[test]
    fn label_matching_nothing_is_a_lookup_error() {
        let err = resolve_group_key("atlantis", &known(&["Kent"])).unwrap_err();
        assert!(err.to_string().contains("atlantis"));
    }

    fn tests_table(rows: &[(&str, u32, f64, f64)]) -> Table {
        let mut table = Table::new(vec![
            "date".into(),
            "county".into(),
            "positive".into(),
            "total".into(),
        ]);
        for (county, day, positive, total) in rows {
            table
                .push_row(vec![
                    Value::Date(NaiveDate::from_ymd_opt(2021, 3, *day).unwrap()),
                    Value::Str(county.to_string()),
                    Value::Num(*positive),
                    Value::Num(*total),
                ])
                .unwrap();
        }
        table
    }

    #[test]
    fn rates_are_summed_then_divided_never_averaged() -> Result<()> {
        // {10/100, 20/200} -> 30/300 = 0.1.
        let table = derive::positive_rate(tests_table(&[
            ("Oakland", 14, 10.0, 100.0),
            ("Wayne", 14, 20.0, 200.0),
        ]))?;
        let region = aggregate_region(
            &table,
            &["Oakland".into(), "Wayne".into()],
            "tricounty",
            &["positive_rate"],
        )?;
        let rederived = derive::positive_rate(region)?;
        let rate = rederived.column_index("positive_rate")?;
        assert_eq!(rederived.rows.len(), 1);
        assert_eq!(rederived.rows[0][rate], Value::Num(0.1));

        // {10/100, 100/200} -> 110/300; a mean of the rates would be 0.3.
        let asymmetric = derive::positive_rate(tests_table(&[
            ("Oakland", 14, 10.0, 100.0),
            ("Wayne", 14, 100.0, 200.0),
        ]))?;
        let region = aggregate_region(
            &asymmetric,
            &["Oakland".into(), "Wayne".into()],
            "tricounty",
            &["positive_rate"],
        )?;
        let rederived = derive::positive_rate(region)?;
        let rate = rederived.column_index("positive_rate")?;
        assert_eq!(rederived.rows[0][rate], Value::Num(110.0 / 300.0));
        Ok(())
    }

    #[test]
    fn rows_are_tagged_and_date_ordered() -> Result<()> {
        let table = tests_table(&[
            ("Wayne", 15, 1.0, 10.0),
            ("Oakland", 14, 2.0, 20.0),
            ("Wayne", 14, 3.0, 30.0),
            ("Oakland", 15, 4.0, 40.0),
        ]);
        let region = aggregate_region(
            &table,
            &["Oakland".into(), "Wayne".into()],
            "tricounty",
            &[],
        )?;
        let county = region.column_index("county")?;
        let date = region.column_index("date")?;
        let total = region.column_index("total")?;

        assert_eq!(region.rows.len(), 2);
        assert_eq!(region.rows[0][county], Value::Str("tricounty".into()));
        assert_eq!(
            region.rows[0][date],
            Value::Date(NaiveDate::from_ymd_opt(2021, 3, 14).unwrap())
        );
        assert_eq!(region.rows[0][total], Value::Num(50.0));
        assert_eq!(region.rows[1][total], Value::Num(50.0));
        Ok(())
    }

    #[test]
    fn non_member_counties_are_excluded() -> Result<()> {
        let table = tests_table(&[("Oakland", 14, 2.0, 20.0), ("Kent", 14, 100.0, 100.0)]);
        let region = aggregate_region(&table, &["Oakland".into()], "solo", &[])?;
        let total = region.column_index("total")?;
        assert_eq!(region.rows[0][total], Value::Num(20.0));
        Ok(())
    }

    #[test]
    fn all_null_contributions_stay_null() -> Result<()> {
        let mut table = tests_table(&[("Oakland", 14, 2.0, 20.0)]);
        table.rows[0][2] = Value::Null;
        let region = aggregate_region(&table, &["Oakland".into()], "solo", &[])?;
        let positive = region.column_index("positive")?;
        assert_eq!(region.rows[0][positive], Value::Null);
        Ok(())
    }
}
