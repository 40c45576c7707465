// src/reshape.rs

//! Long table → one wide table per region, years as columns.

use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate::LongTable;
use crate::enrich::{AgeBucket, Sex};

/// Row identity inside a region's wide table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WideKey {
    pub sex: Sex,
    pub age: AgeBucket,
    pub category: &'static str,
    pub body_region: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    pub region: String,
    /// Shared by every region, ascending.
    pub years: Vec<u16>,
    /// One count per entry of `years`; missing cells are zero.
    pub rows: BTreeMap<WideKey, Vec<u64>>,
}

/// Pivot the long table. Regions come out in ascending order and every table
/// carries the full year range seen anywhere in the input.
pub fn reshape(long: &LongTable) -> Vec<WideTable> {
    let years: Vec<u16> = long.years().into_iter().collect();
    let regions: BTreeSet<&str> = long.regions();

    let mut tables: BTreeMap<&str, WideTable> = regions
        .into_iter()
        .map(|region| {
            (
                region,
                WideTable {
                    region: region.to_string(),
                    years: years.clone(),
                    rows: BTreeMap::new(),
                },
            )
        })
        .collect();

    for (key, count) in long.iter() {
        // both sets were built from this same table
        let (Some(table), Ok(col)) = (tables.get_mut(key.region.as_str()), years.binary_search(&key.year))
        else {
            continue;
        };
        let wide_key = WideKey {
            sex: key.sex,
            age: key.age,
            category: key.category,
            body_region: key.body_region,
        };
        let cells = table
            .rows
            .entry(wide_key)
            .or_insert_with(|| vec![0; years.len()]);
        cells[col] += count;
    }

    tables.into_values().collect()
}
