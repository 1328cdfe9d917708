//! Sort definitions.
//!
//! A sort definition is an ordered list of `{prop, dir}` pairs. The table
//! derives a single ascending entry on its identifier column by default and
//! re-derives one whenever the sorted column is hidden.

use crate::types::{cell, Row};
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {}", s)),
        }
    }
}

/// One entry of a sort definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortProp {
    pub prop: String,
    pub dir: SortDirection,
}

impl SortProp {
    pub fn new(prop: impl Into<String>, dir: SortDirection) -> Self {
        SortProp {
            prop: prop.into(),
            dir,
        }
    }
}

/// Ordered sort keys, most significant first
pub type SortDefinition = Vec<SortProp>;

/// Default sort: a single ascending entry on `prop`.
pub fn create_sorting_definition(prop: &str) -> SortDefinition {
    vec![SortProp::new(prop, SortDirection::Asc)]
}

/// Compare two rows under a sort definition.
pub fn compare_rows(a: &Row, b: &Row, sorts: &[SortProp]) -> Ordering {
    for sort in sorts {
        let left = cell(a, &sort.prop).unwrap_or(&CellValue::Null);
        let right = cell(b, &sort.prop).unwrap_or(&CellValue::Null);
        let ord = match sort.dir {
            SortDirection::Asc => left.sort_cmp(right),
            SortDirection::Desc => right.sort_cmp(left),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Stable-sort row indices into `data` by a sort definition.
pub fn sort_indices(indices: &mut [usize], data: &[Row], sorts: &[SortProp]) {
    if sorts.is_empty() {
        return;
    }
    indices.sort_by(|&a, &b| compare_rows(&data[a], &data[b], sorts));
}
