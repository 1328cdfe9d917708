//! The filter pass.
//!
//! Applies a compiled [`SearchQuery`] to a full dataset and yields the
//! indices of the visible rows, in dataset order. The dataset itself is never
//! modified.
//!
//! ## Performance
//!
//! Large datasets are filtered with Rayon once they exceed the configured
//! threshold; the result order is the same either way.

use crate::search::SearchQuery;
use crate::types::{Column, Row};
use rayon::prelude::*;

/// Indices of all rows (the unfiltered view)
pub fn all_rows(data: &[Row]) -> Vec<usize> {
    (0..data.len()).collect()
}

/// Indices of the rows matching every token of `query`.
///
/// `parallel_threshold` enables the parallel path for datasets larger than
/// the given row count.
pub fn filter_rows(
    data: &[Row],
    query: &SearchQuery,
    columns: &[Column],
    parallel_threshold: Option<usize>,
) -> Vec<usize> {
    if query.matches_all() {
        return all_rows(data);
    }

    match parallel_threshold {
        Some(threshold) if data.len() > threshold => filter_parallel(data, query, columns),
        _ => filter_sequential(data, query, columns),
    }
}

fn filter_sequential(data: &[Row], query: &SearchQuery, columns: &[Column]) -> Vec<usize> {
    data.iter()
        .enumerate()
        .filter(|(_, row)| query.matches(row, columns))
        .map(|(i, _)| i)
        .collect()
}

fn filter_parallel(data: &[Row], query: &SearchQuery, columns: &[Column]) -> Vec<usize> {
    data.par_iter()
        .enumerate()
        .filter(|(_, row)| query.matches(row, columns))
        .map(|(i, _)| i)
        .collect()
}
