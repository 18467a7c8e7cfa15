//! Missing-value and duplicate removal for measurement tables.

use crate::constants::{MISSING_VALUE_SENTINELS, is_missing_sentinel};
use crate::models::MeasurementTable;
use std::collections::HashSet;
use tracing::debug;

/// Clean a table with the default sentinel set `{9999.9, 999}`
pub fn clean(table: &MeasurementTable) -> MeasurementTable {
    clean_with_sentinels(table, MISSING_VALUE_SENTINELS)
}

/// Drop rows containing any sentinel value, then exact duplicate rows.
///
/// Sentinel matching uses exact equality. The first occurrence of a
/// duplicated row is kept and row order is preserved, so cleaning a clean
/// table returns an identical table.
pub fn clean_with_sentinels(table: &MeasurementTable, sentinels: &[f64]) -> MeasurementTable {
    let mut seen: HashSet<Vec<u64>> = HashSet::with_capacity(table.len());
    let mut sentinel_rows = 0usize;
    let mut duplicate_rows = 0usize;

    let rows: Vec<Vec<f64>> = table
        .rows()
        .iter()
        .filter(|row| {
            if row.iter().any(|v| is_missing_sentinel(*v, sentinels)) {
                sentinel_rows += 1;
                return false;
            }
            if !seen.insert(row_key(row)) {
                duplicate_rows += 1;
                return false;
            }
            true
        })
        .cloned()
        .collect();

    debug!(
        "Cleaning removed {} sentinel rows and {} duplicate rows, {} remaining",
        sentinel_rows,
        duplicate_rows,
        rows.len()
    );

    MeasurementTable::new(table.headers().to_vec(), rows)
}

/// Hashable identity of a row; `-0.0` and `0.0` compare equal
fn row_key(row: &[f64]) -> Vec<u64> {
    row.iter()
        .map(|v| if *v == 0.0 { 0 } else { v.to_bits() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<f64>>) -> MeasurementTable {
        MeasurementTable::new(vec!["Height".to_string(), "Temp".to_string()], rows)
    }

    #[test]
    fn test_sentinel_rows_are_dropped() {
        let raw = table(vec![
            vec![100.0, 15.0],
            vec![9999.9, 999.0],
            vec![200.0, 14.0],
        ]);
        let cleaned = clean(&raw);

        assert_eq!(cleaned.rows(), [vec![100.0, 15.0], vec![200.0, 14.0]]);
        // Input is left untouched
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn test_sentinel_in_any_column_drops_row() {
        let raw = table(vec![
            vec![100.0, 999.0],
            vec![9999.9, 10.0],
            vec![300.0, 12.0],
        ]);
        assert_eq!(clean(&raw).rows(), [vec![300.0, 12.0]]);
    }

    #[test]
    fn test_near_sentinel_values_are_kept() {
        let raw = table(vec![vec![9999.8, 999.5], vec![999.01, 1.0]]);
        assert_eq!(clean(&raw).len(), 2);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence_in_order() {
        let raw = table(vec![
            vec![100.0, 15.0],
            vec![200.0, 14.0],
            vec![100.0, 15.0],
            vec![300.0, 13.0],
            vec![200.0, 14.0],
        ]);
        let cleaned = clean(&raw);

        assert_eq!(
            cleaned.rows(),
            [vec![100.0, 15.0], vec![200.0, 14.0], vec![300.0, 13.0]]
        );
    }

    #[test]
    fn test_partial_duplicates_are_not_removed() {
        let raw = table(vec![vec![100.0, 15.0], vec![100.0, 14.0]]);
        assert_eq!(clean(&raw).len(), 2);
    }

    #[test]
    fn test_signed_zero_rows_are_duplicates() {
        let raw = table(vec![vec![0.0, 1.0], vec![-0.0, 1.0]]);
        assert_eq!(clean(&raw).len(), 1);
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let raw = table(vec![
            vec![100.0, 15.0],
            vec![100.0, 15.0],
            vec![9999.9, 2.0],
            vec![150.0, 14.5],
            vec![200.0, 999.0],
            vec![150.0, 14.5],
        ]);
        let once = clean(&raw);
        let twice = clean(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_custom_sentinels() {
        let raw = table(vec![vec![100.0, -99.0], vec![200.0, 14.0]]);
        let cleaned = clean_with_sentinels(&raw, &[-99.0]);
        assert_eq!(cleaned.rows(), [vec![200.0, 14.0]]);
    }

    #[test]
    fn test_everything_removed_yields_empty_table() {
        let raw = table(vec![vec![9999.9, 999.0]]);
        let cleaned = clean(&raw);
        assert!(cleaned.is_empty());
        assert_eq!(cleaned.headers(), raw.headers());
    }
}
