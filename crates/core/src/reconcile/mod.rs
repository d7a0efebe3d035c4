//! Row normalization and consolidation grouping.
//!
//! The bulk-import pipeline runs in two pure stages before anything touches
//! the database: each raw ledger row is normalized into a typed entry (or a
//! structured row error), and surviving entries are grouped by
//! (taxpayer id, period start, period end, note) into the aggregates that
//! become one reconciliation document each.

pub mod error;
pub mod grouping;
pub mod normalizer;
pub mod types;

pub use error::ReconcileError;
pub use grouping::{GroupTotals, group_entries};
pub use normalizer::normalize_row;
pub use types::{EntryGroup, GroupKey, NormalizedEntry, RawRow, RowError, RowErrorKind};

#[cfg(test)]
mod pipeline_tests {
    //! End-to-end runs of the pure pipeline: normalize every row, collect
    //! failures, group the survivors.

    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    fn raw(taxpayer: &str, code: &str, amount: Value, note: &str) -> RawRow {
        RawRow {
            taxpayer_id: Some(json!(taxpayer)),
            subaccount_code: Some(json!(code)),
            subaccount_name: None,
            period_start: Some(json!("2025-10-01")),
            period_end: Some(json!("2025-10-25")),
            amount: Some(amount),
            note: Some(json!(note)),
        }
    }

    fn run_pipeline(rows: &[RawRow]) -> (Vec<EntryGroup>, Vec<RowError>) {
        let mut errors = Vec::new();
        let mut entries = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            match normalize_row(index + 1, row) {
                Ok(entry) => entries.push(entry),
                Err(e) => errors.push(e),
            }
        }
        (group_entries(entries), errors)
    }

    #[test]
    fn test_two_shared_key_rows_and_one_independent_yield_two_documents() {
        // Two rows share (taxpayer, period, note); the third stands alone.
        let rows = vec![
            raw("1234567890", "BR-001", json!("150000.00"), "October"),
            raw("1234567890", "BR-002", json!("150000.00"), "October"),
            raw("5555555555", "DL-100", json!("-2500.75"), "October"),
        ];

        let (groups, errors) = run_pipeline(&rows);
        assert!(errors.is_empty());
        assert_eq!(groups.len(), 2);

        let first = &groups[0];
        assert_eq!(first.key.taxpayer_id, "1234567890");
        assert_eq!(first.line_count(), 2);
        let totals = first.totals();
        assert_eq!(totals.debit, dec!(300000.00));
        assert_eq!(totals.credit, dec!(0));
        assert_eq!(totals.net_balance, dec!(300000.00));

        let second = &groups[1];
        assert_eq!(second.key.taxpayer_id, "5555555555");
        assert_eq!(second.line_count(), 1);
        let totals = second.totals();
        assert_eq!(totals.debit, dec!(0));
        assert_eq!(totals.credit, dec!(2500.75));
        assert_eq!(totals.net_balance, dec!(-2500.75));
    }

    #[test]
    fn test_bad_middle_row_is_reported_and_neighbors_survive() {
        // Row 2 has a non-numeric amount; rows 1 and 3 still form groups.
        let rows = vec![
            raw("1234567890", "BR-001", json!("100.00"), "October"),
            raw("1234567890", "BR-002", json!("oops"), "October"),
            raw("5555555555", "DL-100", json!("200.00"), "October"),
        ];

        let (groups, errors) = run_pipeline(&rows);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 2);
        assert!(matches!(errors[0].reason, RowErrorKind::InvalidAmount(_)));

        assert_eq!(groups.len(), 2);
        let grouped_rows: usize = groups.iter().map(EntryGroup::line_count).sum();
        assert_eq!(grouped_rows, 2);
    }

    #[test]
    fn test_every_row_lands_exactly_once() {
        let rows = vec![
            raw("1111111111", "A", json!("1"), ""),
            raw("", "B", json!("2"), ""),
            raw("1111111111", "C", json!("x"), ""),
            raw("2222222222", "D", json!("4"), ""),
        ];

        let (groups, errors) = run_pipeline(&rows);
        let grouped: usize = groups.iter().map(EntryGroup::line_count).sum();
        assert_eq!(grouped + errors.len(), rows.len());
    }
}
