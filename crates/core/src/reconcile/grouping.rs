//! Consolidation grouping and aggregation.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::reconcile::types::{EntryGroup, GroupKey, NormalizedEntry};

/// Aggregates computed over one consolidation group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTotals {
    /// Sum of the strictly-positive entry amounts.
    pub debit: Decimal,
    /// Sum of the absolute values of the strictly-negative entry amounts.
    pub credit: Decimal,
    /// `debit - credit`.
    pub net_balance: Decimal,
}

/// Groups normalized entries by (taxpayer id, period start, period end,
/// note), preserving first-seen group order and in-group input order.
///
/// Every entry lands in exactly one group, and a group holds at least one
/// entry by construction.
#[must_use]
pub fn group_entries(entries: Vec<NormalizedEntry>) -> Vec<EntryGroup> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<EntryGroup> = Vec::new();

    for entry in entries {
        let key = GroupKey::for_entry(&entry);
        match index.get(&key) {
            Some(&i) => groups[i].entries.push(entry),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(EntryGroup {
                    key,
                    entries: vec![entry],
                });
            }
        }
    }

    groups
}

impl EntryGroup {
    /// Computes debit/credit/net aggregates for this group.
    ///
    /// Debit is the positive side of the signed amounts, credit the absolute
    /// value of the negative side; the net balance is always
    /// `debit - credit` (equivalently, the plain sum of the signed amounts).
    #[must_use]
    pub fn totals(&self) -> GroupTotals {
        let mut debit = Decimal::ZERO;
        let mut credit = Decimal::ZERO;

        for entry in &self.entries {
            if entry.amount > Decimal::ZERO {
                debit += entry.amount;
            } else if entry.amount < Decimal::ZERO {
                credit += -entry.amount;
            }
        }

        GroupTotals {
            debit,
            credit,
            net_balance: debit - credit,
        }
    }

    /// Number of contributing rows, which becomes the document line count.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn entry(row: usize, taxpayer: &str, note: &str, amount: Decimal) -> NormalizedEntry {
        NormalizedEntry {
            row,
            taxpayer_id: taxpayer.to_string(),
            subaccount_code: format!("SUB-{row}"),
            subaccount_name: None,
            period_start: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
            amount,
            note: note.to_string(),
        }
    }

    #[test]
    fn test_groups_by_taxpayer_period_note() {
        let groups = group_entries(vec![
            entry(1, "1234567890", "October", dec!(150000.00)),
            entry(2, "1234567890", "October", dec!(150000.00)),
            entry(3, "5555555555", "October", dec!(-20.50)),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].line_count(), 2);
        assert_eq!(groups[1].line_count(), 1);
        assert_eq!(groups[0].key.taxpayer_id, "1234567890");
        assert_eq!(groups[1].key.taxpayer_id, "5555555555");
    }

    #[test]
    fn test_note_splits_groups() {
        let groups = group_entries(vec![
            entry(1, "1234567890", "October", dec!(100)),
            entry(2, "1234567890", "November", dec!(100)),
        ]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_in_group_order_is_input_order() {
        let groups = group_entries(vec![
            entry(1, "1234567890", "", dec!(1)),
            entry(2, "9999999999", "", dec!(2)),
            entry(3, "1234567890", "", dec!(3)),
        ]);
        assert_eq!(groups[0].entries.iter().map(|e| e.row).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_totals_split_by_sign() {
        let group = &group_entries(vec![
            entry(1, "1234567890", "", dec!(150000.00)),
            entry(2, "1234567890", "", dec!(-20000.50)),
            entry(3, "1234567890", "", dec!(0)),
        ])[0];

        let totals = group.totals();
        assert_eq!(totals.debit, dec!(150000.00));
        assert_eq!(totals.credit, dec!(20000.50));
        assert_eq!(totals.net_balance, dec!(129999.50));
    }

    proptest! {
        /// Every entry lands in exactly one group; nothing is dropped or
        /// duplicated.
        #[test]
        fn prop_partition_is_total(amounts in prop::collection::vec(-1_000_000i64..1_000_000i64, 1..50)) {
            let entries: Vec<NormalizedEntry> = amounts
                .iter()
                .enumerate()
                .map(|(i, &a)| entry(i + 1, if a % 2 == 0 { "1111111111" } else { "2222222222" }, "", Decimal::new(a, 2)))
                .collect();
            let total = entries.len();

            let groups = group_entries(entries);
            let regrouped: usize = groups.iter().map(EntryGroup::line_count).sum();
            prop_assert_eq!(regrouped, total);
            prop_assert!(groups.iter().all(|g| !g.entries.is_empty()));
        }

        /// `debit - credit == net_balance` and equals the signed sum.
        #[test]
        fn prop_net_balance_invariant(amounts in prop::collection::vec(-1_000_000i64..1_000_000i64, 1..50)) {
            let entries: Vec<NormalizedEntry> = amounts
                .iter()
                .enumerate()
                .map(|(i, &a)| entry(i + 1, "1234567890", "", Decimal::new(a, 2)))
                .collect();

            let groups = group_entries(entries);
            prop_assert_eq!(groups.len(), 1);
            let totals = groups[0].totals();
            let signed_sum: Decimal = groups[0].entries.iter().map(|e| e.amount).sum();
            prop_assert_eq!(totals.net_balance, totals.debit - totals.credit);
            prop_assert_eq!(totals.net_balance, signed_sum);
            prop_assert!(totals.debit >= Decimal::ZERO);
            prop_assert!(totals.credit >= Decimal::ZERO);
        }
    }
}
