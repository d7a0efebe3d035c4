//! Domain types for the consolidation pipeline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// One raw ledger row as it arrives from a spreadsheet upload.
///
/// Every field is loosely typed: spreadsheet exports deliver strings,
/// numbers, and epoch-offset date serials interchangeably. The normalizer
/// is the only place that interprets them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    /// Counter-party taxpayer id.
    pub taxpayer_id: Option<Value>,
    /// Sub-account code (e.g. a branch or dealer code).
    pub subaccount_code: Option<Value>,
    /// Optional sub-account display name.
    pub subaccount_name: Option<Value>,
    /// Reconciliation period start.
    pub period_start: Option<Value>,
    /// Reconciliation period end.
    pub period_end: Option<Value>,
    /// Signed amount; positive = debit, negative = credit.
    pub amount: Option<Value>,
    /// Optional free-text note; part of the grouping key.
    pub note: Option<Value>,
}

/// A raw row after successful normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedEntry {
    /// 1-based row number in the uploaded batch.
    pub row: usize,
    /// Counter-party taxpayer id.
    pub taxpayer_id: String,
    /// Sub-account code.
    pub subaccount_code: String,
    /// Sub-account display name, when the upload carried one.
    pub subaccount_name: Option<String>,
    /// Period start date.
    pub period_start: NaiveDate,
    /// Period end date.
    pub period_end: NaiveDate,
    /// Signed amount.
    pub amount: Decimal,
    /// Free-text note (empty string when absent).
    pub note: String,
}

/// Why a raw row failed normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum RowErrorKind {
    /// The taxpayer id field was absent or blank.
    MissingTaxpayerId,
    /// The sub-account code field was absent or blank.
    MissingSubaccountCode,
    /// The period start could not be parsed as a date.
    InvalidPeriodStart(String),
    /// The period end could not be parsed as a date.
    InvalidPeriodEnd(String),
    /// The amount could not be parsed as a decimal.
    InvalidAmount(String),
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTaxpayerId => write!(f, "taxpayer id is missing"),
            Self::MissingSubaccountCode => write!(f, "sub-account code is missing"),
            Self::InvalidPeriodStart(v) => write!(f, "period start is not a date: {v}"),
            Self::InvalidPeriodEnd(v) => write!(f, "period end is not a date: {v}"),
            Self::InvalidAmount(v) => write!(f, "amount is not a decimal: {v}"),
        }
    }
}

/// A row-level normalization or persistence failure, keyed by row number.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("row {row}: {reason}")]
pub struct RowError {
    /// 1-based row number in the uploaded batch.
    pub row: usize,
    /// Failure reason.
    pub reason: RowErrorKind,
}

/// Grouping key for consolidation: one document per distinct key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    /// Counter-party taxpayer id.
    pub taxpayer_id: String,
    /// Period start date.
    pub period_start: NaiveDate,
    /// Period end date.
    pub period_end: NaiveDate,
    /// Free-text note.
    pub note: String,
}

impl GroupKey {
    /// Builds the key for a normalized entry.
    #[must_use]
    pub fn for_entry(entry: &NormalizedEntry) -> Self {
        Self {
            taxpayer_id: entry.taxpayer_id.clone(),
            period_start: entry.period_start,
            period_end: entry.period_end,
            note: entry.note.clone(),
        }
    }
}

/// One consolidation group: the key plus its contributing entries in input
/// order. A group always has at least one entry by construction.
#[derive(Debug, Clone)]
pub struct EntryGroup {
    /// The grouping key.
    pub key: GroupKey,
    /// Contributing entries, in input order.
    pub entries: Vec<NormalizedEntry>,
}
