//! Row normalization: raw spreadsheet values to typed entries.
//!
//! `normalize_row` is pure and deterministic: the same raw row always yields
//! the same typed entry or the same error, with no side effects. A failed
//! row never aborts the batch; the caller collects the error and moves on.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::reconcile::types::{NormalizedEntry, RawRow, RowError, RowErrorKind};

/// Date notations accepted from spreadsheet exports.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Spreadsheet serial dates count days from this epoch (1899-12-30, the
/// convention shared by Excel and LibreOffice once the leap-year bug is
/// accounted for).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Plausible serial range: 1950-01-01 .. 2100-01-01 roughly.
const SERIAL_MIN: i64 = 18264;
const SERIAL_MAX: i64 = 73050;

/// Normalizes one raw row.
///
/// Validation order: taxpayer id, sub-account code, period start, period
/// end, amount. The first failure wins and is keyed by the 1-based
/// `row_number`.
///
/// # Errors
///
/// Returns a `RowError` naming the offending field and the raw value.
pub fn normalize_row(row_number: usize, raw: &RawRow) -> Result<NormalizedEntry, RowError> {
    let fail = |reason: RowErrorKind| RowError {
        row: row_number,
        reason,
    };

    let taxpayer_id = text_value(raw.taxpayer_id.as_ref())
        .ok_or_else(|| fail(RowErrorKind::MissingTaxpayerId))?;

    let subaccount_code = text_value(raw.subaccount_code.as_ref())
        .ok_or_else(|| fail(RowErrorKind::MissingSubaccountCode))?;

    let period_start = parse_date(raw.period_start.as_ref())
        .map_err(|v| fail(RowErrorKind::InvalidPeriodStart(v)))?;

    let period_end = parse_date(raw.period_end.as_ref())
        .map_err(|v| fail(RowErrorKind::InvalidPeriodEnd(v)))?;

    let amount =
        parse_amount(raw.amount.as_ref()).map_err(|v| fail(RowErrorKind::InvalidAmount(v)))?;

    Ok(NormalizedEntry {
        row: row_number,
        taxpayer_id,
        subaccount_code,
        subaccount_name: text_value(raw.subaccount_name.as_ref()),
        period_start,
        period_end,
        amount,
        note: text_value(raw.note.as_ref()).unwrap_or_default(),
    })
}

/// Extracts a non-empty trimmed string from a loose value.
///
/// Numbers are rendered back to text so numeric taxpayer ids and
/// sub-account codes survive spreadsheet type coercion.
fn text_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses a date from any accepted notation, including serial numbers.
fn parse_date(value: Option<&Value>) -> Result<NaiveDate, String> {
    let value = value.ok_or_else(|| "missing".to_string())?;

    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err("missing".to_string());
            }
            for format in DATE_FORMATS {
                if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                    return Ok(date);
                }
            }
            // A bare integer string may still be a spreadsheet serial.
            if let Ok(serial) = trimmed.parse::<i64>() {
                return serial_to_date(serial).ok_or_else(|| trimmed.to_string());
            }
            Err(trimmed.to_string())
        }
        Value::Number(n) => {
            let serial = n
                .as_i64()
                .or_else(|| n.to_string().split('.').next()?.parse().ok())
                .ok_or_else(|| n.to_string())?;
            serial_to_date(serial).ok_or_else(|| n.to_string())
        }
        other => Err(other.to_string()),
    }
}

/// Converts a spreadsheet serial to a date, rejecting implausible offsets.
fn serial_to_date(serial: i64) -> Option<NaiveDate> {
    if !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_days(chrono::Days::new(u64::try_from(serial).ok()?))
}

/// Parses a signed decimal amount, tolerating `,` or `.` decimal separators
/// and thousands grouping.
fn parse_amount(value: Option<&Value>) -> Result<Decimal, String> {
    let value = value.ok_or_else(|| "missing".to_string())?;

    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(other.to_string()),
    };

    if text.is_empty() {
        return Err("missing".to_string());
    }

    let cleaned = normalize_separators(&text);
    Decimal::from_str(&cleaned).map_err(|_| text)
}

/// Rewrites locale-dependent separators into canonical `1234.56` form.
///
/// When both `.` and `,` appear, the rightmost one is the decimal separator
/// and the other is grouping. A lone `,` is treated as the decimal
/// separator.
fn normalize_separators(text: &str) -> String {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let last_dot = compact.rfind('.');
    let last_comma = compact.rfind(',');

    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => compact
            .chars()
            .filter(|&c| c != '.')
            .map(|c| if c == ',' { '.' } else { c })
            .collect(),
        (Some(_), Some(_)) => compact.chars().filter(|&c| c != ',').collect(),
        (None, Some(_)) => compact.replace(',', "."),
        _ => compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn row(
        taxpayer: Option<Value>,
        code: Option<Value>,
        start: Option<Value>,
        end: Option<Value>,
        amount: Option<Value>,
    ) -> RawRow {
        RawRow {
            taxpayer_id: taxpayer,
            subaccount_code: code,
            subaccount_name: None,
            period_start: start,
            period_end: end,
            amount,
            note: None,
        }
    }

    fn valid_row() -> RawRow {
        row(
            Some(json!("1234567890")),
            Some(json!("BR-001")),
            Some(json!("2025-10-01")),
            Some(json!("2025-10-25")),
            Some(json!("150000.00")),
        )
    }

    #[test]
    fn test_normalize_valid_row() {
        let entry = normalize_row(1, &valid_row()).unwrap();
        assert_eq!(entry.row, 1);
        assert_eq!(entry.taxpayer_id, "1234567890");
        assert_eq!(entry.subaccount_code, "BR-001");
        assert_eq!(
            entry.period_start,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
        );
        assert_eq!(entry.amount, dec!(150000.00));
        assert_eq!(entry.note, "");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = valid_row();
        assert_eq!(normalize_row(3, &raw), normalize_row(3, &raw));
    }

    #[test]
    fn test_missing_taxpayer_id() {
        let mut raw = valid_row();
        raw.taxpayer_id = Some(json!("   "));
        let err = normalize_row(2, &raw).unwrap_err();
        assert_eq!(err.row, 2);
        assert_eq!(err.reason, RowErrorKind::MissingTaxpayerId);
    }

    #[test]
    fn test_missing_subaccount_code() {
        let mut raw = valid_row();
        raw.subaccount_code = None;
        let err = normalize_row(1, &raw).unwrap_err();
        assert_eq!(err.reason, RowErrorKind::MissingSubaccountCode);
    }

    #[test]
    fn test_numeric_taxpayer_id_survives() {
        let mut raw = valid_row();
        raw.taxpayer_id = Some(json!(9876543210_i64));
        let entry = normalize_row(1, &raw).unwrap();
        assert_eq!(entry.taxpayer_id, "9876543210");
    }

    #[rstest]
    #[case("2025-10-01")]
    #[case("01.10.2025")]
    #[case("01/10/2025")]
    #[case("2025/10/01")]
    fn test_date_notations(#[case] notation: &str) {
        let mut raw = valid_row();
        raw.period_start = Some(json!(notation));
        let entry = normalize_row(1, &raw).unwrap();
        assert_eq!(
            entry.period_start,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
        );
    }

    #[test]
    fn test_spreadsheet_serial_date() {
        // 45931 days after 1899-12-30 is 2025-10-01.
        let mut raw = valid_row();
        raw.period_start = Some(json!(45931));
        let entry = normalize_row(1, &raw).unwrap();
        assert_eq!(
            entry.period_start,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
        );

        // Same serial as a string.
        raw.period_start = Some(json!("45931"));
        let entry = normalize_row(1, &raw).unwrap();
        assert_eq!(
            entry.period_start,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
        );
    }

    #[test]
    fn test_implausible_serial_rejected() {
        let mut raw = valid_row();
        raw.period_start = Some(json!(12));
        let err = normalize_row(1, &raw).unwrap_err();
        assert!(matches!(err.reason, RowErrorKind::InvalidPeriodStart(_)));
    }

    #[test]
    fn test_invalid_period_end() {
        let mut raw = valid_row();
        raw.period_end = Some(json!("not-a-date"));
        let err = normalize_row(4, &raw).unwrap_err();
        assert_eq!(err.row, 4);
        assert!(matches!(err.reason, RowErrorKind::InvalidPeriodEnd(_)));
    }

    #[rstest]
    #[case("150000.00", dec!(150000.00))]
    #[case("-5000,25", dec!(-5000.25))]
    #[case("1.234,56", dec!(1234.56))]
    #[case("1,234.56", dec!(1234.56))]
    #[case("1 234,56", dec!(1234.56))]
    fn test_amount_notations(#[case] text: &str, #[case] expected: Decimal) {
        let mut raw = valid_row();
        raw.amount = Some(json!(text));
        let entry = normalize_row(1, &raw).unwrap();
        assert_eq!(entry.amount, expected);
    }

    #[test]
    fn test_numeric_amount() {
        let mut raw = valid_row();
        raw.amount = Some(json!(-250));
        let entry = normalize_row(1, &raw).unwrap();
        assert_eq!(entry.amount, dec!(-250));
    }

    #[test]
    fn test_non_numeric_amount_keyed_by_row() {
        let mut raw = valid_row();
        raw.amount = Some(json!("abc"));
        let err = normalize_row(2, &raw).unwrap_err();
        assert_eq!(err.row, 2);
        assert_eq!(
            err.reason,
            RowErrorKind::InvalidAmount("abc".to_string())
        );
    }

    #[test]
    fn test_note_is_trimmed() {
        let mut raw = valid_row();
        raw.note = Some(json!("  October  "));
        let entry = normalize_row(1, &raw).unwrap();
        assert_eq!(entry.note, "October");
    }
}
