//! Approval token and document number generation.
//!
//! The approval token is the sole credential on the unauthenticated
//! approval channel, so its entropy is the entire security boundary there:
//! 32 random bytes (256 bits) rendered URL-safe. Document numbers are
//! human-facing identifiers and carry only enough randomness to stay unique
//! under concurrent issuance.

use chrono::{DateTime, Utc};

/// Alphabet for the document number suffix.
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random document number suffix.
const SUFFIX_LEN: usize = 4;

/// Generates a single-use approval token: 256 bits of OS randomness,
/// URL-safe base64 without padding.
#[must_use]
pub fn generate_approval_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64_url::encode(&bytes)
}

/// Generates a globally unique document number:
/// `<prefix>-<UTC timestamp>-<4 random base36 chars>`.
///
/// The number is immutable once assigned; uniqueness is additionally
/// enforced by the storage layer.
#[must_use]
pub fn generate_document_number(prefix: &str, now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y%m%d%H%M%S");
    let suffix = random_base36(SUFFIX_LEN);
    format!("{prefix}-{timestamp}-{suffix}")
}

fn random_base36(len: usize) -> String {
    (0..len)
        .map(|_| char::from(BASE36[rand::random_range(0..BASE36.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_is_url_safe_and_long_enough() {
        let token = generate_approval_token();
        // 32 bytes -> 43 base64 chars without padding.
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_approval_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_document_number_shape() {
        let now = DateTime::parse_from_rfc3339("2025-10-01T12:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        let number = generate_document_number("REC", now);

        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "REC");
        assert_eq!(parts[1], "20251001123045");
        assert_eq!(parts[2].len(), 4);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }
}
