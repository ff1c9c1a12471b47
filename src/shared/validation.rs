use lazy_static::lazy_static;
use regex::Regex;

use crate::shared::constants::{PHONE_MAX_DIGITS, PHONE_MIN_DIGITS};

lazy_static! {
    /// Matches every character that is not an ASCII digit
    /// - "+1 (555) 123-4567" -> "15551234567" after replacement
    pub static ref NON_DIGIT_REGEX: Regex = Regex::new(r"[^0-9]").unwrap();
}

/// Strip everything except digits from a raw phone value.
pub fn strip_non_digits(raw: &str) -> String {
    NON_DIGIT_REGEX.replace_all(raw, "").into_owned()
}

/// Normalize a raw phone value to its digits, rejecting values whose digit
/// count falls outside `[PHONE_MIN_DIGITS, PHONE_MAX_DIGITS]`.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = strip_non_digits(raw);
    if (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len()) {
        Some(digits)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_non_digits() {
        assert_eq!(strip_non_digits("+1 (555) 123-4567"), "15551234567");
        assert_eq!(strip_non_digits("abc"), "");
        assert_eq!(strip_non_digits("０１２"), ""); // fullwidth digits are not ASCII
    }

    #[test]
    fn test_normalize_phone_valid() {
        assert_eq!(
            normalize_phone("+1 (555) 123-4567"),
            Some("15551234567".to_string())
        );
        assert_eq!(normalize_phone("12345678"), Some("12345678".to_string()));
        assert_eq!(
            normalize_phone("123456789012345"),
            Some("123456789012345".to_string())
        );
        assert_eq!(normalize_phone("1-2-3-4-5-6-7-8"), Some("12345678".to_string()));
    }

    #[test]
    fn test_normalize_phone_invalid() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("1234567"), None); // 7 digits
        assert_eq!(normalize_phone("1234567890123456"), None); // 16 digits
        assert_eq!(normalize_phone("phone: call me"), None);
        assert_eq!(normalize_phone("+34 ---- 12 34"), None);
    }
}
