//! Format validators for account fields.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+$").expect("valid regex"));

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("valid regex"));

static ZIP_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("valid regex"));

static INSURANCE_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z](?:[0-9]{9}|[0-9]{11})$").expect("valid regex"));

static PASSWORD_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@$!%*?&]{8,}$").expect("valid regex"));

const PASSWORD_SPECIALS: &[char] = &['@', '$', '!', '%', '*', '?', '&'];

pub const USERNAME_MIN: usize = 4;
pub const USERNAME_MAX: usize = 20;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

pub fn is_valid_zip_code(zip: &str) -> bool {
    ZIP_CODE_REGEX.is_match(zip)
}

/// One uppercase letter followed by 9 or 11 digits.
pub fn is_valid_insurance_number(number: &str) -> bool {
    INSURANCE_NUMBER_REGEX.is_match(number)
}

pub fn is_valid_username(username: &str) -> bool {
    (USERNAME_MIN..=USERNAME_MAX).contains(&username.chars().count())
}

/// At least 8 characters from `[A-Za-z0-9@$!%*?&]`, with at least one uppercase
/// letter, one digit and one special character.
pub fn is_valid_password(password: &str) -> bool {
    PASSWORD_CHARSET_REGEX.is_match(password)
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(&c))
}

/// `Some(trimmed)` when the value is present and not blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("doc.one+rx@clinic.example"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
    }

    #[test]
    fn phone_format() {
        assert!(is_valid_phone("+491511234567"));
        assert!(is_valid_phone("0151123456"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+49 151 1234567"));
    }

    #[test]
    fn zip_and_insurance_formats() {
        assert!(is_valid_zip_code("10115"));
        assert!(!is_valid_zip_code("1011"));
        assert!(is_valid_insurance_number("A123456789"));
        assert!(is_valid_insurance_number("B12345678901"));
        assert!(!is_valid_insurance_number("a123456789"));
        assert!(!is_valid_insurance_number("A1234567890"));
    }

    #[test]
    fn password_policy() {
        assert!(is_valid_password("Secret1!"));
        assert!(!is_valid_password("secret1!"), "needs uppercase");
        assert!(!is_valid_password("Secret!!"), "needs digit");
        assert!(!is_valid_password("Secret11"), "needs special");
        assert!(!is_valid_password("Sec1!"), "too short");
        assert!(!is_valid_password("Secret1! "), "space not allowed");
    }

    #[test]
    fn username_length() {
        assert!(!is_valid_username("abc"));
        assert!(is_valid_username("abcd"));
        assert!(is_valid_username(&"a".repeat(20)));
        assert!(!is_valid_username(&"a".repeat(21)));
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 500, .. ProptestConfig::default() })]

        #[test]
        fn generated_valid_passwords_pass(body in "[a-z]{5,12}", digit in 0u8..10, special in 0usize..7) {
            let pw = format!("Q{body}{digit}{}", PASSWORD_SPECIALS[special]);
            prop_assert!(is_valid_password(&pw));
        }

        #[test]
        fn lowercase_only_never_passes(pw in "[a-z0-9@$!%*?&]{8,20}") {
            prop_assert!(!is_valid_password(&pw));
        }
    }
}
