//! Lenient parsing of closed enums that carry a reserved "invalid" member.
//!
//! Clients send enum values as free text. Instead of rejecting the whole request
//! body on an unknown value, input is normalized (trimmed, upper-cased) and any
//! blank or unrecognized value maps to the enum's sentinel member. Services then
//! reject the sentinel with a precise message.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A closed enum with a sentinel member meaning "absent or invalid".
pub trait Sentinel: Copy + Eq + 'static {
    /// Member produced for blank or unrecognized input.
    const SENTINEL: Self;

    /// Every member except the sentinel, in display order.
    const VARIANTS: &'static [Self];

    /// Canonical upper-case wire name.
    fn name(self) -> &'static str;

    fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

/// Parse `raw` into `E`, falling back to `E::SENTINEL`.
pub fn parse_or_sentinel<E: Sentinel>(raw: &str) -> E {
    let normalized = raw.trim().to_uppercase();
    if normalized.is_empty() {
        return E::SENTINEL;
    }
    E::VARIANTS
        .iter()
        .copied()
        .find(|v| v.name() == normalized)
        .unwrap_or(E::SENTINEL)
}

/// Comma-separated list of accepted values, for error messages.
pub fn allowed_values<E: Sentinel>() -> String {
    E::VARIANTS
        .iter()
        .map(|v| v.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Serde adapter for `Option<E>` fields.
///
/// `null` (or an absent field together with `#[serde(default)]`) yields `None`;
/// any other JSON value yields `Some`, with non-string values mapping to the
/// sentinel.
pub fn deserialize_or_sentinel<'de, D, E>(deserializer: D) -> Result<Option<E>, D::Error>
where
    D: Deserializer<'de>,
    E: Sentinel,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(parse_or_sentinel(&s)),
        Some(_) => Some(E::SENTINEL),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Shade {
        Light,
        Dark,
        None,
    }

    impl Sentinel for Shade {
        const SENTINEL: Self = Shade::None;
        const VARIANTS: &'static [Self] = &[Shade::Light, Shade::Dark];

        fn name(self) -> &'static str {
            match self {
                Shade::Light => "LIGHT",
                Shade::Dark => "DARK",
                Shade::None => "NONE",
            }
        }
    }

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "deserialize_or_sentinel")]
        shade: Option<Shade>,
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(parse_or_sentinel::<Shade>("  dark "), Shade::Dark);
        assert_eq!(parse_or_sentinel::<Shade>("Light"), Shade::Light);
    }

    #[test]
    fn blank_and_unknown_map_to_sentinel() {
        assert_eq!(parse_or_sentinel::<Shade>("   "), Shade::None);
        assert_eq!(parse_or_sentinel::<Shade>("purple"), Shade::None);
    }

    #[test]
    fn sentinel_name_is_not_accepted_as_a_value() {
        assert!(parse_or_sentinel::<Shade>("none").is_sentinel());
    }

    #[test]
    fn allowed_values_excludes_sentinel() {
        assert_eq!(allowed_values::<Shade>(), "LIGHT, DARK");
    }

    #[test]
    fn serde_absent_and_null_are_none() {
        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.shade, None);
        let body: Body = serde_json::from_str(r#"{"shade": null}"#).unwrap();
        assert_eq!(body.shade, None);
    }

    #[test]
    fn serde_non_string_is_sentinel() {
        let body: Body = serde_json::from_str(r#"{"shade": 7}"#).unwrap();
        assert_eq!(body.shade, Some(Shade::None));
        let body: Body = serde_json::from_str(r#"{"shade": "light"}"#).unwrap();
        assert_eq!(body.shade, Some(Shade::Light));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 500, .. ProptestConfig::default() })]

        #[test]
        fn never_fails_on_arbitrary_text(raw in ".*") {
            let parsed = parse_or_sentinel::<Shade>(&raw);
            let expected = match raw.trim().to_uppercase().as_str() {
                "LIGHT" => Shade::Light,
                "DARK" => Shade::Dark,
                _ => Shade::None,
            };
            prop_assert_eq!(parsed, expected);
        }
    }
}
