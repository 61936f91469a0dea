use std::sync::OnceLock;

use regex::Regex;

/// A `#123` / `#-123` token that failed to parse as a number.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("malformed issue reference {raw:?}")]
    Malformed { raw: String },
}

fn reference_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // ASCII digits only: `\d` in the regex crate also matches other scripts' digits.
    RE.get_or_init(|| Regex::new(r"#(-?[0-9]+)").expect("reference pattern compiles"))
}

/// The captured digits (with optional sign) of one `#<number>` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceMatch<'a> {
    raw: &'a str,
}

impl<'a> ReferenceMatch<'a> {
    pub const fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn resolve(&self) -> Result<ParsedReference, ReferenceError> {
        parse_reference(self.raw)
    }
}

/// Lazily yield every non-overlapping issue reference in a chat line, left to right.
pub fn extract_references(text: &str) -> impl Iterator<Item = ReferenceMatch<'_>> {
    reference_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| ReferenceMatch { raw: m.as_str() })
}

/// A reference split into the tracker path segment and the alternate-mode flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReference {
    /// Signed value as typed in chat.
    pub value: f64,
    /// `abs(value)` in shortest decimal form, used as the issue path segment.
    pub magnitude: String,
    /// Sign bit of `value`. Set for `-0` too.
    pub is_alternate: bool,
}

impl ParsedReference {
    #[allow(clippy::float_cmp)]
    pub fn is_value(&self, expected: f64) -> bool {
        self.value == expected
    }
}

pub fn parse_reference(raw: &str) -> Result<ParsedReference, ReferenceError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| ReferenceError::Malformed { raw: raw.to_string() })?;
    Ok(ParsedReference {
        value,
        magnitude: format_magnitude(value.abs()),
        is_alternate: value.is_sign_negative(),
    })
}

/// `f64` Display is already shortest round-trip and never switches to exponent notation.
pub fn format_magnitude(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raws(text: &str) -> Vec<&str> {
        extract_references(text).map(|m| m.raw()).collect()
    }

    #[test]
    fn extracts_every_reference_in_order() {
        assert_eq!(raws("see #12 and #-3, also #4567"), vec!["12", "-3", "4567"]);
    }

    #[test]
    fn no_references_yields_empty() {
        assert!(raws("nothing to see here # - 12").is_empty());
        assert!(raws("").is_empty());
    }

    #[test]
    fn adjacent_tokens_are_not_double_counted() {
        assert_eq!(raws("#12#34"), vec!["12", "34"]);
        assert_eq!(raws("##5"), vec!["5"]);
        assert_eq!(raws("#--5"), Vec::<&str>::new());
    }

    #[test]
    fn trigger_words_are_not_references() {
        assert!(raws("#coffee #dog #git").is_empty());
    }

    #[test]
    fn non_ascii_digits_are_ignored() {
        assert!(raws("#٣").is_empty());
    }

    #[test]
    fn parse_positive() {
        let parsed = parse_reference("42").unwrap();
        assert!(!parsed.is_alternate);
        assert_eq!(parsed.magnitude, "42");
    }

    #[test]
    fn parse_negative() {
        let parsed = parse_reference("-42").unwrap();
        assert!(parsed.is_alternate);
        assert_eq!(parsed.magnitude, "42");
        assert!(parsed.is_value(-42.0));
    }

    #[test]
    fn parse_negative_zero_keeps_sign_bit() {
        let parsed = parse_reference("-0").unwrap();
        assert!(parsed.is_alternate);
        assert_eq!(parsed.magnitude, "0");
    }

    #[test]
    fn parse_leading_zeros_are_canonicalised() {
        assert_eq!(parse_reference("007").unwrap().magnitude, "7");
    }

    #[test]
    fn huge_magnitude_has_no_exponent() {
        let parsed = parse_reference("100000000000000000000000").unwrap();
        assert!(!parsed.magnitude.contains('e'));
        assert!(parsed.magnitude.starts_with('1'));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            parse_reference("-"),
            Err(ReferenceError::Malformed { raw: "-".to_string() })
        );
    }

    #[test]
    fn match_resolves() {
        let first = extract_references("#-1555").next().unwrap();
        let parsed = first.resolve().unwrap();
        assert!(parsed.is_alternate);
        assert!(parsed.is_value(-1555.0));
        assert_eq!(parsed.magnitude, "1555");
    }
}
