//! Comparison-key normalization.
//!
//! Reduces a string to the canonical form used by every similarity check:
//! whitespace and common punctuation removed, lower-cased. The result is a
//! derived key only — regenerated on every comparison, never stored.

use once_cell::sync::Lazy;
use regex::Regex;

static STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s()%/+\-.,]").unwrap());

/// Build the comparison key for `text`.
pub fn normalize(text: &str) -> String {
    STRIP_RE.replace_all(text, "").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_and_punctuation() {
        assert_eq!(normalize("배출량 (톤)"), "배출량톤");
        assert_eq!(normalize("Scope 1+2 / CO2"), "scope12co2");
        assert_eq!(normalize("재생원료 사용 비율 (%)"), "재생원료사용비율");
    }

    #[test]
    fn lowercases() {
        assert_eq!(normalize("LTIFR"), "ltifr");
    }

    #[test]
    fn idempotent() {
        let inputs = ["근로손실재해율 (LTIFR)", "  a, b. c  ", "", "온실가스 배출량"];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" ()%/+-., "), "");
    }
}
