//! Display cleanup applied to raw captures before classification.

use std::sync::LazyLock;

use regex::Regex;

use crate::patterns::{compile, Normalizer};

static RANGE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| compile(r"\s*[-‐‑‒–—−]\s*"));

static MORPHOLOGY_BOILERPLATE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\s+(?:No\s+se\s+observan?|x\s+campo).*$"));

/// Apply `normalizer` to a trimmed capture. `None` means nothing displayable is left.
pub fn apply(normalizer: Normalizer, raw: &str) -> Option<String> {
    match normalizer {
        Normalizer::Identity => Some(raw.to_string()),
        Normalizer::NumericTrim => Some(numeric_trim(raw)),
        Normalizer::RangeNormalize => Some(range_normalize(raw)),
        Normalizer::MorphologyTrim => morphology_trim(raw),
    }
}

/// `143.0` becomes `143`; anything with a fractional part is left as written.
pub fn numeric_trim(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", value as i64)
        }
        _ => raw.to_string(),
    }
}

/// Collapse any dash between two bounds to a bare `-`.
pub fn range_normalize(raw: &str) -> String {
    RANGE_SEPARATOR.replace_all(raw.trim(), "-").into_owned()
}

/// First line only, with trailing "not observed"/"per field" text removed.
pub fn morphology_trim(raw: &str) -> Option<String> {
    let first = raw.trim().lines().next()?.trim();
    let cleaned = MORPHOLOGY_BOILERPLATE.replace(first, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_trim_drops_zero_fraction() {
        assert_eq!(numeric_trim("143.0"), "143");
        assert_eq!(numeric_trim("143"), "143");
        assert_eq!(numeric_trim("4.50"), "4.50");
        assert_eq!(numeric_trim("4.25"), "4.25");
        assert_eq!(numeric_trim("n/a"), "n/a");
    }

    #[test]
    fn numeric_trim_is_idempotent() {
        for raw in ["143.0", "0.0", "3.5", "98.10", "107", "12.000", "0.05"] {
            let once = numeric_trim(raw);
            assert_eq!(numeric_trim(&once), once, "{raw}");
        }
    }

    #[test]
    fn range_separators_are_canonical() {
        assert_eq!(range_normalize("0 - 3"), "0-3");
        assert_eq!(range_normalize("0-3"), "0-3");
        assert_eq!(range_normalize("0–3"), "0-3");
        assert_eq!(range_normalize("10 — 20"), "10-20");
        assert_eq!(range_normalize(&range_normalize("0 – 3")), "0-3");
    }

    #[test]
    fn non_ranges_pass_through() {
        assert_eq!(range_normalize("<3"), "<3");
        assert_eq!(range_normalize("> 100"), "> 100");
        assert_eq!(range_normalize("5"), "5");
    }

    #[test]
    fn morphology_keeps_first_line_only() {
        assert_eq!(
            morphology_trim("Normales\nMORFOLOGIA SERIE BLANCA").as_deref(),
            Some("Normales")
        );
    }

    #[test]
    fn morphology_strips_boilerplate() {
        assert_eq!(
            morphology_trim("Anisocitosis leve No se observan").as_deref(),
            Some("Anisocitosis leve")
        );
        assert_eq!(
            morphology_trim("Escasas x campo").as_deref(),
            Some("Escasas")
        );
        assert_eq!(morphology_trim("   ").as_deref(), None);
    }

    #[test]
    fn bare_boilerplate_is_kept() {
        assert_eq!(
            morphology_trim("No se observan").as_deref(),
            Some("No se observan")
        );
    }
}
