//! Generic first-match extraction driven by the pattern library.

use labsum_core::{Analyte, LabSummaryError, LabValue};
use regex::Regex;

use crate::normalize;
use crate::patterns::{AnalytePattern, ValueKind};

/// A located value before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub analyte: Analyte,
    pub raw: String,
    pub normalized: String,
    pub value: LabValue,
}

/// First capture of the first locator that matches, trimmed. Empty captures
/// count as no match.
pub fn find_first(text: &str, locators: &[Regex]) -> Option<String> {
    locators.iter().find_map(|regex| {
        let capture = regex.captures(text)?.get(1)?.as_str().trim();
        (!capture.is_empty()).then(|| capture.to_string())
    })
}

/// Locate and normalize one analyte in `text`.
///
/// `Ok(None)` is the ordinary "not in this report" outcome. A rated numeric
/// field whose capture does not parse is an error for that field alone.
pub fn extract(pattern: &AnalytePattern, text: &str) -> Result<Option<Reading>, LabSummaryError> {
    let Some(raw) = find_first(text, pattern.regexes()) else {
        return Ok(None);
    };
    let Some(normalized) = normalize::apply(pattern.normalizer, &raw) else {
        return Ok(None);
    };

    let value = match pattern.kind {
        ValueKind::Numeric => {
            let number = raw
                .parse::<f64>()
                .map_err(|_| LabSummaryError::MalformedNumeric {
                    analyte: pattern.analyte,
                    raw: raw.clone(),
                })?;
            LabValue::Scalar(number)
        }
        ValueKind::Reported => match raw.parse::<f64>() {
            Ok(number) => LabValue::Scalar(number),
            Err(_) => LabValue::Categorical(normalized.clone()),
        },
        ValueKind::Range => LabValue::Range(normalized.clone()),
        ValueKind::Categorical => LabValue::Categorical(normalized.clone()),
    };

    Ok(Some(Reading {
        analyte: pattern.analyte,
        raw,
        normalized,
        value,
    }))
}
