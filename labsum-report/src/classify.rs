//! Reference rules per analyte and the normal/abnormal decision.

use labsum_core::{Analyte, ExtractedValue, LabSummaryError, LabValue, ReferenceRule};

use crate::context::Thresholds;
use crate::extract::Reading;
use crate::morphology::NORMAL_FINDINGS;

/// Acceptable urine sediment counts per high-power field.
pub const URINE_COUNT_NORMAL: [&str; 2] = ["0-3", "<3"];

/// Default expected result for qualitative urine tests.
pub const NEGATIVE: &str = "negativo";

/// Reference rule for `analyte` under the resolved thresholds.
pub fn reference_rule(analyte: Analyte, thresholds: &Thresholds) -> ReferenceRule {
    match analyte {
        Analyte::Creatinine
        | Analyte::FreeT4
        | Analyte::Hematocrit
        | Analyte::Mcv
        | Analyte::Mchc
        | Analyte::UrineBacteria => ReferenceRule::Unrated,
        Analyte::GlomerularFiltration => ReferenceRule::at_least(60.0),
        Analyte::UreaNitrogen => ReferenceRule::range(8.0, 25.0),
        Analyte::Urea => ReferenceRule::range(21.0, 49.0),
        Analyte::UricAcid => ReferenceRule::range(2.3, 6.1),
        Analyte::AlbuminCreatinineRatio => ReferenceRule::at_most(30.0),
        Analyte::Sodium => ReferenceRule::range(135.0, 145.0),
        Analyte::Potassium => ReferenceRule::range(3.5, 5.0),
        Analyte::Chloride => ReferenceRule::range(98.0, 107.0),
        Analyte::Glucose | Analyte::OgttBasal => ReferenceRule::range(70.0, 100.0),
        Analyte::Hba1c => ReferenceRule::range(4.0, 6.0),
        Analyte::Ogtt120 => ReferenceRule::at_most(140.0),
        Analyte::Tsh => ReferenceRule::at_most(thresholds.tsh_max),
        Analyte::TotalCholesterol => ReferenceRule::at_most(200.0),
        Analyte::Ldl => ReferenceRule::at_most(thresholds.ldl_max),
        Analyte::Hdl => ReferenceRule::at_least(thresholds.hdl_min),
        Analyte::Triglycerides => ReferenceRule::at_most(150.0),
        Analyte::Hemoglobin => ReferenceRule::Bounds {
            low: thresholds.hb_min,
            high: None,
        },
        Analyte::Leukocytes => ReferenceRule::range(4.5, 11.0),
        Analyte::Platelets => ReferenceRule::range(150.0, 450.0),
        Analyte::Esr => ReferenceRule::at_most(thresholds.esr_max),
        Analyte::UrineErythrocytes | Analyte::UrineLeukocytes => {
            ReferenceRule::OneOf(URINE_COUNT_NORMAL.iter().map(|s| s.to_string()).collect())
        }
        Analyte::UrineNitrites
        | Analyte::UrineBilirubin
        | Analyte::UrineProtein
        | Analyte::UrineGlucose => ReferenceRule::Expected(NEGATIVE.to_string()),
        Analyte::RedCellMorphology
        | Analyte::WhiteCellMorphology
        | Analyte::PlateletMorphology => {
            ReferenceRule::OneOf(NORMAL_FINDINGS.iter().map(|s| s.to_string()).collect())
        }
    }
}

/// Decide whether `value` falls outside `rule`.
///
/// Bounds are inclusive: a value equal to a bound is normal. Text comparisons
/// ignore case.
pub fn is_abnormal(
    analyte: Analyte,
    value: &LabValue,
    rule: &ReferenceRule,
) -> Result<bool, LabSummaryError> {
    let mismatch = || LabSummaryError::RuleMismatch {
        analyte,
        value: value.clone(),
    };

    match (value, rule) {
        (_, ReferenceRule::Unrated) => Ok(false),
        (LabValue::Scalar(v), ReferenceRule::Bounds { low, high }) => {
            Ok(low.is_some_and(|low| *v < low) || high.is_some_and(|high| *v > high))
        }
        (LabValue::Range(text) | LabValue::Categorical(text), ReferenceRule::Expected(expected)) => {
            Ok(text.to_lowercase() != expected.to_lowercase())
        }
        (LabValue::Range(text) | LabValue::Categorical(text), ReferenceRule::OneOf(allowed)) => {
            let text = text.to_lowercase();
            Ok(!allowed.iter().any(|candidate| candidate.to_lowercase() == text))
        }
        (LabValue::Scalar(_), ReferenceRule::Expected(_) | ReferenceRule::OneOf(_))
        | (LabValue::Range(_) | LabValue::Categorical(_), ReferenceRule::Bounds { .. }) => {
            Err(mismatch())
        }
    }
}

/// Attach the abnormal flag to a reading.
pub fn evaluate(reading: Reading, thresholds: &Thresholds) -> Result<ExtractedValue, LabSummaryError> {
    let rule = reference_rule(reading.analyte, thresholds);
    let is_abnormal = is_abnormal(reading.analyte, &reading.value, &rule)?;
    Ok(ExtractedValue {
        analyte: reading.analyte,
        raw_text: reading.raw,
        normalized_text: reading.normalized,
        value: reading.value,
        is_abnormal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{ValueKind, PATTERN_LIBRARY};

    fn scalar(v: f64, rule: ReferenceRule) -> bool {
        is_abnormal(Analyte::Tsh, &LabValue::Scalar(v), &rule).unwrap()
    }

    #[test]
    fn high_bound_is_inclusive() {
        assert!(!scalar(3.0, ReferenceRule::at_most(3.0)));
        assert!(scalar(3.01, ReferenceRule::at_most(3.0)));
        assert!(!scalar(2.0, ReferenceRule::at_most(3.0)));
    }

    #[test]
    fn low_bound_is_inclusive() {
        assert!(!scalar(60.0, ReferenceRule::at_least(60.0)));
        assert!(scalar(59.0, ReferenceRule::at_least(60.0)));
    }

    #[test]
    fn no_bounds_never_flags() {
        let rule = ReferenceRule::Bounds {
            low: None,
            high: None,
        };
        assert!(!scalar(-1e9, rule.clone()));
        assert!(!scalar(1e9, rule));
    }

    #[test]
    fn categorical_ignores_case() {
        let rule = ReferenceRule::Expected(NEGATIVE.into());
        let check = |s: &str| {
            is_abnormal(Analyte::UrineNitrites, &LabValue::Categorical(s.into()), &rule).unwrap()
        };
        assert!(!check("NEGATIVO"));
        assert!(check("POSITIVO"));
    }

    #[test]
    fn urine_counts_use_closed_set() {
        let rule = reference_rule(Analyte::UrineErythrocytes, &Thresholds::default());
        let check = |s: &str| {
            is_abnormal(Analyte::UrineErythrocytes, &LabValue::Range(s.into()), &rule).unwrap()
        };
        assert!(!check("0-3"));
        assert!(!check("<3"));
        assert!(check("0-2"));
        assert!(check("10-20"));
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let err = is_abnormal(
            Analyte::Ldl,
            &LabValue::Categorical("alto".into()),
            &ReferenceRule::at_most(100.0),
        )
        .unwrap_err();
        assert!(matches!(err, LabSummaryError::RuleMismatch { analyte: Analyte::Ldl, .. }));
    }

    #[test]
    fn unknown_sex_never_flags_hemoglobin() {
        let thresholds = Thresholds {
            hb_min: None,
            ..Thresholds::default()
        };
        let rule = reference_rule(Analyte::Hemoglobin, &thresholds);
        assert!(!is_abnormal(Analyte::Hemoglobin, &LabValue::Scalar(7.0), &rule).unwrap());
    }

    #[test]
    fn fields_kept_as_printed_are_unrated() {
        let thresholds = Thresholds::default();
        for pattern in PATTERN_LIBRARY {
            if pattern.kind == ValueKind::Reported {
                assert_eq!(
                    reference_rule(pattern.analyte, &thresholds),
                    ReferenceRule::Unrated,
                    "{}",
                    pattern.analyte
                );
            }
        }
    }
}
