//! Patient context and the thresholds that depend on it.

use std::sync::LazyLock;

use chrono::NaiveDate;
use labsum_core::{CardiovascularRisk, ContextInput, PatientContext, Sex, SummaryConfig};
use regex::Regex;

use crate::extract::find_first;
use crate::patterns::compile;

static AGE: LazyLock<[Regex; 1]> = LazyLock::new(|| [compile(r"Edad\s*:?\s*(\d+)")]);

static SEX: LazyLock<[Regex; 1]> =
    LazyLock::new(|| [compile(r"Sexo\s*:?\s*(FEMENINO|MASCULINO)")]);

static SAMPLE_DATE: LazyLock<[Regex; 1]> = LazyLock::new(|| {
    [compile(
        r"(?s)(?:TOMA\s+(?:DE\s+)?MUESTRA|Recep\.?\s*Muestra).*?(\d{2}[-/]\d{2}[-/]\d{4})",
    )]
});

/// Context-dependent reference limits, computed once per report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub tsh_max: f64,
    pub ldl_max: f64,
    pub hb_min: Option<f64>,
    pub hdl_min: f64,
    pub esr_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::resolve(&PatientContext::default(), &SummaryConfig::default())
    }
}

impl Thresholds {
    pub fn resolve(context: &PatientContext, config: &SummaryConfig) -> Self {
        Self {
            tsh_max: tsh_ceiling(context.age_years, config.tsh_ceiling_unknown_age),
            ldl_max: ldl_ceiling(context.cardiovascular_risk),
            hb_min: hemoglobin_floor(context.sex),
            hdl_min: hdl_floor(context.sex),
            esr_max: esr_ceiling(context.sex, context.age_years),
        }
    }
}

pub fn tsh_ceiling(age: Option<u32>, unknown_age: f64) -> f64 {
    match age {
        Some(age) if age <= 65 => 3.0,
        Some(_) => 6.0,
        None => unknown_age,
    }
}

pub fn ldl_ceiling(risk: CardiovascularRisk) -> f64 {
    match risk {
        CardiovascularRisk::High => 70.0,
        CardiovascularRisk::Medium => 100.0,
        CardiovascularRisk::Low => 130.0,
    }
}

pub fn hemoglobin_floor(sex: Option<Sex>) -> Option<f64> {
    match sex {
        Some(Sex::Male) => Some(13.0),
        Some(Sex::Female) => Some(12.0),
        None => None,
    }
}

pub fn hdl_floor(sex: Option<Sex>) -> f64 {
    match sex {
        Some(Sex::Female) => 50.0,
        Some(Sex::Male) | None => 40.0,
    }
}

pub fn esr_ceiling(sex: Option<Sex>, age: Option<u32>) -> f64 {
    match (sex, age) {
        (Some(Sex::Female), Some(age)) if age >= 50 => 30.0,
        _ => 20.0,
    }
}

/// Merge caller-supplied context with demographics printed in the report.
/// Explicit values win.
pub fn resolve_context(input: &ContextInput, text: &str) -> PatientContext {
    PatientContext {
        age_years: input.age_years.or_else(|| extract_age(text)),
        sex: input.sex.or_else(|| extract_sex(text)),
        cardiovascular_risk: input.cardiovascular_risk,
    }
}

pub fn extract_age(text: &str) -> Option<u32> {
    let raw = find_first(text, AGE.as_slice())?;
    match raw.parse() {
        Ok(age) => Some(age),
        Err(err) => {
            tracing::warn!(%raw, %err, "ignoring unreadable age");
            None
        }
    }
}

pub fn extract_sex(text: &str) -> Option<Sex> {
    let raw = find_first(text, SEX.as_slice())?;
    if raw.eq_ignore_ascii_case("FEMENINO") {
        Some(Sex::Female)
    } else {
        Some(Sex::Male)
    }
}

/// First DD-MM-YYYY or DD/MM/YYYY date after the sample-collection label.
pub fn extract_report_date(text: &str) -> Option<NaiveDate> {
    let raw = find_first(text, SAMPLE_DATE.as_slice())?;
    match NaiveDate::parse_from_str(&raw.replace('/', "-"), "%d-%m-%Y") {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!(%raw, %err, "ignoring unreadable sample date");
            None
        }
    }
}

/// Display form used in the summary header.
pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsh_ceiling_follows_age() {
        assert_eq!(tsh_ceiling(Some(40), 6.0), 3.0);
        assert_eq!(tsh_ceiling(Some(65), 6.0), 3.0);
        assert_eq!(tsh_ceiling(Some(66), 6.0), 6.0);
        assert_eq!(tsh_ceiling(Some(0), 6.0), 3.0);
        assert_eq!(tsh_ceiling(None, 6.0), 6.0);
        assert_eq!(tsh_ceiling(None, 3.0), 3.0);
    }

    #[test]
    fn ldl_ceiling_follows_risk() {
        assert_eq!(ldl_ceiling(CardiovascularRisk::High), 70.0);
        assert_eq!(ldl_ceiling(CardiovascularRisk::Medium), 100.0);
        assert_eq!(ldl_ceiling(CardiovascularRisk::Low), 130.0);
    }

    #[test]
    fn sex_dependent_floors() {
        assert_eq!(hemoglobin_floor(Some(Sex::Male)), Some(13.0));
        assert_eq!(hemoglobin_floor(Some(Sex::Female)), Some(12.0));
        assert_eq!(hemoglobin_floor(None), None);
        assert_eq!(hdl_floor(Some(Sex::Female)), 50.0);
        assert_eq!(hdl_floor(None), 40.0);
    }

    #[test]
    fn esr_ceiling_for_older_women() {
        assert_eq!(esr_ceiling(Some(Sex::Female), Some(50)), 30.0);
        assert_eq!(esr_ceiling(Some(Sex::Female), Some(49)), 20.0);
        assert_eq!(esr_ceiling(Some(Sex::Male), Some(70)), 20.0);
        assert_eq!(esr_ceiling(Some(Sex::Female), None), 20.0);
    }

    #[test]
    fn demographics_come_from_text() {
        let text = "Paciente: PEREZ\nEdad: 58 años   Sexo: femenino\n";
        let ctx = resolve_context(&ContextInput::default(), text);
        assert_eq!(ctx.age_years, Some(58));
        assert_eq!(ctx.sex, Some(Sex::Female));
    }

    #[test]
    fn explicit_context_wins() {
        let input = ContextInput {
            age_years: Some(30),
            sex: Some(Sex::Male),
            cardiovascular_risk: CardiovascularRisk::High,
        };
        let ctx = resolve_context(&input, "Edad: 80 Sexo: FEMENINO");
        assert_eq!(ctx.age_years, Some(30));
        assert_eq!(ctx.sex, Some(Sex::Male));
        assert_eq!(ctx.cardiovascular_risk, CardiovascularRisk::High);
    }

    #[test]
    fn sample_date_is_reformatted() {
        let date = extract_report_date("TOMA DE MUESTRA:\n  05-03-2024 08:12").unwrap();
        assert_eq!(format_report_date(date), "05/03/24");

        let date = extract_report_date("Recep. Muestra 17/11/2023").unwrap();
        assert_eq!(format_report_date(date), "17/11/23");
    }

    #[test]
    fn date_without_label_is_ignored() {
        assert_eq!(extract_report_date("Emitido 05-03-2024"), None);
        assert_eq!(extract_report_date("TOMA MUESTRA 31-02-2024"), None);
    }
}
