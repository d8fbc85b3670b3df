//! Shared data model for lab report summaries.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tuning knobs for extraction and rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    /// Markers wrapped around highlighted values in the rich lines.
    pub markup: Markup,
    /// Scan bounds for the urinalysis block.
    pub urinalysis_window: SectionWindow,
    /// TSH ceiling applied when the patient's age is not known.
    pub tsh_ceiling_unknown_age: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            markup: Markup::default(),
            urinalysis_window: SectionWindow::default(),
            tsh_ceiling_unknown_age: 6.0,
        }
    }
}

/// Highlight markers for the rich output. The plain output never carries them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Markup {
    pub flag_open: String,
    pub flag_close: String,
    pub date_open: String,
    pub date_close: String,
}

impl Default for Markup {
    fn default() -> Self {
        Self {
            flag_open: "<span style='color:red'><b>".to_string(),
            flag_close: "</b></span>".to_string(),
            date_open: "<b>".to_string(),
            date_close: "</b>".to_string(),
        }
    }
}

impl Markup {
    /// Wrap `value` in the flag markers when `abnormal` is set.
    pub fn flag(&self, value: &str, abnormal: bool) -> String {
        if abnormal {
            format!("{}{value}{}", self.flag_open, self.flag_close)
        } else {
            value.to_string()
        }
    }
}

/// Character offsets bounding a section search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SectionWindow {
    /// End anchors are only accepted after this many characters past the start.
    pub header_skip: usize,
    /// Hard cap on the section length.
    pub max_chars: usize,
}

impl Default for SectionWindow {
    fn default() -> Self {
        Self {
            header_skip: 100,
            max_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Cardiovascular risk tier chosen by the clinician.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CardiovascularRisk {
    #[default]
    Low,
    Medium,
    High,
}

impl FromStr for CardiovascularRisk {
    type Err = LabSummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "bajo" => Ok(Self::Low),
            "medium" | "medio" => Ok(Self::Medium),
            "high" | "alto" => Ok(Self::High),
            other => Err(LabSummaryError::Config(format!(
                "unknown cardiovascular risk tier: {other}"
            ))),
        }
    }
}

/// What the caller knows about the patient. Missing demographics are filled
/// from the report text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextInput {
    #[serde(default)]
    pub age_years: Option<u32>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub cardiovascular_risk: CardiovascularRisk,
}

/// Resolved patient context, fixed for the duration of one report.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientContext {
    pub age_years: Option<u32>,
    pub sex: Option<Sex>,
    pub cardiovascular_risk: CardiovascularRisk,
}

/// Every analyte the engine knows how to locate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Analyte {
    Creatinine,
    GlomerularFiltration,
    UreaNitrogen,
    Urea,
    UricAcid,
    AlbuminCreatinineRatio,
    Sodium,
    Potassium,
    Chloride,
    Glucose,
    Hba1c,
    OgttBasal,
    Ogtt120,
    Tsh,
    FreeT4,
    TotalCholesterol,
    Ldl,
    Hdl,
    Triglycerides,
    Hemoglobin,
    Hematocrit,
    Mcv,
    Mchc,
    Leukocytes,
    Platelets,
    Esr,
    UrineErythrocytes,
    UrineLeukocytes,
    UrineBacteria,
    UrineNitrites,
    UrineBilirubin,
    UrineProtein,
    UrineGlucose,
    RedCellMorphology,
    WhiteCellMorphology,
    PlateletMorphology,
}

impl Analyte {
    /// Short label used in the summary line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Creatinine => "Crea",
            Self::GlomerularFiltration => "VFG",
            Self::UreaNitrogen => "BUN",
            Self::Urea => "Urea",
            Self::UricAcid => "AU",
            Self::AlbuminCreatinineRatio => "RAC",
            Self::Sodium => "Na",
            Self::Potassium => "K",
            Self::Chloride => "Cl",
            Self::Glucose => "Glu",
            Self::Hba1c => "HbA1c",
            Self::OgttBasal => "PTGO basal",
            Self::Ogtt120 => "PTGO 120",
            Self::Tsh => "TSH",
            Self::FreeT4 => "T4L",
            Self::TotalCholesterol => "CT",
            Self::Ldl => "LDL",
            Self::Hdl => "HDL",
            Self::Triglycerides => "TG",
            Self::Hemoglobin => "Hb",
            Self::Hematocrit => "Hcto",
            Self::Mcv => "VCM",
            Self::Mchc => "CHCM",
            Self::Leukocytes => "GB",
            Self::Platelets => "PLQ",
            Self::Esr => "VHS",
            Self::UrineErythrocytes => "GR",
            Self::UrineLeukocytes => "GB",
            Self::UrineBacteria => "Bacterias",
            Self::UrineNitrites => "Nitritos",
            Self::UrineBilirubin => "Bilirrubina",
            Self::UrineProtein => "Proteinas",
            Self::UrineGlucose => "Glucosa",
            Self::RedCellMorphology => "GR",
            Self::WhiteCellMorphology => "GB",
            Self::PlateletMorphology => "PLQ",
        }
    }
}

impl fmt::Display for Analyte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Typed lab value. Ranges stay textual because reports print them as such.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LabValue {
    Scalar(f64),
    Range(String),
    Categorical(String),
}

/// Reference used to decide whether a value is abnormal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceRule {
    Bounds { low: Option<f64>, high: Option<f64> },
    Expected(String),
    OneOf(Vec<String>),
    /// Shown for context, never flagged.
    Unrated,
}

impl ReferenceRule {
    pub fn range(low: f64, high: f64) -> Self {
        Self::Bounds {
            low: Some(low),
            high: Some(high),
        }
    }

    pub fn at_least(low: f64) -> Self {
        Self::Bounds {
            low: Some(low),
            high: None,
        }
    }

    pub fn at_most(high: f64) -> Self {
        Self::Bounds {
            low: None,
            high: Some(high),
        }
    }
}

/// One located and classified analyte.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedValue {
    pub analyte: Analyte,
    pub raw_text: String,
    pub normalized_text: String,
    pub value: LabValue,
    pub is_abnormal: bool,
}

/// A field that matched but could not be interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldIssue {
    pub analyte: Analyte,
    pub message: String,
}

/// Final output: parallel rich and plain lines, plus per-field problems.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LabSummary {
    pub report_date: Option<NaiveDate>,
    pub context: PatientContext,
    pub rich_lines: Vec<String>,
    pub plain_lines: Vec<String>,
    #[serde(default)]
    pub issues: Vec<FieldIssue>,
}

impl LabSummary {
    pub fn is_empty(&self) -> bool {
        self.plain_lines.is_empty()
    }

    /// Plain lines joined for copy/paste.
    pub fn plain_text(&self) -> String {
        self.plain_lines.join("\n")
    }
}

/// Errors raised while building a summary.
#[derive(Debug, thiserror::Error)]
pub enum LabSummaryError {
    #[error("no data extracted from the report")]
    EmptyText,
    #[error("{analyte}: captured {raw:?} is not a number")]
    MalformedNumeric { analyte: Analyte, raw: String },
    #[error("{analyte}: reference rule does not apply to value {value:?}")]
    RuleMismatch { analyte: Analyte, value: LabValue },
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_accepts_english_and_spanish() {
        assert_eq!("alto".parse::<CardiovascularRisk>().unwrap(), CardiovascularRisk::High);
        assert_eq!(" Medium ".parse::<CardiovascularRisk>().unwrap(), CardiovascularRisk::Medium);
        assert!("extreme".parse::<CardiovascularRisk>().is_err());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: SummaryConfig =
            serde_json::from_str(r#"{"markup": {"flag_open": "**", "flag_close": "**"}}"#).unwrap();
        assert_eq!(cfg.markup.flag("7", true), "**7**");
        assert_eq!(cfg.markup.date_open, "<b>");
        assert_eq!(cfg.urinalysis_window, SectionWindow::default());
        assert_eq!(cfg.tsh_ceiling_unknown_age, 6.0);
    }

    #[test]
    fn context_input_defaults_to_low_risk() {
        let input: ContextInput = serde_json::from_str(r#"{"age_years": 40}"#).unwrap();
        assert_eq!(input.cardiovascular_risk, CardiovascularRisk::Low);
        assert_eq!(input.sex, None);
    }
}
