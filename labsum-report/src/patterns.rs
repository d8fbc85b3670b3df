//! Declarative locator rules, one record per analyte.

use std::collections::HashMap;
use std::sync::LazyLock;

use labsum_core::Analyte;
use regex::{Regex, RegexBuilder};

/// Report blocks that need isolating before their fields are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Urinalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    /// Numeric when it parses, otherwise kept as printed. Only for fields
    /// that are never rated.
    Reported,
    Range,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    Identity,
    NumericTrim,
    RangeNormalize,
    MorphologyTrim,
}

/// Where and how to find one analyte. Locators are tried in order; the first
/// match wins. Matching is case-insensitive.
#[derive(Debug)]
pub struct AnalytePattern {
    pub analyte: Analyte,
    pub locators: &'static [&'static str],
    pub scope: Option<SectionKind>,
    pub kind: ValueKind,
    pub normalizer: Normalizer,
}

impl AnalytePattern {
    /// Compiled locators, in declaration order.
    pub fn regexes(&self) -> &'static [Regex] {
        COMPILED
            .get(&self.analyte)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

const fn numeric(analyte: Analyte, locators: &'static [&'static str]) -> AnalytePattern {
    AnalytePattern {
        analyte,
        locators,
        scope: None,
        kind: ValueKind::Numeric,
        normalizer: Normalizer::Identity,
    }
}

const fn reported(analyte: Analyte, locators: &'static [&'static str]) -> AnalytePattern {
    AnalytePattern {
        kind: ValueKind::Reported,
        ..numeric(analyte, locators)
    }
}

const fn electrolyte(analyte: Analyte, locators: &'static [&'static str]) -> AnalytePattern {
    AnalytePattern {
        normalizer: Normalizer::NumericTrim,
        ..numeric(analyte, locators)
    }
}

const fn urine_count(analyte: Analyte, locators: &'static [&'static str]) -> AnalytePattern {
    AnalytePattern {
        analyte,
        locators,
        scope: Some(SectionKind::Urinalysis),
        kind: ValueKind::Range,
        normalizer: Normalizer::RangeNormalize,
    }
}

const fn urine_text(
    analyte: Analyte,
    locators: &'static [&'static str],
    normalizer: Normalizer,
) -> AnalytePattern {
    AnalytePattern {
        analyte,
        locators,
        scope: Some(SectionKind::Urinalysis),
        kind: ValueKind::Categorical,
        normalizer,
    }
}

const fn morphology(analyte: Analyte, locators: &'static [&'static str]) -> AnalytePattern {
    AnalytePattern {
        analyte,
        locators,
        scope: None,
        kind: ValueKind::Categorical,
        normalizer: Normalizer::MorphologyTrim,
    }
}

/// Every analyte the engine recognizes.
pub static PATTERN_LIBRARY: &[AnalytePattern] = &[
    // Renal
    reported(Analyte::Creatinine, &[r"CREATININA\s+(\d[\d.]*)"]),
    numeric(Analyte::GlomerularFiltration, &[r"VFG.*?MDRD.*?(\d{2,3})"]),
    numeric(Analyte::UreaNitrogen, &[r"NITROGENO\s+UREICO\s+(\d[\d.]*)"]),
    numeric(Analyte::Urea, &[r"UREMIA\s+(\d[\d.]*)"]),
    numeric(Analyte::UricAcid, &[r"ACIDO\s+URICO\s+(\d[\d.]*)"]),
    numeric(Analyte::AlbuminCreatinineRatio, &[r"RELACION\s+MICRO.*?(\d[\d.]*)"]),
    electrolyte(Analyte::Sodium, &[r"SODIO\s+(\d[\d.]*)"]),
    electrolyte(Analyte::Potassium, &[r"POTASIO\s+(\d[\d.]*)"]),
    electrolyte(Analyte::Chloride, &[r"CLORO\s+(\d[\d.]*)"]),
    // Metabolic
    numeric(Analyte::Glucose, &[r"GLUCOSA\s+EN\s+SANGRE\s+(\d[\d.]*)"]),
    numeric(Analyte::Hba1c, &[r"HEMOGLOBINA\s+GLICADA\s+A1C\s+(\d+(?:\.\d+)?)\s*%"]),
    numeric(Analyte::OgttBasal, &[r"GLICEMIA\s+BASAL\s+(\d[\d.]*)"]),
    numeric(Analyte::Ogtt120, &[r"120\s*MIN.*?(\d[\d.]*)"]),
    numeric(Analyte::Tsh, &[r"TSH.*?(\d[\d.]*)"]),
    reported(Analyte::FreeT4, &[r"T4\s*LIBRE.*?(\d[\d.]*)"]),
    // Lipid
    numeric(Analyte::TotalCholesterol, &[r"COLESTEROL\s+TOTAL\s+(\d[\d.]*)"]),
    numeric(Analyte::Ldl, &[r"(?:LDL|COLESTEROL\s+LDL|C[-\s]?LDL).*?(\d[\d.]*)"]),
    numeric(Analyte::Hdl, &[r"(?:HDL|COLESTEROL\s+HDL|C[-\s]?HDL).*?(\d[\d.]*)"]),
    numeric(Analyte::Triglycerides, &[r"TRIGLICERIDOS\s+(\d[\d.]*)"]),
    // Hemogram
    numeric(Analyte::Hemoglobin, &[r"HEMOGLOBINA\s+(\d[\d.]*)"]),
    reported(Analyte::Hematocrit, &[r"HEMATOCRITO\s+(\d[\d.]*)"]),
    reported(Analyte::Mcv, &[r"V\.?C\.?M\.?\s+(\d[\d.]*)"]),
    reported(Analyte::Mchc, &[r"C\.?H\.?C\.?M\.?\s+(\d[\d.]*)"]),
    numeric(Analyte::Leukocytes, &[r"(?s)RECUENTO.*?LEUCOCITOS\s+(\d[\d.]*)"]),
    numeric(
        Analyte::Platelets,
        &[
            r"(?s)RECUENTO.*?PLAQUETAS\s+(\d[\d.]*)",
            r"PLAQUETAS\s+(\d[\d.]*)",
        ],
    ),
    numeric(Analyte::Esr, &[r"V\.?H\.?S\.?\s+(\d[\d.]*)"]),
    // Urinalysis
    urine_count(
        Analyte::UrineErythrocytes,
        &[r"ERITROCITOS\s+(\d+\s*[-‐‑‒–—−]\s*\d+|[<>]\s*\d+|\d+)"],
    ),
    urine_count(
        Analyte::UrineLeukocytes,
        &[r"LEUCOCITOS\s*\(MIC\)\s*(\d+\s*[-‐‑‒–—−]\s*\d+|[<>]\s*\d+|\d+)"],
    ),
    urine_text(
        Analyte::UrineBacteria,
        &[r"BACTERIAS\s+([^\t\n]+)"],
        Normalizer::MorphologyTrim,
    ),
    urine_text(
        Analyte::UrineNitrites,
        &[r"NITRITOS\s+(POSITIVO|NEGATIVO)"],
        Normalizer::Identity,
    ),
    urine_text(
        Analyte::UrineBilirubin,
        &[r"BILIRRUBINA\s+(POSITIVO|NEGATIVO)"],
        Normalizer::Identity,
    ),
    urine_text(
        Analyte::UrineProtein,
        &[r"PROTEINAS\s+(POSITIVO|NEGATIVO)"],
        Normalizer::Identity,
    ),
    urine_text(
        Analyte::UrineGlucose,
        &[r"GLUCOSA\s+(POSITIVO|NEGATIVO)"],
        Normalizer::Identity,
    ),
    // Blood smear morphology
    morphology(
        Analyte::RedCellMorphology,
        &[r"MORFOLOG[IÍ]A\s+SERIE\s+ROJA\s*[:\s]+([^\n\r]+)"],
    ),
    morphology(
        Analyte::WhiteCellMorphology,
        &[r"MORFOLOG[IÍ]A\s+SERIE\s+BLANCA\s*[:\s]+([^\n\r]+)"],
    ),
    morphology(
        Analyte::PlateletMorphology,
        &[
            r"MORFOLOG[IÍ]A\s+(?:DE\s+)?PLAQUETAS?\s*[:\s]+([^\n\r]+)",
            r"MORFOLOG[IÍ]A\s+PLAQUETARIA\s*[:\s]+([^\n\r]+)",
        ],
    ),
];

static COMPILED: LazyLock<HashMap<Analyte, Vec<Regex>>> = LazyLock::new(|| {
    PATTERN_LIBRARY
        .iter()
        .map(|pattern| {
            let regexes = pattern.locators.iter().map(|src| compile(src)).collect();
            (pattern.analyte, regexes)
        })
        .collect()
});

/// Compile a static, case-insensitive locator.
pub(crate) fn compile(src: &str) -> Regex {
    RegexBuilder::new(src)
        .case_insensitive(true)
        .build()
        .expect("Invalid locator pattern")
}

/// Look up the rule for `analyte`.
pub fn pattern_for(analyte: Analyte) -> Option<&'static AnalytePattern> {
    PATTERN_LIBRARY
        .iter()
        .find(|pattern| pattern.analyte == analyte)
}
