//! Lab report text to flagged `LabSummary` lines.

pub mod classify;
pub mod context;
pub mod extract;
pub mod morphology;
pub mod normalize;
pub mod panels;
pub mod patterns;
pub mod section;

use std::collections::HashMap;

use labsum_core::{
    Analyte, ContextInput, ExtractedValue, FieldIssue, LabSummary, LabSummaryError, SectionWindow,
    SummaryConfig,
};

use crate::context::Thresholds;
use crate::panels::Findings;
use crate::patterns::{AnalytePattern, SectionKind, PATTERN_LIBRARY};

/// Summarize the text of one lab report.
///
/// Only an empty report is an error. Analytes missing from the text are left
/// out, and a field that matched but could not be read is listed in
/// `issues` without affecting any other field.
pub fn summarize_report(
    text: &str,
    input: &ContextInput,
    config: &SummaryConfig,
) -> Result<LabSummary, LabSummaryError> {
    if text.trim().is_empty() {
        return Err(LabSummaryError::EmptyText);
    }

    let context = context::resolve_context(input, text);
    let thresholds = Thresholds::resolve(&context, config);
    tracing::debug!(?context, ?thresholds, "resolved patient context");

    let (findings, issues) = collect_findings(text, &thresholds, config.urinalysis_window);
    let report_date = context::extract_report_date(text);
    let lines = panels::compose(&findings, report_date, &config.markup);

    tracing::info!(
        values = findings.values.len(),
        lines = lines.plain.len(),
        issues = issues.len(),
        "report summarized"
    );

    Ok(LabSummary {
        report_date,
        context,
        rich_lines: lines.rich,
        plain_lines: lines.plain,
        issues,
    })
}

/// Run every rule in the pattern library over `text` and classify the hits.
pub fn collect_findings(
    text: &str,
    thresholds: &Thresholds,
    window: SectionWindow,
) -> (Findings, Vec<FieldIssue>) {
    let mut sections: HashMap<SectionKind, Option<&str>> = HashMap::new();
    let mut findings = Findings::default();
    let mut issues = Vec::new();

    for pattern in PATTERN_LIBRARY {
        let haystack = match pattern.scope {
            None => Some(text),
            Some(kind) => *sections.entry(kind).or_insert_with(|| {
                let section = section::section_text(text, kind, window);
                if section.is_none() {
                    tracing::debug!(?kind, "section not present");
                }
                section
            }),
        };
        let Some(haystack) = haystack else {
            continue;
        };

        match read_field(pattern, haystack, thresholds) {
            Ok(Some(value)) => {
                findings.values.insert(value.analyte, value);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(analyte = %pattern.analyte, %err, "field skipped");
                issues.push(FieldIssue {
                    analyte: pattern.analyte,
                    message: err.to_string(),
                });
            }
        }
    }

    let lineage = |analyte: Analyte| {
        findings
            .get(analyte)
            .map(|value| value.normalized_text.as_str())
    };
    let frotis = morphology::resolve_frotis(
        lineage(Analyte::RedCellMorphology),
        lineage(Analyte::WhiteCellMorphology),
        lineage(Analyte::PlateletMorphology),
    );
    findings.frotis = frotis;

    (findings, issues)
}

fn read_field(
    pattern: &AnalytePattern,
    haystack: &str,
    thresholds: &Thresholds,
) -> Result<Option<ExtractedValue>, LabSummaryError> {
    extract::extract(pattern, haystack)?
        .map(|reading| classify::evaluate(reading, thresholds))
        .transpose()
}
