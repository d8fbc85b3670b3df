//! Blood smear ("frotis") composite from the three lineage findings.

use labsum_core::Analyte;

/// Findings that count as unremarkable for a lineage.
pub const NORMAL_FINDINGS: [&str; 2] = ["normal", "normales"];

pub const NORMAL_FROTIS: &str = "Normal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frotis {
    pub text: String,
    pub is_abnormal: bool,
}

pub fn is_normal_finding(finding: &str) -> bool {
    let finding = finding.trim().to_lowercase();
    NORMAL_FINDINGS.iter().any(|normal| *normal == finding)
}

/// Merge red-cell, white-cell and platelet findings.
///
/// Abnormal findings are listed as `GR ...; GB ...; PLQ ...` in lineage order.
/// With nothing abnormal the smear is `Normal` if anything was observed, and
/// absent when no lineage was reported at all.
pub fn resolve_frotis(
    red: Option<&str>,
    white: Option<&str>,
    platelet: Option<&str>,
) -> Option<Frotis> {
    let observed: Vec<(&str, &str)> = [
        (Analyte::RedCellMorphology, red),
        (Analyte::WhiteCellMorphology, white),
        (Analyte::PlateletMorphology, platelet),
    ]
    .into_iter()
    .filter_map(|(lineage, finding)| finding.map(|finding| (lineage.label(), finding)))
    .collect();

    if observed.is_empty() {
        return None;
    }

    let abnormal: Vec<String> = observed
        .iter()
        .filter(|(_, finding)| !is_normal_finding(finding))
        .map(|(code, finding)| format!("{code} {finding}"))
        .collect();

    Some(if abnormal.is_empty() {
        Frotis {
            text: NORMAL_FROTIS.to_string(),
            is_abnormal: false,
        }
    } else {
        Frotis {
            text: abnormal.join("; "),
            is_abnormal: true,
        }
    })
}
