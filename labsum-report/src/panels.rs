//! Groups classified values into clinical panels and renders the summary lines.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use labsum_core::{Analyte, ExtractedValue, LabValue, Markup};

use crate::context::format_report_date;
use crate::morphology::Frotis;

/// Everything the panel builders read from.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    pub values: BTreeMap<Analyte, ExtractedValue>,
    pub frotis: Option<Frotis>,
}

impl Findings {
    pub fn get(&self, analyte: Analyte) -> Option<&ExtractedValue> {
        self.values.get(&analyte)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Renal,
    Urinalysis,
    Metabolic,
    Hemogram,
    Lipid,
}

pub type PanelBuilder = fn(&Findings) -> Panel;

/// Display order of the summary.
pub const PANEL_ORDER: [(PanelKind, PanelBuilder); 5] = [
    (PanelKind::Renal, renal_panel),
    (PanelKind::Urinalysis, urinalysis_panel),
    (PanelKind::Metabolic, metabolic_panel),
    (PanelKind::Hemogram, hemogram_panel),
    (PanelKind::Lipid, lipid_panel),
];

#[derive(Debug, Clone, PartialEq)]
struct Part {
    text: String,
    abnormal: bool,
}

/// `<label> <value>[/<value>...]<suffix>`
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    label: &'static str,
    parts: Vec<Part>,
    suffix: &'static str,
}

impl Token {
    fn new(label: &'static str, text: impl Into<String>, abnormal: bool) -> Self {
        Self {
            label,
            parts: vec![Part {
                text: text.into(),
                abnormal,
            }],
            suffix: "",
        }
    }

    fn of(value: &ExtractedValue) -> Self {
        Self::new(
            value.analyte.label(),
            value.normalized_text.clone(),
            value.is_abnormal,
        )
    }

    fn composite(label: &'static str, values: &[&ExtractedValue]) -> Self {
        Self {
            label,
            parts: values
                .iter()
                .map(|value| Part {
                    text: value.normalized_text.clone(),
                    abnormal: value.is_abnormal,
                })
                .collect(),
            suffix: "",
        }
    }

    fn with_suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self
    }

    fn render(&self, markup: Option<&Markup>) -> String {
        let values = self
            .parts
            .iter()
            .map(|part| match markup {
                Some(markup) => markup.flag(&part.text, part.abnormal),
                None => part.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("/");
        format!("{} {values}{}", self.label, self.suffix)
    }
}

/// One clinical group of tokens; rendered only when it has any.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    prefix: Option<&'static str>,
    tokens: Vec<Token>,
}

impl Panel {
    fn new() -> Self {
        Self {
            prefix: None,
            tokens: Vec::new(),
        }
    }

    fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Push the single-value token for `analyte` when it was found.
    fn push_value(&mut self, findings: &Findings, analyte: Analyte) {
        if let Some(value) = findings.get(analyte) {
            self.push(Token::of(value));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Rich and plain renderings, or `None` for an empty panel.
    pub fn render(&self, markup: &Markup) -> Option<(String, String)> {
        if self.is_empty() {
            return None;
        }
        let line = |markup: Option<&Markup>| {
            let body = self
                .tokens
                .iter()
                .map(|token| token.render(markup))
                .collect::<Vec<_>>()
                .join(" ");
            match self.prefix {
                Some(prefix) => format!("{prefix} {body}"),
                None => body,
            }
        };
        Some((line(Some(markup)), line(None)))
    }
}

fn renal_panel(findings: &Findings) -> Panel {
    let mut panel = Panel::new();
    for analyte in [
        Analyte::Creatinine,
        Analyte::GlomerularFiltration,
        Analyte::UreaNitrogen,
        Analyte::Urea,
        Analyte::UricAcid,
    ] {
        panel.push_value(findings, analyte);
    }

    if let (Some(na), Some(k), Some(cl)) = (
        findings.get(Analyte::Sodium),
        findings.get(Analyte::Potassium),
        findings.get(Analyte::Chloride),
    ) {
        panel.push(Token::composite("ELP", &[na, k, cl]));
    }

    panel.push_value(findings, Analyte::AlbuminCreatinineRatio);
    panel
}

fn urinalysis_panel(findings: &Findings) -> Panel {
    let mut panel = Panel::new();
    panel.prefix = Some("OC");
    for analyte in [
        Analyte::UrineErythrocytes,
        Analyte::UrineLeukocytes,
        Analyte::UrineBacteria,
        Analyte::UrineNitrites,
    ] {
        panel.push_value(findings, analyte);
    }

    // A negative bilirubin is not worth a token.
    if let Some(bilirubin) = findings.get(Analyte::UrineBilirubin) {
        if bilirubin.is_abnormal {
            panel.push(Token::of(bilirubin));
        }
    }

    panel.push_value(findings, Analyte::UrineProtein);
    panel.push_value(findings, Analyte::UrineGlucose);
    panel
}

fn metabolic_panel(findings: &Findings) -> Panel {
    let mut panel = Panel::new();
    panel.push_value(findings, Analyte::Glucose);

    if let Some(hba1c) = findings.get(Analyte::Hba1c) {
        panel.push(Token::new(
            "HbA1c",
            format!("{}%", hba1c.normalized_text),
            hba1c.is_abnormal,
        ));
    }

    if let (Some(basal), Some(late)) = (
        findings.get(Analyte::OgttBasal),
        findings.get(Analyte::Ogtt120),
    ) {
        panel.push(Token::composite("PTGO", &[basal, late]));
    }

    panel.push_value(findings, Analyte::Tsh);
    panel.push_value(findings, Analyte::FreeT4);
    panel
}

fn hemogram_panel(findings: &Findings) -> Panel {
    let mut panel = Panel::new();

    let anemic = findings
        .get(Analyte::Hemoglobin)
        .is_some_and(|hb| hb.is_abnormal);
    panel.push_value(findings, Analyte::Hemoglobin);
    if anemic {
        panel.push_value(findings, Analyte::Mcv);
        panel.push_value(findings, Analyte::Mchc);
    }
    panel.push_value(findings, Analyte::Hematocrit);

    if let Some(wbc) = findings.get(Analyte::Leukocytes) {
        // Reported in thousands per microliter; shown as cells per microliter.
        let text = match wbc.value {
            LabValue::Scalar(thousands) => format!("{}", (thousands * 1000.0).round() as i64),
            _ => wbc.normalized_text.clone(),
        };
        panel.push(Token::new(wbc.analyte.label(), text, wbc.is_abnormal));
    }

    if let Some(platelets) = findings.get(Analyte::Platelets) {
        panel.push(Token::of(platelets).with_suffix("K"));
    }

    panel.push_value(findings, Analyte::Esr);

    if let Some(frotis) = &findings.frotis {
        panel.push(Token::new("Frotis", frotis.text.clone(), frotis.is_abnormal));
    }
    panel
}

fn lipid_panel(findings: &Findings) -> Panel {
    let mut panel = Panel::new();
    for analyte in [
        Analyte::TotalCholesterol,
        Analyte::Ldl,
        Analyte::Hdl,
        Analyte::Triglycerides,
    ] {
        panel.push_value(findings, analyte);
    }
    panel
}

/// Rich and plain summary lines, same length and order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryLines {
    pub rich: Vec<String>,
    pub plain: Vec<String>,
}

/// Run every panel builder in order and prefix the first line with the date.
pub fn compose(findings: &Findings, date: Option<NaiveDate>, markup: &Markup) -> SummaryLines {
    let mut lines = SummaryLines::default();

    for (kind, build) in PANEL_ORDER {
        let panel = build(findings);
        let Some((rich, plain)) = panel.render(markup) else {
            tracing::debug!(?kind, "panel has no values");
            continue;
        };
        tracing::debug!(?kind, tokens = panel.tokens.len(), "panel composed");
        lines.rich.push(rich);
        lines.plain.push(plain);
    }

    if let (Some(date), Some(rich), Some(plain)) =
        (date, lines.rich.first_mut(), lines.plain.first_mut())
    {
        let date = format_report_date(date);
        *rich = format!("{}{date}:{} {rich}", markup.date_open, markup.date_close);
        *plain = format!("{date}: {plain}");
    }

    lines
}
