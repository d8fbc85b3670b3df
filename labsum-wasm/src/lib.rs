//! Framework-neutral WASM <-> JavaScript bridge.

use labsum_core::{CardiovascularRisk, ContextInput, LabSummaryError, Sex, SummaryConfig};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsContext {
    #[serde(default, alias = "ageYears")]
    age_years: Option<u32>,
    #[serde(default)]
    sex: Option<Sex>,
    #[serde(default, alias = "cardiovascularRisk")]
    cardiovascular_risk: Option<String>,
}

impl TryFrom<JsContext> for ContextInput {
    type Error = LabSummaryError;

    fn try_from(ctx: JsContext) -> Result<Self, Self::Error> {
        let cardiovascular_risk = match ctx.cardiovascular_risk {
            Some(raw) => raw.parse()?,
            None => CardiovascularRisk::default(),
        };
        Ok(ContextInput {
            age_years: ctx.age_years,
            sex: ctx.sex,
            cardiovascular_risk,
        })
    }
}

#[derive(Deserialize)]
struct JsSummaryConfig {
    #[serde(default)]
    flag_open: Option<String>,
    #[serde(default)]
    flag_close: Option<String>,
    #[serde(default)]
    date_open: Option<String>,
    #[serde(default)]
    date_close: Option<String>,
    #[serde(default)]
    urinalysis_header_skip: Option<usize>,
    #[serde(default)]
    urinalysis_max_chars: Option<usize>,
    #[serde(default)]
    tsh_ceiling_unknown_age: Option<f64>,
}

impl From<JsSummaryConfig> for SummaryConfig {
    fn from(cfg: JsSummaryConfig) -> Self {
        let mut base = SummaryConfig::default();
        if let Some(open) = cfg.flag_open {
            base.markup.flag_open = open;
        }
        if let Some(close) = cfg.flag_close {
            base.markup.flag_close = close;
        }
        if let Some(open) = cfg.date_open {
            base.markup.date_open = open;
        }
        if let Some(close) = cfg.date_close {
            base.markup.date_close = close;
        }
        if let Some(skip) = cfg.urinalysis_header_skip {
            base.urinalysis_window.header_skip = skip;
        }
        if let Some(max) = cfg.urinalysis_max_chars {
            base.urinalysis_window.max_chars = max;
        }
        if let Some(ceiling) = cfg.tsh_ceiling_unknown_age {
            base.tsh_ceiling_unknown_age = ceiling;
        }
        base
    }
}

/// Summarize report text for a browser front end. Returns the serialized
/// `LabSummary`.
#[wasm_bindgen]
pub fn summarize_report(
    text: &str,
    context: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let ctx: JsContext = from_value(context)
        .map_err(|err| JsValue::from_str(&format!("Could not read context: {err}")))?;
    let input = ContextInput::try_from(ctx).map_err(format_summary_error)?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsSummaryConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            SummaryConfig::from(cfg)
        }
        None => SummaryConfig::default(),
    };

    let summary =
        labsum_report::summarize_report(text, &input, &cfg).map_err(format_summary_error)?;

    to_value(&summary).map_err(|err| JsValue::from_str(&format!("Could not serialize summary: {err}")))
}

fn format_summary_error(err: LabSummaryError) -> JsValue {
    JsValue::from_str(&format!("Lab summary error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_context_accepts_spanish_risk() {
        let ctx = JsContext {
            age_years: Some(70),
            sex: Some(Sex::Female),
            cardiovascular_risk: Some("Alto".to_string()),
        };
        let input = ContextInput::try_from(ctx).unwrap();
        assert_eq!(input.cardiovascular_risk, CardiovascularRisk::High);
        assert_eq!(input.age_years, Some(70));
    }

    #[test]
    fn js_context_rejects_unknown_risk() {
        let ctx = JsContext {
            age_years: None,
            sex: None,
            cardiovascular_risk: Some("extreme".to_string()),
        };
        assert!(ContextInput::try_from(ctx).is_err());
    }

    #[test]
    fn js_config_overlays_defaults() {
        let cfg = SummaryConfig::from(JsSummaryConfig {
            flag_open: Some("<mark>".to_string()),
            flag_close: Some("</mark>".to_string()),
            date_open: None,
            date_close: None,
            urinalysis_header_skip: None,
            urinalysis_max_chars: Some(2000),
            tsh_ceiling_unknown_age: None,
        });
        assert_eq!(cfg.markup.flag("5", true), "<mark>5</mark>");
        assert_eq!(cfg.markup.date_open, "<b>");
        assert_eq!(cfg.urinalysis_window.header_skip, 100);
        assert_eq!(cfg.urinalysis_window.max_chars, 2000);
        assert_eq!(cfg.tsh_ceiling_unknown_age, 6.0);
    }

    #[test]
    fn js_config_replaces_date_markup() {
        let cfg = SummaryConfig::from(JsSummaryConfig {
            flag_open: Some("**".to_string()),
            flag_close: Some("**".to_string()),
            date_open: Some("_".to_string()),
            date_close: Some("_".to_string()),
            urinalysis_header_skip: None,
            urinalysis_max_chars: None,
            tsh_ceiling_unknown_age: None,
        });
        let input = ContextInput {
            age_years: Some(40),
            ..ContextInput::default()
        };
        let summary = labsum_report::summarize_report(
            "TOMA DE MUESTRA: 05-03-2024\nTSH 4.5",
            &input,
            &cfg,
        )
        .unwrap();
        assert_eq!(summary.rich_lines, vec!["_05/03/24:_ TSH **4.5**"]);
    }
}
