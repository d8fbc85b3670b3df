use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use labsum_core::{CardiovascularRisk, ContextInput, LabSummaryError, Sex, SummaryConfig};
use labsum_report::summarize_report;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "labsum",
    about = "Summarize a lab report into flagged panel lines."
)]
struct Args {
    /// Report text file (or PDF when built with the `pdf` feature).
    #[arg(short, long)]
    input: PathBuf,

    /// Cardiovascular risk tier (low/medium/high, also bajo/medio/alto).
    #[arg(short, long, default_value = "low", value_parser = parse_risk)]
    risk: CardiovascularRisk,

    /// Patient age; overrides the age printed in the report.
    #[arg(long)]
    age: Option<u32>,

    /// Patient sex; overrides the sex printed in the report.
    #[arg(long, value_enum)]
    sex: Option<SexArg>,

    /// JSON file with a (partial) summary configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the full summary as JSON instead of plain lines.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SexArg {
    #[value(alias = "hombre")]
    Male,
    #[value(alias = "mujer")]
    Female,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

fn parse_risk(raw: &str) -> Result<CardiovascularRisk, String> {
    raw.parse().map_err(|err: LabSummaryError| err.to_string())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("labsum=info,labsum_report=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SummaryConfig::default(),
    };

    let text = read_report(&args.input)?;
    let input = ContextInput {
        age_years: args.age,
        sex: args.sex.map(Sex::from),
        cardiovascular_risk: args.risk,
    };

    let summary = match summarize_report(&text, &input, &config) {
        Ok(summary) => summary,
        Err(LabSummaryError::EmptyText) => {
            eprintln!("No data extracted from {:?}", args.input);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    for issue in &summary.issues {
        tracing::warn!(analyte = %issue.analyte, "{}", issue.message);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if summary.is_empty() {
        eprintln!("No lab values recognized in {:?}", args.input);
    } else {
        println!("{}", summary.plain_text());
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<SummaryConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read config {path:?}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config {path:?}"))
}

fn read_report(path: &Path) -> anyhow::Result<String> {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        return read_pdf(path);
    }
    std::fs::read_to_string(path).with_context(|| format!("Could not read file {path:?}"))
}

/// Page texts joined with newlines; pages without text are skipped.
#[cfg(feature = "pdf")]
fn read_pdf(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Could not read file {path:?}"))?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .with_context(|| format!("Could not extract text from {path:?}"))?;

    let mut text = String::new();
    for (index, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            tracing::debug!(page = index + 1, "page has no text");
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    Ok(text)
}

#[cfg(not(feature = "pdf"))]
fn read_pdf(path: &Path) -> anyhow::Result<String> {
    anyhow::bail!("{path:?} is a PDF; rebuild with `--features pdf` or pass extracted text")
}
