//! Command-line interface for finsight
//!
//! # Usage
//!
//! ```bash
//! # Optional remote providers
//! export OPENAI_API_KEY="..."     # primary
//! export GEMINI_API_KEY="..."     # secondary
//!
//! finsight run --dataset data.json --sector financial --format table
//! finsight list --category portfolio_risk
//! finsight select --sector technology
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use finsight_core::{
    AnalysisDefinition, Batch, Category, CompanyProfile, FinancialDataset, Language, Level, Sector,
    SizeClass,
};
use finsight_engine::{AnalysisRegistry, Engine, EngineConfig, RunOptions};
use finsight_inference::providers::{GeminiProvider, OpenAIProvider};
use finsight_inference::{InferenceProvider, RetryPolicy, RetryingProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "finsight")]
#[command(about = "Run financial analyses over a multi-period dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run analyses against a dataset
    Run(RunArgs),
    /// List the analysis catalog
    List(ListArgs),
    /// Show the analyses recommended for a sector
    Select(SelectArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Dataset JSON file (incomeStatement, balanceSheet, cashFlowStatement)
    #[arg(long)]
    dataset: PathBuf,

    /// Company sector, used to select analyses when no ids are given
    #[arg(long)]
    sector: Option<Sector>,

    #[arg(long)]
    size: Option<SizeClass>,

    /// Analyses already on file; skipped when selecting by sector
    #[arg(long, value_delimiter = ',')]
    prior: Vec<String>,

    /// Comma-separated analysis ids
    #[arg(long, value_delimiter = ',', conflicts_with = "all")]
    ids: Vec<String>,

    /// Run the whole catalog
    #[arg(long)]
    all: bool,

    /// en or ar
    #[arg(long)]
    language: Option<Language>,

    #[arg(long)]
    deadline_ms: Option<u64>,

    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Engine configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Only emit results at or above this confidence
    #[arg(long)]
    threshold: Option<f64>,

    /// Write output to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ListArgs {
    #[arg(long)]
    category: Option<Category>,

    #[arg(long)]
    level: Option<Level>,

    #[arg(long, default_value = "en")]
    language: Language,
}

#[derive(Parser, Debug)]
struct SelectArgs {
    #[arg(long)]
    sector: Sector,

    #[arg(long, value_delimiter = ',')]
    prior: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    finsight_utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::List(args) => list(&args),
        Commands::Select(args) => select(&args),
    }
}

/// Remote providers configured through the environment
///
/// OpenAI-compatible backends act as primary, Gemini as secondary.
fn providers_from_env() -> (
    Option<Arc<dyn InferenceProvider>>,
    Option<Arc<dyn InferenceProvider>>,
) {
    let primary = match OpenAIProvider::from_env() {
        Ok(provider) => {
            info!("Primary provider: {}", provider.config().model);
            Some(Arc::new(RetryingProvider::new(provider, RetryPolicy::default()))
                as Arc<dyn InferenceProvider>)
        }
        Err(e) => {
            debug!("No primary provider: {e}");
            None
        }
    };

    let secondary = match GeminiProvider::from_env() {
        Ok(provider) => {
            info!("Secondary provider: {}", provider.config().model);
            Some(Arc::new(RetryingProvider::new(provider, RetryPolicy::default()))
                as Arc<dyn InferenceProvider>)
        }
        Err(e) => {
            debug!("No secondary provider: {e}");
            None
        }
    };

    (primary, secondary)
}

fn build_engine(config: EngineConfig) -> anyhow::Result<Engine> {
    let (primary, secondary) = providers_from_env();
    let mut builder = Engine::builder().config(config);
    if let Some(provider) = primary {
        builder = builder.primary_provider(provider);
    }
    if let Some(provider) = secondary {
        builder = builder.secondary_provider(provider);
    }
    builder.build().context("Failed to build the analysis engine")
}

fn profile_from(sector: Sector, size: Option<SizeClass>, prior: &[String]) -> CompanyProfile {
    prior.iter().fold(
        CompanyProfile::new(sector).with_size(size.unwrap_or_default()),
        |profile, id| profile.with_prior_analysis(id.clone()),
    )
}

/// Ids to run: explicit ids, the whole catalog, or the sector selection
fn resolve_ids(engine: &Engine, args: &RunArgs, profile: Option<&CompanyProfile>) -> Vec<String> {
    if !args.ids.is_empty() {
        return args.ids.clone();
    }
    match profile {
        Some(profile) if !args.all => engine.selector().select_pending(profile),
        _ => engine.registry().ids(),
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    }
    .with_env_overrides()
    .context("Invalid FINSIGHT_* environment override")?;

    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            bail!("--threshold must be within [0, 1], got {threshold}");
        }
    }

    let engine = build_engine(config)?;

    let raw = std::fs::read_to_string(&args.dataset)
        .with_context(|| format!("Failed to read dataset {}", args.dataset.display()))?;
    let dataset = FinancialDataset::from_json(&raw).context("Failed to parse dataset")?;

    let profile = args
        .sector
        .map(|sector| profile_from(sector, args.size, &args.prior));
    let ids = resolve_ids(&engine, &args, profile.as_ref());

    let mut options = RunOptions::new();
    if let Some(language) = args.language {
        options = options.with_language(language);
    }
    if let Some(ms) = args.deadline_ms {
        options = options.with_deadline(Duration::from_millis(ms));
    }
    if let Some(max_in_flight) = args.max_in_flight {
        options = options.with_max_in_flight(max_in_flight);
    }
    if let Some(profile) = profile {
        options = options.with_profile(profile);
    }

    info!("Running {} analyses", ids.len());
    let batch = engine.run(&dataset, &ids, &options).await?;

    let batch = match args.threshold {
        Some(threshold) => Batch::new(batch.above_threshold(threshold).cloned().collect()),
        None => batch,
    };

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&batch)?,
        OutputFormat::Table => batch_table(&batch).to_string(),
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} results to {}", batch.len(), path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn batch_table(batch: &Batch) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Analysis", "Status", "Confidence", "Provider", "Duration (ms)"]);

    for result in batch {
        let status = match &result.provenance.failure {
            Some(failure) => failure.kind.to_string(),
            None => "ok".to_string(),
        };
        let provider = result
            .provenance
            .provider
            .clone()
            .or_else(|| result.provenance.strategy.map(|s| s.to_string()))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            result.definition_id.clone(),
            status,
            format!("{:.2}", result.confidence),
            provider,
            result.processing_duration_ms.to_string(),
        ]);
    }

    table
}

fn definitions_table<'a>(
    definitions: impl IntoIterator<Item = &'a AnalysisDefinition>,
    language: Language,
) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Id", "Name", "Category", "Level", "Years", "Strategy"]);

    for definition in definitions {
        table.add_row(vec![
            definition.id().to_string(),
            definition.name().get(language).to_string(),
            definition.category().to_string(),
            definition.level().to_string(),
            definition.required_years().to_string(),
            definition.strategy().to_string(),
        ]);
    }

    table
}

fn list(args: &ListArgs) -> anyhow::Result<()> {
    let registry = AnalysisRegistry::builtin().context("Built-in catalog is invalid")?;

    let definitions = registry.list_all().iter().filter(|d| {
        args.category.is_none_or(|c| d.category() == c) && args.level.is_none_or(|l| d.level() == l)
    });

    println!("{}", definitions_table(definitions, args.language));
    Ok(())
}

fn select(args: &SelectArgs) -> anyhow::Result<()> {
    let engine = Engine::builder()
        .build()
        .context("Failed to build the analysis engine")?;
    let profile = profile_from(args.sector, None, &args.prior);

    for id in engine.selector().select_pending(&profile) {
        println!("{id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_run(args: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(
            ["finsight", "run", "--dataset", "data.json"]
                .iter()
                .chain(args)
                .copied(),
        )
        .unwrap();
        match cli.command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_run_arguments() {
        let args = parse_run(&[
            "--sector",
            "financial",
            "--ids",
            "liquidity_ratios,var_analysis",
            "--language",
            "ar",
            "--format",
            "json",
        ]);

        assert_eq!(args.sector, Some(Sector::Financial));
        assert_eq!(args.ids, vec!["liquidity_ratios", "var_analysis"]);
        assert_eq!(args.language, Some(Language::Ar));
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[test]
    fn test_ids_conflict_with_all() {
        assert!(
            Cli::try_parse_from(["finsight", "run", "--dataset", "d.json", "--ids", "x", "--all"])
                .is_err()
        );
    }

    #[test]
    fn test_resolve_ids() {
        let engine = Engine::builder().build().unwrap();
        let profile = profile_from(Sector::Technology, None, &["market_ratios".to_string()]);

        let args = parse_run(&[]);
        assert_eq!(resolve_ids(&engine, &args, Some(&profile)).len(), 8);
        assert_eq!(resolve_ids(&engine, &args, None).len(), 30);

        let args = parse_run(&["--all"]);
        assert_eq!(resolve_ids(&engine, &args, Some(&profile)).len(), 30);

        let args = parse_run(&["--ids", "dupont_analysis"]);
        assert_eq!(resolve_ids(&engine, &args, Some(&profile)), vec!["dupont_analysis"]);
    }
}
