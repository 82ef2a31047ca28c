use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use job_parser::{
    JobParser, MemoryJobStore, NormalizedJobRecord, ParserConfig, RawSource, SalaryFilter,
};

#[derive(Parser)]
#[command(name = "job-parser", about = "Extract normalized job postings from pages and records")]
struct Cli {
    /// JSON config file; JOB_PARSER_* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and parse a single posting
    Parse { url: String },
    /// Fetch and parse many postings, skipping failures
    ParseMany {
        #[arg(required = true)]
        urls: Vec<String>,
        /// Keep only postings whose salary overlaps e.g. "50000-70000"
        #[arg(long)]
        salary: Option<String>,
        /// Drop postings with the same title and company as an earlier one
        #[arg(long)]
        dedupe: bool,
    },
    /// Normalize a JSON array of posting objects (use - for stdin)
    Bulk {
        file: PathBuf,
        #[arg(long)]
        salary: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse { url } => {
            let parser = JobParser::http(config)?;
            let record = parser
                .parse_one(&url)
                .await
                .with_context(|| format!("parsing {}", url))?;
            print_json(&record)?;
        }
        Commands::ParseMany { urls, salary, dedupe } => {
            let filter = salary_filter(salary.as_deref())?;
            let parser = JobParser::http(config)?;
            let sources = urls.into_iter().map(RawSource::Url);

            let records = if dedupe {
                let store = MemoryJobStore::new().with_reject_duplicates(true);
                let report = parser.ingest_many(&store, sources).await;
                report.stored.into_iter().map(|s| s.record).collect()
            } else {
                parser.parse_many(sources).await.into_records()
            };
            print_json(&apply_salary_filter(records, filter.as_ref()))?;
        }
        Commands::Bulk { file, salary } => {
            let filter = salary_filter(salary.as_deref())?;
            let input = read_input(&file)?;
            let objects: Vec<Map<String, Value>> =
                serde_json::from_str(&input).context("bulk input must be a JSON array of objects")?;
            let records = JobParser::offline(config).parse_bulk(&objects);
            print_json(&apply_salary_filter(records, filter.as_ref()))?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<ParserConfig> {
    let base = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ParserConfig::from_json_str(&raw)?
        }
        None => ParserConfig::default(),
    };
    Ok(base.merge_env(|key| std::env::var(key).ok())?)
}

fn read_input(path: &std::path::Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        return Ok(std::io::read_to_string(std::io::stdin())?);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn salary_filter(raw: Option<&str>) -> anyhow::Result<Option<SalaryFilter>> {
    raw.map(|s| SalaryFilter::parse(s).with_context(|| format!("invalid salary filter {:?}", s)))
        .transpose()
}

/// Records without a parsable salary never match a filter.
fn apply_salary_filter(
    records: Vec<NormalizedJobRecord>,
    filter: Option<&SalaryFilter>,
) -> Vec<NormalizedJobRecord> {
    match filter {
        Some(filter) => records
            .into_iter()
            .filter(|r| r.salary_range().is_some_and(|range| filter.matches(&range)))
            .collect(),
        None => records,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
