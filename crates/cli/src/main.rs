use anatomist::pipeline::{self, ParseFailurePolicy, ScanOptions, ScanResult};
use clap::{Parser, ValueEnum};
use common::TargetConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Separator of `ENTRYSCAN_CLASSPATH` and comma-free `--classpath` lists.
const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

#[derive(Parser)]
#[command(name = "entryscan", version)]
#[command(about = "Find framework entry points in Java source trees", long_about = None)]
struct Cli {
    /// Source roots to scan and report on.
    #[arg(required = true)]
    roots: Vec<PathBuf>,

    /// Dependency jars or class directories, in lookup order.
    #[arg(long, env = "ENTRYSCAN_CLASSPATH", value_delimiter = PATH_LIST_SEPARATOR)]
    classpath: Vec<PathBuf>,

    /// Source roots read for marker definitions only (never reported).
    #[arg(long = "library-sources")]
    library_sources: Vec<PathBuf>,

    /// Additional target interface (canonical name).
    #[arg(long = "interface")]
    interfaces: Vec<String>,

    /// Additional target annotation (canonical name).
    #[arg(long = "annotation")]
    annotations: Vec<String>,

    /// JSON file with `interfaces` and `annotations` arrays.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not include the built-in Spring lifecycle targets.
    #[arg(long)]
    no_baseline: bool,

    /// Abort on the first source file that fails to parse.
    #[arg(long)]
    strict: bool,

    /// Debug-level logging.
    #[arg(long, short)]
    verbose: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: .env: {}", e);
        }
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = ScanOptions {
        source_roots: cli.roots.clone(),
        library_sources: cli.library_sources.clone(),
        classpath: cli.classpath.clone(),
        targets: build_targets(&cli)?,
        parse_failures: if cli.strict {
            ParseFailurePolicy::Abort
        } else {
            ParseFailurePolicy::Skip
        },
    };

    let result = pipeline::run(&options)?;

    match cli.format {
        Format::Text => print!("{}", render_text(&result)),
        Format::Json => println!("{}", render_json(&result)?),
    }

    Ok(())
}

/// Logs go to stderr so the report on stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Baseline (unless disabled) ∪ config file ∪ command-line targets.
fn build_targets(cli: &Cli) -> anyhow::Result<TargetConfig> {
    let mut targets = if cli.no_baseline {
        TargetConfig::new()
    } else {
        TargetConfig::baseline()
    };

    if let Some(path) = &cli.config {
        targets.merge(TargetConfig::from_json_file(path)?);
    }
    for identity in &cli.interfaces {
        targets.add_interface(identity.as_str());
    }
    for identity in &cli.annotations {
        targets.add_annotation(identity.as_str());
    }

    if targets.is_empty() {
        tracing::warn!("no targets configured; nothing can match");
    }
    Ok(targets)
}

fn render_text(result: &ScanResult) -> String {
    let mut out = format!("Found {} entry point conditions\n", result.triggers.len());
    for (label, locations) in result.triggers.iter() {
        out.push_str(&format!("Condition: {}\n", label));
        for location in locations {
            out.push_str(&format!(" - {}\n", location));
        }
    }
    out.push_str(&format!(
        "Scanned {} files, {} declarations; {} diagnostics\n",
        result.files,
        result.declarations,
        result.diagnostics.len()
    ));
    out
}

fn render_json(result: &ScanResult) -> serde_json::Result<String> {
    let diagnostics: Vec<_> = result.diagnostics.iter().collect();
    serde_json::to_string_pretty(&serde_json::json!({
        "triggers": result.triggers,
        "diagnostics": diagnostics,
    }))
}
