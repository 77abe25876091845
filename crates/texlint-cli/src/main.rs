use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use texlint_core::{Outcome, Report, Validator, ValidatorConfig};

#[derive(Parser)]
#[command(name = "texlint")]
#[command(about = "Structural checks for TeX/LaTeX documents", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one or more .tex files
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// JSON validator configuration
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Dump the token stream of a file as JSON
    Tokens {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        Commands::Check {
            files,
            format,
            config,
        } => check(files, *format, config.as_deref()),
        Commands::Tokens { path } => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let tokenized = texlint_syntax::tokenize(&content)?;
            println!("{}", serde_json::to_string_pretty(&tokenized.tokens)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(
    files: &[PathBuf],
    format: Format,
    config: Option<&std::path::Path>,
) -> anyhow::Result<ExitCode> {
    let config = match config {
        Some(path) => ValidatorConfig::load(path)?,
        None => ValidatorConfig::default(),
    };
    // One validator for the whole run, so the configured breaker policy
    // decides whether files after a tokenizer fault are still checked.
    let mut validator = Validator::new(config);
    let mut failed = false;
    let mut reports = serde_json::Map::new();

    for path in files {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let outcome = validator.run(&content);
        match &outcome {
            Outcome::Report(report) => {
                log::info!(
                    "{}: {} diagnostics, {} math regions",
                    path.display(),
                    report.diagnostics.len(),
                    report.contexts.len()
                );
                failed |= report.has_errors();
                if format == Format::Text {
                    print_text(path, report);
                }
            }
            Outcome::Fatal(err) => {
                log::error!("{}: {}", path.display(), err);
                failed = true;
            }
            Outcome::Disabled => {
                log::warn!(
                    "{}: skipped, validation is disabled after an earlier fault",
                    path.display()
                );
                failed = true;
            }
        }
        if format == Format::Json {
            reports.insert(path.display().to_string(), outcome_json(&outcome)?);
        }
    }

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn outcome_json(outcome: &Outcome) -> anyhow::Result<serde_json::Value> {
    Ok(match outcome {
        Outcome::Report(report) => serde_json::to_value(report)?,
        Outcome::Fatal(err) => serde_json::json!({ "fatal": err.to_string() }),
        Outcome::Disabled => serde_json::json!({ "disabled": true }),
    })
}

fn print_text(path: &std::path::Path, report: &Report) {
    for diagnostic in &report.diagnostics {
        println!("{}:{}", path.display(), diagnostic);
    }
    for context in &report.contexts {
        let start = context.range.start;
        match context.range.end {
            Some(end) => println!(
                "{}:{}:{}-{}:{}: math",
                path.display(),
                start.row,
                start.column,
                end.row,
                end.column
            ),
            None => println!("{}:{}:{}-: math", path.display(), start.row, start.column),
        }
    }
}
