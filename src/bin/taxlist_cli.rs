use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use taxlist_rs::compare::{compare_all_ranks, compare_at_rank, format_comparison};
use taxlist_rs::config::LineageConfig;
use taxlist_rs::lineage_parser::read_lineage_listing;
use taxlist_rs::rank::TaxonomicRank;
use taxlist_rs::{load_lineage_listing, LineageResults};

#[derive(Parser)]
#[command(name = "taxlist-rs", version, about = "Read, check and compare taxid lineage listings")]
struct Cli {
    /// TOML file with loading/validation settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite a listing in canonical one-record-per-line form
    Normalize {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Indented clade report plus per-rank taxon counts
    Report {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check chain shape and cross-record consistency
    Validate { input: PathBuf },
    /// Write the implied taxonomy as a taxDB file
    Taxdb {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score a predicted listing against a truth listing
    Compare {
        truth: PathBuf,
        predicted: PathBuf,
        /// Single rank to evaluate (default: all standard ranks)
        #[arg(long)]
        rank: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn spinner(color: &str, msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = format!("{{spinner:.{color}}} {{msg}}");
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&template)
    {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner
}

fn emit(output: Option<&Path>, text: &str) -> Result<(), Box<dyn Error>> {
    match output {
        Some(path) => {
            fs::write(path, text)?;
            log::info!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn load(input: &Path, config: &LineageConfig) -> Result<LineageResults, Box<dyn Error>> {
    let spinner = spinner("blue", &format!("Reading {}...", input.display()));
    let results = load_lineage_listing(input, config)?;
    spinner.finish_with_message(format!(
        "Loaded {} records ({} taxa).",
        results.records.len(),
        results.taxonomy.len()
    ));
    Ok(results)
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => LineageConfig::from_file(path)?,
        None => LineageConfig::default(),
    };

    match cli.command {
        Command::Normalize { input, output } => {
            let results = load(&input, &config)?;
            emit(output.as_deref(), &results.get_listing())?;
        }
        Command::Report { input, output } => {
            let results = load(&input, &config)?;
            let text = format!("{}\n{}", results.get_report(), results.get_rank_summary());
            emit(output.as_deref(), &text)?;
        }
        Command::Validate { input } => {
            let results = load(&input, &config)?;
            print!("{}", results.get_issues_text());
            let errors = results.error_count();
            println!(
                "{} record(s), {} issue(s), {} error(s)",
                results.records.len(),
                results.issues.len(),
                errors
            );
            if errors > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Taxdb { input, output } => {
            let results = load(&input, &config)?;
            emit(output.as_deref(), &results.get_taxdb())?;
        }
        Command::Compare {
            truth,
            predicted,
            rank,
            output,
        } => {
            let spinner = spinner("green", "Comparing listings...");
            let truth = read_lineage_listing(&truth)?;
            let predicted = read_lineage_listing(&predicted)?;
            let metrics = match rank {
                Some(rank) => vec![compare_at_rank(&truth, &predicted, &TaxonomicRank::parse(&rank))],
                None => compare_all_ranks(&truth, &predicted),
            };
            spinner.finish_with_message("Comparison finished.");
            emit(output.as_deref(), &format_comparison(&metrics))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
