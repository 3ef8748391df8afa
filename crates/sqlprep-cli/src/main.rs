use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlprep_catalog::{SchemaExtractor, SqliteCatalog};
use sqlprep_core::{Config, Corpus, PipelineReport};
use sqlprep_dataset::{combine, relay, Pipeline};
use sqlprep_eval::{
    count_label, generate_predictions, predictions_file_name, write_predictions, CommandModel,
    CommandTrainingJob, EvaluationRequest, Evaluator, TrainingProfiles, TrainingRun,
};

/// sqlprep - Text-to-SQL dataset preparation and model tooling
#[derive(Parser)]
#[command(name = "sqlprep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: sqlprep.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run backfill, formatting, combination and gold relay in order
    Prepare {
        /// Run report location (default: pipeline-report.json in the project root)
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Write schema.sql for databases shipped without a .sql dump
    Backfill,

    /// Format raw splits into corpus files
    Format {
        /// Splits to format (default: all configured splits)
        splits: Vec<String>,
    },

    /// Concatenate two corpus files
    Combine {
        first: PathBuf,
        second: PathBuf,

        /// Merged corpus file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Copy a gold query file to plain text (default: all configured files)
    Relay {
        source: Option<PathBuf>,
        destination: Option<PathBuf>,
    },

    /// Start a fine-tuning run from a named profile
    Finetune {
        /// Name of the configuration profile to use
        #[arg(long, default_value = "default")]
        config_name: String,

        /// Parent directory of the run's checkpoint directory
        #[arg(long)]
        output_folder: Option<PathBuf>,
    },

    /// Generate predictions for a corpus file
    Predict {
        /// Base model path or name
        #[arg(long)]
        model_name_or_path: Option<String>,

        /// Checkpoint directory name under the checkpoints folder
        #[arg(long, default_value = "default")]
        checkpoint_name: String,

        /// Corpus file name under the corpus directory
        #[arg(long, default_value = "spider_dev.json")]
        input_file_name: String,

        /// Only process the first N entries
        #[arg(long)]
        num_entries: Option<usize>,
    },

    /// Score a predictions file with the external evaluator
    Evaluate {
        /// Gold standard file (default: destination of the first relay entry)
        #[arg(long)]
        gold: Option<PathBuf>,

        /// Predictions file
        #[arg(long)]
        pred: Option<PathBuf>,

        /// Path to database root
        #[arg(long)]
        db: Option<PathBuf>,

        /// Path to table JSON
        #[arg(long)]
        table: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("sqlprep.toml").exists() {
        Config::from_file(Path::new("sqlprep.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    match cli.command {
        Commands::Prepare { report } => {
            let report_path = report.unwrap_or_else(|| config.report_path());
            prepare_command(config, &report_path)
        }
        Commands::Backfill => backfill_command(config),
        Commands::Format { splits } => format_command(config, &splits),
        Commands::Combine { first, second, output } => {
            let summary = combine(&first, &second, &output)?;
            println!("{} {} entries → {}", "Combined".green(), summary.entries, output.display());
            Ok(())
        }
        Commands::Relay { source, destination } => relay_command(config, source, destination),
        Commands::Finetune { config_name, output_folder } => {
            finetune_command(&config, &config_name, output_folder)
        }
        Commands::Predict {
            model_name_or_path,
            checkpoint_name,
            input_file_name,
            num_entries,
        } => predict_command(
            &config,
            model_name_or_path,
            &checkpoint_name,
            &input_file_name,
            num_entries,
        ),
        Commands::Evaluate { gold, pred, db, table } => evaluate_command(&config, gold, pred, db, table),
    }
}

/// Prepare command - the whole data pipeline
fn prepare_command(config: Config, report_path: &Path) -> Result<()> {
    let pipeline = Pipeline::new(config, SqliteCatalog::new());
    let report = pipeline.prepare(report_path).context("Data preparation failed")?;

    print_pipeline_summary(&report);
    println!("{} {}", "Report saved to:".green(), report_path.display());
    Ok(())
}

/// Backfill command - schema dumps only
fn backfill_command(config: Config) -> Result<()> {
    let root = config.database_root();
    let summary = sqlprep_dataset::backfill(&root, &SchemaExtractor::new(SqliteCatalog::new()))
        .with_context(|| format!("Backfill of {} failed", root.display()))?;

    let mut report = PipelineReport::new();
    report.backfill = Some(summary);
    print_pipeline_summary(&report);
    Ok(())
}

/// Format command - selected splits only
fn format_command(config: Config, splits: &[String]) -> Result<()> {
    let splits: Vec<String> = if splits.is_empty() {
        config.dataset.splits.clone()
    } else {
        splits.to_vec()
    };

    let pipeline = Pipeline::new(config, SqliteCatalog::new());
    let mut report = PipelineReport::new();
    for split in &splits {
        let summary = pipeline
            .format_split(split)
            .with_context(|| format!("Formatting split '{}' failed", split))?;
        report.splits.push(summary);
    }

    print_pipeline_summary(&report);
    Ok(())
}

/// Relay command - one explicit pair, or every configured gold file
fn relay_command(config: Config, source: Option<PathBuf>, destination: Option<PathBuf>) -> Result<()> {
    let relayed = match (source, destination) {
        (Some(source), Some(destination)) => vec![relay(&source, &destination)?],
        (None, None) => Pipeline::new(config, SqliteCatalog::new()).relay_all()?,
        _ => anyhow::bail!("Pass both a source and a destination, or neither"),
    };

    for summary in relayed {
        println!(
            "{} {} → {}",
            "Copied".green(),
            summary.source.display(),
            summary.destination.display()
        );
    }
    Ok(())
}

/// Finetune command - plan the run directory and hand over to the trainer
fn finetune_command(config: &Config, config_name: &str, output_folder: Option<PathBuf>) -> Result<()> {
    let training = &config.training;
    let profiles = TrainingProfiles::from_file(&config.resolve(&training.profiles))?;
    let checkpoints = output_folder.unwrap_or_else(|| config.resolve(&training.checkpoints_dir));

    let run = TrainingRun::plan(&profiles, config_name, &checkpoints, chrono::Local::now().naive_local())?;
    let job = CommandTrainingJob::new(training.command.clone())?;

    println!("{} {}", "Starting run:".cyan(), run.run_name);
    run.launch(&job, &run.tracking_session(&training.tracking_project))?;
    println!("{} {}", "Checkpoint saved in:".green(), run.output_dir.display());

    Ok(())
}

/// Predict command - one model answer per corpus entry
fn predict_command(
    config: &Config,
    model_name_or_path: Option<String>,
    checkpoint_name: &str,
    input_file_name: &str,
    num_entries: Option<usize>,
) -> Result<()> {
    let inference = &config.inference;
    let input_path = config.corpus_dir().join(input_file_name);
    let json = std::fs::read_to_string(&input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;
    let corpus = Corpus::from_json(&json)
        .with_context(|| format!("Failed to parse {}", input_path.display()))?;

    let adapter = config.resolve(&config.training.checkpoints_dir).join(checkpoint_name);
    let mut model = CommandModel::new(
        inference.command.clone(),
        model_name_or_path.unwrap_or_else(|| inference.model_name_or_path.clone()),
        adapter,
    )?;

    let outputs = generate_predictions(&mut model, &corpus, num_entries)?;

    let file_name = predictions_file_name(&count_label(num_entries, corpus.len()), checkpoint_name);
    let output_path = config.resolve(&inference.predictions_dir).join(file_name);
    write_predictions(&output_path, &outputs)?;

    println!("{} {}", "Predictions saved to:".green(), output_path.display());
    Ok(())
}

/// Evaluate command - run the harness and echo the score table
fn evaluate_command(
    config: &Config,
    gold: Option<PathBuf>,
    pred: Option<PathBuf>,
    db: Option<PathBuf>,
    table: Option<PathBuf>,
) -> Result<()> {
    let gold = match gold.or_else(|| config.evaluation_gold_path()) {
        Some(gold) => gold,
        None => anyhow::bail!("No gold file given and no [[relay]] entry configured"),
    };

    let request = EvaluationRequest {
        gold,
        pred: pred.unwrap_or_else(|| {
            config
                .resolve(&config.inference.predictions_dir)
                .join(predictions_file_name("all", "default"))
        }),
        db: db.unwrap_or_else(|| config.database_root()),
        table: table.unwrap_or_else(|| config.suite_dir().join("tables.json")),
    };

    eprintln!("{}", "Evaluating...".cyan());
    let evaluation = Evaluator::from_config(config).evaluate(&request)?;

    println!();
    if let Some(lines) = evaluation.score_lines() {
        for line in lines {
            println!("{}", line);
        }
    } else {
        println!("{}", "No score table found in evaluator output".yellow());
    }

    println!(
        "\n{} {}",
        "Evaluation results successfully saved in".green(),
        evaluation.results_path.display()
    );
    Ok(())
}

/// Print pipeline summary to stdout
fn print_pipeline_summary(report: &PipelineReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Data Preparation Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    if let Some(backfill) = &report.backfill {
        println!("{}", "Schema backfill:".bold());
        println!("  Directories scanned:   {}", backfill.directories_scanned);
        println!("  Already with schema:   {}", backfill.directories_with_schema);
        println!("  Schemas extracted:     {}", backfill.extracted.len());
        if backfill.has_failures() {
            println!("  Failures:              {}", backfill.failures.len().to_string().red().bold());
            for failure in &backfill.failures {
                println!("    - {}: {}", failure.database.display(), failure.message);
            }
        } else {
            println!("  Failures:              {}", "0".green());
        }
        println!();
    }

    if !report.splits.is_empty() {
        println!("{}", "Splits:".bold());
        for split in &report.splits {
            let count = format!("{}/{}", split.written_entries, split.source_entries);
            let count = if split.is_complete() { count.green() } else { count.yellow() };
            println!("  {:<16} {} → {}", split.split, count, split.output.display());
        }
        println!();
    }

    if let Some(combined) = &report.combined {
        println!("{}", "Combined:".bold());
        println!("  {} entries → {}", combined.entries, combined.output.display());
        println!();
    }

    if !report.relayed.is_empty() {
        println!("{}", "Gold files:".bold());
        for relayed in &report.relayed {
            println!("  {} → {}", relayed.source.display(), relayed.destination.display());
        }
        println!();
    }

    println!("{}", "=".repeat(60).bright_blue());
}
