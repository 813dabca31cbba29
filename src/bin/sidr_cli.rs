use std::fs;
use std::path::PathBuf;

use ahash::AHashMap;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use sidr_rs::corpus::{Predictor, TestRow};
use sidr_rs::results::read_predictions;
use sidr_rs::{run_default_analysis, run_runfile_analysis, AnalysisResults, DefaultOptions, RunfileOptions};

#[derive(Parser)]
#[command(
    name = "sidr-rs",
    version,
    about = "Classify assembly contigs as target organism or not",
    long_about = "Uses BLAST-derived taxonomy labels to build a training corpus over per-contig \
                  features (GC content, read coverage) for an external decision-tree model, then \
                  merges the model's predictions back into a unified classification table."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the default analysis over raw pre-assembly data
    Default(DefaultArgs),

    /// Run a custom analysis over a pre-computed run-file (BBMap style CSV)
    Runfile(RunfileArgs),
}

#[derive(Args)]
struct DefaultArgs {
    /// Preliminary assembly, in FASTA format (.gz supported)
    #[arg(short, long)]
    fasta: PathBuf,

    /// Per-contig average-coverage table (contig_id<TAB>avg_cov)
    #[arg(short, long)]
    coverage: PathBuf,

    /// BLAST classification of the assembly, -outfmt '6 qseqid staxids'
    #[arg(short = 'r', long)]
    blastresults: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct RunfileArgs {
    /// CSV run-file with ID, Origin, and numeric feature columns
    #[arg(short, long)]
    infile: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct CommonArgs {
    /// Location of the NCBI taxonomy dump. Defaults to $BLASTDB.
    #[arg(short = 'd', long, env = "BLASTDB")]
    taxdump: PathBuf,

    /// External model predictions to merge in (contig_id<TAB>label)
    #[arg(short, long)]
    predictions: Option<PathBuf>,

    /// Prefix for exported training/prediction matrices for an external trainer
    #[arg(long, value_name = "PREFIX")]
    xy_out: Option<PathBuf>,

    /// Where to write the unified classification table
    #[arg(short, long, default_value = "classifications.txt")]
    output: PathBuf,

    /// Where to save the ids classified as the target organism
    #[arg(short = 'k', long)]
    tokeep: Option<PathBuf>,

    /// Where to save the ids classified as something else
    #[arg(short = 'x', long)]
    toremove: Option<PathBuf>,

    /// Use binary target/nontarget classification
    #[arg(long)]
    binary: bool,

    /// The target organism's name at the chosen classification level
    #[arg(short, long)]
    target: String,

    /// The classification level to train at
    #[arg(short, long, default_value = "phylum")]
    level: String,
}

/// Replays predictions produced by an external model, matched by contig id.
struct FilePredictor {
    labels: AHashMap<String, String>,
}

impl Predictor for FilePredictor {
    fn predict(&self, test_rows: &[TestRow]) -> Vec<(String, String)> {
        test_rows
            .iter()
            .filter_map(|row| {
                self.labels
                    .get(&row.contig_id)
                    .map(|label| (row.contig_id.clone(), label.clone()))
            })
            .collect()
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    bar.set_message(msg.to_string());
    bar
}

fn load_predictor(common: &CommonArgs) -> Result<Option<FilePredictor>, Box<dyn std::error::Error>> {
    let Some(path) = &common.predictions else {
        return Ok(None);
    };
    let labels = read_predictions(path)?.into_iter().collect();
    Ok(Some(FilePredictor { labels }))
}

fn write_outputs(
    results: &AnalysisResults,
    common: &CommonArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let bar = spinner("Writing output files...");

    fs::write(&common.output, results.results_table()?)?;
    if let Some(path) = &common.tokeep {
        fs::write(path, results.keep_list())?;
    }
    if let Some(path) = &common.toremove {
        fs::write(path, results.remove_list())?;
    }
    if let Some(prefix) = &common.xy_out {
        let mut train = prefix.as_os_str().to_owned();
        train.push(".train.tsv");
        fs::write(train, results.corpus.training_matrix_text())?;
        let mut predict = prefix.as_os_str().to_owned();
        predict.push(".predict.tsv");
        fs::write(predict, results.corpus.prediction_matrix_text())?;
    }

    bar.finish_with_message(format!(
        "Done: {} labeled, {} predicted-or-pending, {} kept as target",
        results.corpus.rows.len(),
        results.corpus.test_rows.len(),
        results.assembled.target_ids.len()
    ));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Default(args) => {
            let predictor = load_predictor(&args.common)?;
            let opts = DefaultOptions {
                fasta: args.fasta.clone(),
                coverage: args.coverage.clone(),
                blast_results: args.blastresults.clone(),
                taxdump_dir: args.common.taxdump.clone(),
                rank: args.common.level.clone(),
                binary: args.common.binary,
                target: args.common.target.clone(),
            };
            let bar = spinner("Running default analysis...");
            let results =
                run_default_analysis(&opts, predictor.as_ref().map(|p| p as &dyn Predictor))?;
            bar.finish_with_message("Analysis finished.");
            write_outputs(&results, &args.common)?;
        }
        Commands::Runfile(args) => {
            let predictor = load_predictor(&args.common)?;
            let opts = RunfileOptions {
                runfile: args.infile.clone(),
                taxdump_dir: args.common.taxdump.clone(),
                rank: args.common.level.clone(),
                binary: args.common.binary,
                target: args.common.target.clone(),
            };
            let bar = spinner("Running run-file analysis...");
            let results =
                run_runfile_analysis(&opts, predictor.as_ref().map(|p| p as &dyn Predictor))?;
            bar.finish_with_message("Analysis finished.");
            write_outputs(&results, &args.common)?;
        }
    }

    Ok(())
}
