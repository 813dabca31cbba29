// src/lib.rs
pub mod blast;
pub mod contigs;
pub mod corpus;
pub mod coverage;
pub mod errors;
pub mod fasta;
pub mod lineage;
pub mod results;
pub mod runfile;
pub mod taxdump;

use std::path::{Path, PathBuf};

pub use crate::errors::{Result, SidrError};

use crate::contigs::ContigRegistry;
use crate::corpus::{Corpus, Predictor};
use crate::results::{assemble, AssembledResults};
use crate::taxdump::{NameIndex, TaxonomyStore};

/// Options for an analysis over raw pre-assembly data: a FASTA assembly, a
/// per-contig coverage table, and BLAST classifications.
#[derive(Debug, Clone)]
pub struct DefaultOptions {
    pub fasta: PathBuf,
    pub coverage: PathBuf,
    pub blast_results: PathBuf,
    pub taxdump_dir: PathBuf,
    /// Classification rank the model trains at, e.g. `"phylum"`.
    pub rank: String,
    /// Collapse labels to target/nontarget.
    pub binary: bool,
    /// The target organism's name at `rank`.
    pub target: String,
}

/// Options for an analysis over a pre-computed run-file (BBMap style CSV).
#[derive(Debug, Clone)]
pub struct RunfileOptions {
    pub runfile: PathBuf,
    pub taxdump_dir: PathBuf,
    pub rank: String,
    pub binary: bool,
    pub target: String,
}

/// Everything a finished run produces: the corpus handed to the external
/// model and the merged classification results. Output text is rendered on
/// demand rather than stored.
pub struct AnalysisResults {
    pub corpus: Corpus,
    pub assembled: AssembledResults,
}

impl AnalysisResults {
    /// The unified result table as CSV: `contigid,classification,source`.
    pub fn results_table(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["contigid", "classification", "source"])?;
        for row in &self.assembled.rows {
            writer.write_record([
                row.contig_id.as_str(),
                row.classification.as_str(),
                row.source.as_str(),
            ])?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Flat list of contig ids classified as the target, one per line.
    pub fn keep_list(&self) -> String {
        join_lines(&self.assembled.target_ids)
    }

    /// Flat list of contig ids classified as something else.
    pub fn remove_list(&self) -> String {
        join_lines(&self.assembled.nontarget_ids)
    }
}

fn join_lines(ids: &[String]) -> String {
    let mut out = String::new();
    for id in ids {
        out.push_str(id);
        out.push('\n');
    }
    out
}

/// Loads the four NCBI dump tables from a taxdump directory
/// (`names.dmp`, `nodes.dmp`, `merged.dmp`, `delnodes.dmp`).
pub fn load_taxdump_dir<P: AsRef<Path>>(
    dir: P,
    build_reverse_index: bool,
) -> Result<(TaxonomyStore, Option<NameIndex>)> {
    let dir = dir.as_ref();
    taxdump::load(
        dir.join("names.dmp"),
        dir.join("nodes.dmp"),
        dir.join("merged.dmp"),
        dir.join("delnodes.dmp"),
        build_reverse_index,
    )
}

/// Resolves `(contig_id, taxid)` pairs to lineages at `rank` and applies them
/// to the registry, first hit wins. A deleted or unknown taxon id only loses
/// that contig's label (the dump and the classification source drift apart in
/// practice); a cycle in the dump is fatal.
fn classify_registry(
    registry: &mut ContigRegistry,
    hits: &[(String, String)],
    store: &TaxonomyStore,
    rank: &str,
) -> Result<()> {
    let resolved = lineage::resolve_batch(hits, store, rank);
    let mut classifications = Vec::with_capacity(resolved.len());
    for (contig_id, outcome) in resolved {
        match outcome {
            Ok(name) => classifications.push((contig_id, name)),
            Err(err @ SidrError::TaxonomyCycle(_)) => return Err(err),
            Err(err) => {
                log::warn!("skipping label for contig {contig_id}: {err}");
            }
        }
    }
    registry.apply_classifications(classifications);
    Ok(())
}

fn finish(
    registry: ContigRegistry,
    binary: bool,
    target: &str,
    predictor: Option<&dyn Predictor>,
) -> Result<AnalysisResults> {
    let mut contigs = registry.into_contigs();
    let corpus = Corpus::build(&contigs, binary, target)?;
    log::info!(
        "Corpus constructed, {} contigs in corpus and {} contigs in test data",
        corpus.rows.len(),
        corpus.test_rows.len()
    );
    let predictions = match predictor {
        Some(p) => p.predict(&corpus.test_rows),
        None => Vec::new(),
    };
    // In binary mode the corpus collapsed its labels, and a model trained on
    // it predicts in the same vocabulary. Input labels and the partition
    // target must speak it too, or the table would mix raw lineages with
    // target/nontarget rows.
    let assemble_target = if binary {
        for contig in &mut contigs {
            if let Some(classification) = contig.classification.take() {
                contig.classification =
                    Some(corpus::binary_label(&classification, target).to_string());
            }
        }
        corpus::TARGET_LABEL
    } else {
        target
    };
    let assembled = assemble(&contigs, &predictions, assemble_target);
    Ok(AnalysisResults { corpus, assembled })
}

/// Runs the default pipeline: taxdump, FASTA (GC), coverage, BLAST
/// lineages, corpus, external predictions, merged results.
pub fn run_default_analysis(
    opts: &DefaultOptions,
    predictor: Option<&dyn Predictor>,
) -> Result<AnalysisResults> {
    let (store, _) = load_taxdump_dir(&opts.taxdump_dir, false)?;

    let mut registry = fasta::read_fasta(&opts.fasta)?;
    let cov = coverage::read_coverage_table(&opts.coverage)?;
    registry.merge_feature_column("Coverage", &cov, 0.0);

    let hits = blast::read_blast_tab(&opts.blast_results)?;
    classify_registry(&mut registry, &hits, &store, &opts.rank)?;

    finish(registry, opts.binary, &opts.target, predictor)
}

/// Runs the run-file pipeline: like the default one, but over a single
/// CSV run-file, with origins resolved through the reverse name index.
pub fn run_runfile_analysis(
    opts: &RunfileOptions,
    predictor: Option<&dyn Predictor>,
) -> Result<AnalysisResults> {
    let (store, name_index) = load_taxdump_dir(&opts.taxdump_dir, true)?;
    let name_index = name_index.expect("reverse index was requested");

    let (mut registry, hits) = runfile::read_runfile(&opts.runfile, &name_index)?;
    classify_registry(&mut registry, &hits, &store, &opts.rank)?;

    finish(registry, opts.binary, &opts.target, predictor)
}
