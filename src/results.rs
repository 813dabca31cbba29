use std::io::BufRead;
use std::path::Path;

use crate::contigs::Contig;
use crate::errors::{Result, SidrError};
use crate::taxdump::open_reader;

/// Where a classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    /// Carried in from the BLAST-derived labels.
    Input,
    /// Produced by the external model.
    Predicted,
}

impl LabelSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LabelSource::Input => "input",
            LabelSource::Predicted => "predicted",
        }
    }
}

/// One row of the unified classification table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub contig_id: String,
    pub classification: String,
    pub source: LabelSource,
}

/// The merged output set: every classified contig plus the id partitions
/// used for the keep/remove lists.
#[derive(Debug, Default)]
pub struct AssembledResults {
    pub rows: Vec<ResultRow>,
    pub target_ids: Vec<String>,
    pub nontarget_ids: Vec<String>,
}

/// Merges BLAST-derived and model-derived classifications. Input-labeled
/// contigs come first, then predicted rows, each group in source order.
/// Target matching is case-insensitive, the same policy the binary corpus
/// labeling uses.
pub fn assemble(
    contigs: &[Contig],
    predicted: &[(String, String)],
    target: &str,
) -> AssembledResults {
    let mut results = AssembledResults::default();

    for contig in contigs {
        let Some(classification) = &contig.classification else {
            continue;
        };
        partition(&mut results, &contig.id, classification, target);
        results.rows.push(ResultRow {
            contig_id: contig.id.clone(),
            classification: classification.clone(),
            source: LabelSource::Input,
        });
    }

    for (contig_id, label) in predicted {
        partition(&mut results, contig_id, label, target);
        results.rows.push(ResultRow {
            contig_id: contig_id.clone(),
            classification: label.clone(),
            source: LabelSource::Predicted,
        });
    }

    results
}

fn partition(results: &mut AssembledResults, contig_id: &str, label: &str, target: &str) {
    if label.eq_ignore_ascii_case(target) {
        results.target_ids.push(contig_id.to_string());
    } else {
        results.nontarget_ids.push(contig_id.to_string());
    }
}

/// Reads an external model's predictions: tab-delimited rows of
/// `contig_id<TAB>label`, one per test-row contig.
pub fn read_predictions<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let display = path.as_ref().display().to_string();
    let reader = open_reader(&path)?;
    let mut predictions = Vec::new();
    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(id), Some(label)) = (fields.next(), fields.next()) else {
            return Err(SidrError::MalformedRow {
                path: display,
                line: idx + 1,
            });
        };
        predictions.push((id.trim().to_string(), label.trim().to_string()));
    }
    Ok(predictions)
}
