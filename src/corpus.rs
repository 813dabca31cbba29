use std::fmt::Write as FmtWrite;

use indexmap::IndexMap;

use crate::contigs::Contig;
use crate::errors::{Result, SidrError};

/// Label given to contigs matching the target organism in binary mode.
pub const TARGET_LABEL: &str = "target";
/// Label given to everything else in binary mode.
pub const NONTARGET_LABEL: &str = "nontarget";

/// One labeled training row.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusRow {
    pub features: Vec<f64>,
    pub label: String,
}

/// One unlabeled row awaiting prediction, keyed by its contig id.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRow {
    pub contig_id: String,
    pub features: Vec<f64>,
}

/// The training/prediction split handed to the external model, plus the
/// feature schema and the label to class-index map.
#[derive(Debug, Default)]
pub struct Corpus {
    pub rows: Vec<CorpusRow>,
    pub test_rows: Vec<TestRow>,
    pub feature_names: Vec<String>,
    class_map: IndexMap<String, usize>,
}

impl Corpus {
    /// Partitions `contigs` into labeled training rows and unlabeled test
    /// rows. With `binary`, labels collapse to [`TARGET_LABEL`] /
    /// [`NONTARGET_LABEL`] by case-insensitive comparison against `target`;
    /// otherwise the raw lineage strings are kept.
    ///
    /// The feature schema (names and order) is taken from the first contig
    /// and every later contig must match it exactly. The class map is built
    /// after the scan with labels sorted, so the numeric indices the external
    /// trainer sees do not depend on input order.
    pub fn build(contigs: &[Contig], binary: bool, target: &str) -> Result<Corpus> {
        let mut corpus = Corpus::default();
        let Some(first) = contigs.first() else {
            return Ok(corpus);
        };
        corpus.feature_names = first.features.keys().cloned().collect();

        let mut labels: Vec<String> = Vec::new();
        for contig in contigs {
            validate_schema(contig, &corpus.feature_names)?;
            let features: Vec<f64> = contig.features.values().copied().collect();
            match &contig.classification {
                Some(classification) => {
                    let label = if binary {
                        binary_label(classification, target).to_string()
                    } else {
                        classification.clone()
                    };
                    if !labels.contains(&label) {
                        labels.push(label.clone());
                    }
                    corpus.rows.push(CorpusRow { features, label });
                }
                None => {
                    corpus.test_rows.push(TestRow {
                        contig_id: contig.id.clone(),
                        features,
                    });
                }
            }
        }

        labels.sort();
        corpus.class_map = labels.into_iter().zip(0..).collect();
        Ok(corpus)
    }

    /// Class index for a label, as handed to the external trainer.
    pub fn class_index(&self, label: &str) -> Option<usize> {
        self.class_map.get(label).copied()
    }

    /// Class names sorted by their index.
    pub fn class_names(&self) -> Vec<&str> {
        self.class_map.keys().map(String::as_str).collect()
    }

    /// Renders the labeled matrix as tab-delimited text for an external
    /// trainer: header of feature names plus `class`, one row per training
    /// contig with the numeric class index last.
    pub fn training_matrix_text(&self) -> String {
        let mut out = String::new();
        writeln!(out, "{}\tclass", self.feature_names.join("\t")).unwrap();
        for row in &self.rows {
            let class = self.class_index(&row.label).unwrap_or(0);
            writeln!(out, "{}\t{}", join_features(&row.features), class).unwrap();
        }
        out
    }

    /// Renders the unlabeled matrix: `contigid` plus the feature columns.
    pub fn prediction_matrix_text(&self) -> String {
        let mut out = String::new();
        writeln!(out, "contigid\t{}", self.feature_names.join("\t")).unwrap();
        for row in &self.test_rows {
            writeln!(out, "{}\t{}", row.contig_id, join_features(&row.features)).unwrap();
        }
        out
    }
}

/// Collapses a lineage string into the binary vocabulary by case-insensitive
/// comparison against the target organism.
pub fn binary_label(classification: &str, target: &str) -> &'static str {
    if classification.eq_ignore_ascii_case(target) {
        TARGET_LABEL
    } else {
        NONTARGET_LABEL
    }
}

fn join_features(features: &[f64]) -> String {
    features
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\t")
}

fn validate_schema(contig: &Contig, schema: &[String]) -> Result<()> {
    if contig.features.len() != schema.len()
        || !contig.features.keys().zip(schema).all(|(a, b)| a == b)
    {
        let got: Vec<&String> = contig.features.keys().collect();
        return Err(SidrError::InconsistentFeatureSet {
            contig_id: contig.id.clone(),
            detail: format!("expected columns {:?}, got {:?}", schema, got),
        });
    }
    Ok(())
}

/// The external model's entire contract: given unlabeled rows, return
/// `(contig_id, label)` pairs. Training and prediction live outside this
/// crate.
pub trait Predictor {
    fn predict(&self, test_rows: &[TestRow]) -> Vec<(String, String)>;
}
