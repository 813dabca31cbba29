use ahash::AHashMap;
use indexmap::IndexMap;

use crate::errors::{Result, SidrError};

/// One assembled sequence fragment and everything the pipeline learns about
/// it. Each contig owns its feature map; the key set and order must match
/// across every contig in a run.
#[derive(Debug, Clone)]
pub struct Contig {
    pub id: String,
    pub features: IndexMap<String, f64>,
    /// Resolved lineage at the chosen rank, or `None` when BLAST had nothing
    /// to say about this contig.
    pub classification: Option<String>,
}

impl Contig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            features: IndexMap::new(),
            classification: None,
        }
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: f64) -> Self {
        self.features.insert(name.into(), value);
        self
    }
}

/// Insertion-ordered collection of contigs with a unique-id invariant.
/// Feature sources are merged in; classifications are applied first-hit-wins.
#[derive(Debug, Default)]
pub struct ContigRegistry {
    contigs: Vec<Contig>,
    by_id: AHashMap<String, usize>,
}

impl ContigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Contig> {
        self.by_id.get(id).map(|&i| &self.contigs[i])
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn into_contigs(self) -> Vec<Contig> {
        self.contigs
    }

    /// Adds a contig. A repeated id means the feature sources overlap and the
    /// corpus would be corrupted; fail before any model work starts.
    pub fn insert(&mut self, contig: Contig) -> Result<()> {
        if self.by_id.contains_key(&contig.id) {
            return Err(SidrError::DuplicateContig(contig.id));
        }
        self.by_id.insert(contig.id.clone(), self.contigs.len());
        self.contigs.push(contig);
        Ok(())
    }

    /// Gives every contig a `name` column: the value from `values` when the
    /// source covered the contig, `default` otherwise.
    pub fn merge_feature_column(
        &mut self,
        name: &str,
        values: &AHashMap<String, f64>,
        default: f64,
    ) {
        for contig in &mut self.contigs {
            let value = values.get(&contig.id).copied().unwrap_or(default);
            contig.features.insert(name.to_string(), value);
        }
    }

    /// Applies resolved classifications. The first entry for a contig id wins;
    /// later entries (secondary BLAST hits) are ignored. Ids the feature
    /// sources never produced are skipped with a warning, since BLAST may
    /// reference contigs dropped upstream.
    pub fn apply_classifications<I>(&mut self, classifications: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (contig_id, lineage) in classifications {
            match self.by_id.get(&contig_id) {
                Some(&i) => {
                    let contig = &mut self.contigs[i];
                    if contig.classification.is_none() {
                        contig.classification = Some(lineage);
                    }
                }
                None => {
                    log::warn!("classification for unknown contig id {contig_id}, skipping");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(ids: &[&str]) -> ContigRegistry {
        let mut reg = ContigRegistry::new();
        for id in ids {
            reg.insert(Contig::new(*id).with_feature("GC", 50.0)).unwrap();
        }
        reg
    }

    #[test]
    fn duplicate_id_is_fatal_regardless_of_order() {
        for ids in [["a", "b", "a"], ["a", "a", "b"]] {
            let mut reg = ContigRegistry::new();
            let mut result = Ok(());
            for id in ids {
                result = reg.insert(Contig::new(id));
                if result.is_err() {
                    break;
                }
            }
            let err = result.unwrap_err();
            assert!(matches!(err, SidrError::DuplicateContig(id) if id == "a"));
        }
    }

    #[test]
    fn feature_column_merges_with_default() {
        let mut reg = registry_with(&["a", "b"]);
        let mut cov = AHashMap::new();
        cov.insert("a".to_string(), 12.5);
        reg.merge_feature_column("Coverage", &cov, 0.0);
        assert_eq!(reg.get("a").unwrap().features["Coverage"], 12.5);
        assert_eq!(reg.get("b").unwrap().features["Coverage"], 0.0);
        // column order follows insertion
        let keys: Vec<_> = reg.get("a").unwrap().features.keys().cloned().collect();
        assert_eq!(keys, vec!["GC", "Coverage"]);
    }

    #[test]
    fn first_classification_wins() {
        let mut reg = registry_with(&["a"]);
        reg.apply_classifications(vec![
            ("a".to_string(), "nematoda".to_string()),
            ("a".to_string(), "other".to_string()),
        ]);
        assert_eq!(reg.get("a").unwrap().classification.as_deref(), Some("nematoda"));
    }

    #[test]
    fn unknown_contig_is_skipped() {
        let mut reg = registry_with(&["a"]);
        reg.apply_classifications(vec![("ghost".to_string(), "nematoda".to_string())]);
        assert_eq!(reg.len(), 1);
        assert!(reg.get("ghost").is_none());
        assert!(reg.get("a").unwrap().classification.is_none());
    }
}
