use ahash::AHashSet;
use rayon::prelude::*;

use crate::errors::{Result, SidrError};
use crate::taxdump::{TaxonRecord, TaxonomyStore};

/// Returned when the walk reaches the root without matching the target rank.
/// A defined terminal state, not an error.
pub const NO_HIT: &str = "nohit";

/// Hard bound on the parent walk. The real NCBI tree is ~40 levels deep;
/// anything past this is a corrupted dump.
pub const MAX_LINEAGE_DEPTH: usize = 100;

/// Walks the taxonomy from `taxid` toward the root and returns the name of
/// the ancestor whose rank equals `target_rank` (case-insensitive), or
/// [`NO_HIT`] if the root is reached first.
///
/// Some classification sources join alternate ids with semicolons; only the
/// first token is authoritative. Merged ids are followed to their target
/// without a rank check on the merge itself. Deleted and unknown ids fail
/// with [`SidrError::TaxonDeleted`] and [`SidrError::TaxonNotFound`]; a
/// revisited id or a walk past [`MAX_LINEAGE_DEPTH`] fails with
/// [`SidrError::TaxonomyCycle`].
pub fn resolve(taxid: &str, store: &TaxonomyStore, target_rank: &str) -> Result<String> {
    let start = taxid.split(';').next().unwrap_or(taxid).trim();
    let mut current = start.to_string();
    let mut visited: AHashSet<String> = AHashSet::new();

    for _ in 0..MAX_LINEAGE_DEPTH {
        if !visited.insert(current.clone()) {
            return Err(SidrError::TaxonomyCycle(start.to_string()));
        }
        match store.get(&current) {
            None => return Err(SidrError::TaxonNotFound(current)),
            Some(TaxonRecord::Deleted) => return Err(SidrError::TaxonDeleted(current)),
            Some(TaxonRecord::Merged { target_id }) => {
                current = target_id.clone();
            }
            Some(TaxonRecord::Active {
                name,
                parent_id,
                rank,
            }) => {
                if rank.eq_ignore_ascii_case(target_rank) {
                    return Ok(name.clone());
                }
                if current == "1" {
                    // Root is its own parent; the walk ends here.
                    return Ok(NO_HIT.to_string());
                }
                current = parent_id.clone();
            }
        }
    }
    Err(SidrError::TaxonomyCycle(start.to_string()))
}

/// Resolves many taxon ids against the same store in parallel, preserving
/// input order. The store is only read, so this is a plain `par_iter`.
pub fn resolve_batch(
    taxids: &[(String, String)],
    store: &TaxonomyStore,
    target_rank: &str,
) -> Vec<(String, Result<String>)> {
    taxids
        .par_iter()
        .map(|(contig_id, taxid)| (contig_id.clone(), resolve(taxid, store, target_rank)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;

    fn active(name: &str, parent: &str, rank: &str) -> TaxonRecord {
        TaxonRecord::Active {
            name: name.into(),
            parent_id: parent.into(),
            rank: rank.into(),
        }
    }

    /// The five-record store: root, two phyla, a deleted id, a merged id.
    fn scenario_store() -> TaxonomyStore {
        let mut records = AHashMap::new();
        records.insert("1".to_string(), active("root", "1", "no rank"));
        records.insert("2".to_string(), active("phy", "1", "phylum"));
        records.insert("3".to_string(), active("mergephy", "1", "phylum"));
        records.insert("4".to_string(), TaxonRecord::Deleted);
        records.insert(
            "5".to_string(),
            TaxonRecord::Merged {
                target_id: "3".to_string(),
            },
        );
        TaxonomyStore::from_records(records)
    }

    #[test]
    fn resolves_active_id_at_rank() {
        let store = scenario_store();
        assert_eq!(resolve("2", &store, "phylum").unwrap(), "phy");
    }

    #[test]
    fn rank_comparison_is_case_insensitive() {
        let store = scenario_store();
        assert_eq!(resolve("2", &store, "Phylum").unwrap(), "phy");
    }

    #[test]
    fn merged_id_resolves_like_its_target() {
        let store = scenario_store();
        assert_eq!(resolve("5", &store, "phylum").unwrap(), "mergephy");
        assert_eq!(
            resolve("5", &store, "phylum").unwrap(),
            resolve("3", &store, "phylum").unwrap()
        );
    }

    #[test]
    fn deleted_id_is_an_error() {
        let store = scenario_store();
        let err = resolve("4", &store, "phylum").unwrap_err();
        assert!(matches!(err, SidrError::TaxonDeleted(id) if id == "4"));
    }

    #[test]
    fn unknown_id_is_an_error() {
        let store = scenario_store();
        let err = resolve("42", &store, "phylum").unwrap_err();
        assert!(matches!(err, SidrError::TaxonNotFound(id) if id == "42"));
    }

    #[test]
    fn root_without_match_is_nohit() {
        let store = scenario_store();
        assert_eq!(resolve("2", &store, "genus").unwrap(), NO_HIT);
        assert_eq!(resolve("1", &store, "genus").unwrap(), NO_HIT);
    }

    #[test]
    fn semicolon_joined_ids_use_first_token() {
        let store = scenario_store();
        assert_eq!(resolve("2;4;5", &store, "phylum").unwrap(), "phy");
    }

    #[test]
    fn cycle_in_dump_is_detected() {
        let mut records = AHashMap::new();
        records.insert("10".to_string(), active("a", "11", "species"));
        records.insert("11".to_string(), active("b", "10", "genus"));
        let store = TaxonomyStore::from_records(records);
        let err = resolve("10", &store, "phylum").unwrap_err();
        assert!(matches!(err, SidrError::TaxonomyCycle(id) if id == "10"));
    }

    #[test]
    fn batch_resolution_preserves_order() {
        let store = scenario_store();
        let pairs = vec![
            ("c1".to_string(), "2".to_string()),
            ("c2".to_string(), "5".to_string()),
        ];
        let resolved = resolve_batch(&pairs, &store, "phylum");
        assert_eq!(resolved[0].0, "c1");
        assert_eq!(resolved[0].1.as_ref().unwrap(), "phy");
        assert_eq!(resolved[1].0, "c2");
        assert_eq!(resolved[1].1.as_ref().unwrap(), "mergephy");
    }
}
