use std::path::Path;

use crate::contigs::{Contig, ContigRegistry};
use crate::errors::{Result, SidrError};
use crate::taxdump::NameIndex;

/// Columns BBMap emits that carry no signal for the model.
const DROPPED_COLUMNS: &[&str] = &[
    "Length",
    "Covered_percent",
    "Covered_bases",
    "Plus_reads",
    "Minus_reads",
    "Read_GC",
];

/// Ingests a pre-computed run-file: a CSV with an `ID` column, an `Origin`
/// column naming the organism a contig is known to come from (`"0"` or empty
/// for unknown), and any number of numeric feature columns. The junk columns
/// BBMap adds are dropped.
///
/// Origins are organism names, not taxon ids, so they go through the reverse
/// name index; a name the taxonomy does not know is fatal. Returns the seeded
/// registry plus `(contig_id, taxid)` pairs for lineage resolution.
pub fn read_runfile<P: AsRef<Path>>(
    path: P,
    name_index: &NameIndex,
) -> Result<(ContigRegistry, Vec<(String, String)>)> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&path)?;
    let headers = reader.headers()?.clone();

    let id_col = find_column(&headers, "ID", &path)?;
    let origin_col = find_column(&headers, "Origin", &path)?;
    let feature_cols: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(i, name)| {
            *i != id_col && *i != origin_col && !DROPPED_COLUMNS.contains(name)
        })
        .map(|(i, _)| i)
        .collect();

    let display = path.as_ref().display().to_string();
    let mut registry = ContigRegistry::new();
    let mut classifications = Vec::new();

    for (idx, record_result) in reader.records().enumerate() {
        let record = record_result?;
        let contig_id = record.get(id_col).unwrap_or("").to_string();
        let mut contig = Contig::new(contig_id.clone());
        for &col in &feature_cols {
            let raw = record.get(col).unwrap_or("");
            let value: f64 = if raw.is_empty() {
                0.0
            } else {
                raw.parse().map_err(|_| SidrError::MalformedRow {
                    path: display.clone(),
                    line: idx + 2, // header is line 1
                })?
            };
            contig.features.insert(headers[col].to_string(), value);
        }
        registry.insert(contig)?;

        let origin = record.get(origin_col).unwrap_or("");
        if !origin.is_empty() && origin != "0" {
            let taxid = name_index
                .get(origin)
                .ok_or_else(|| SidrError::UnknownOrigin(origin.to_string()))?;
            classifications.push((contig_id, taxid.clone()));
        }
    }

    log::info!(
        "Run-file loaded, {} contigs ({} with a known origin)",
        registry.len(),
        classifications.len()
    );
    Ok((registry, classifications))
}

fn find_column<P: AsRef<Path>>(
    headers: &csv::StringRecord,
    name: &str,
    path: P,
) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| SidrError::MalformedRow {
            path: path.as_ref().display().to_string(),
            line: 1,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn index() -> NameIndex {
        let mut idx = NameIndex::new();
        idx.insert("Caenorhabditis elegans".to_string(), "6239".to_string());
        idx
    }

    #[test]
    fn reads_features_and_origins() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "ID,GC,Coverage,Length,Origin").unwrap();
        writeln!(f, "c1,50.0,12.5,1000,Caenorhabditis elegans").unwrap();
        writeln!(f, "c2,61.2,3.0,900,0").unwrap();
        let (registry, classifications) = read_runfile(f.path(), &index()).unwrap();

        assert_eq!(registry.len(), 2);
        let c1 = registry.get("c1").unwrap();
        // Length is a dropped column
        let keys: Vec<_> = c1.features.keys().cloned().collect();
        assert_eq!(keys, vec!["GC", "Coverage"]);
        assert_eq!(c1.features["Coverage"], 12.5);
        assert_eq!(
            classifications,
            vec![("c1".to_string(), "6239".to_string())]
        );
    }

    #[test]
    fn unknown_origin_is_fatal() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "ID,GC,Origin").unwrap();
        writeln!(f, "c1,50.0,Martian").unwrap();
        let err = read_runfile(f.path(), &index()).unwrap_err();
        assert!(matches!(err, SidrError::UnknownOrigin(name) if name == "Martian"));
    }

    #[test]
    fn empty_feature_cell_defaults_to_zero() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "ID,GC,Coverage,Origin").unwrap();
        writeln!(f, "c1,50.0,,0").unwrap();
        let (registry, _) = read_runfile(f.path(), &index()).unwrap();
        assert_eq!(registry.get("c1").unwrap().features["Coverage"], 0.0);
    }

    #[test]
    fn missing_id_column_is_fatal() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "Contig,GC,Origin").unwrap();
        writeln!(f, "c1,50.0,0").unwrap();
        assert!(read_runfile(f.path(), &index()).is_err());
    }
}
