use std::io::BufRead;
use std::path::Path;

use crate::errors::{Result, SidrError};
use crate::taxdump::open_reader;

/// Reads tab-delimited BLAST output in `-outfmt '6 qseqid staxids'` form.
/// Only the first two fields matter; further columns are ignored. Returns
/// `(contig_id, taxid)` pairs in file order; the registry enforces
/// first-hit-wins when a contig has several hits.
pub fn read_blast_tab<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let display = path.as_ref().display().to_string();
    let reader = open_reader(&path)?;
    let mut hits = Vec::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(contig_id), Some(taxid)) = (fields.next(), fields.next()) else {
            return Err(SidrError::MalformedRow {
                path: display,
                line: idx + 1,
            });
        };
        hits.push((contig_id.trim().to_string(), taxid.trim().to_string()));
    }

    log::info!("BLAST results loaded, {} hits", hits.len());
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn keeps_first_two_fields_in_order() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "c1\t88\t99.1\t150").unwrap();
        writeln!(f, "c2\t6231;6232").unwrap();
        writeln!(f, "c1\t77").unwrap();
        let hits = read_blast_tab(f.path()).unwrap();
        assert_eq!(
            hits,
            vec![
                ("c1".to_string(), "88".to_string()),
                ("c2".to_string(), "6231;6232".to_string()),
                ("c1".to_string(), "77".to_string()),
            ]
        );
    }

    #[test]
    fn single_field_row_is_fatal() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "c1").unwrap();
        let err = read_blast_tab(f.path()).unwrap_err();
        assert!(matches!(err, SidrError::MalformedRow { line: 1, .. }));
    }
}
