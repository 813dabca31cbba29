use std::io::BufRead;
use std::path::Path;

use ahash::AHashMap;

use crate::errors::{Result, SidrError};
use crate::taxdump::open_reader;

/// Reads a per-contig average-coverage table: tab-delimited rows of
/// `contig_id<TAB>avg_coverage`, as produced by `samtools depth` style
/// summaries or BBMap's pileup stats. Extra columns are ignored.
pub fn read_coverage_table<P: AsRef<Path>>(path: P) -> Result<AHashMap<String, f64>> {
    let display = path.as_ref().display().to_string();
    let reader = open_reader(&path)?;
    let mut coverage = AHashMap::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(id), Some(cov)) = (fields.next(), fields.next()) else {
            return Err(SidrError::MalformedRow {
                path: display,
                line: idx + 1,
            });
        };
        let value: f64 = cov.trim().parse().map_err(|_| SidrError::MalformedRow {
            path: display.clone(),
            line: idx + 1,
        })?;
        coverage.insert(id.trim().to_string(), value);
    }
    Ok(coverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_two_column_rows() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "#contig\tavg_cov").unwrap();
        writeln!(f, "a\t12.5").unwrap();
        writeln!(f, "b\t0\textra").unwrap();
        let cov = read_coverage_table(f.path()).unwrap();
        assert_eq!(cov["a"], 12.5);
        assert_eq!(cov["b"], 0.0);
    }

    #[test]
    fn non_numeric_coverage_is_fatal() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "a\tlots").unwrap();
        let err = read_coverage_table(f.path()).unwrap_err();
        assert!(matches!(err, SidrError::MalformedRow { line: 1, .. }));
    }
}
