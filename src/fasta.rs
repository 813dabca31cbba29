use std::io::BufRead;
use std::path::Path;

use crate::contigs::{Contig, ContigRegistry};
use crate::errors::Result;
use crate::taxdump::open_reader;

/// Minimal FASTA scan that seeds the registry with one contig per record,
/// carrying a `"GC"` feature: percent of strong bases (G, C, or the S
/// ambiguity code) over all alphabetic bases, N and friends included.
/// Supports `.gz` inputs. The contig id is the header token before the first
/// space, matching what BLAST reports as `qseqid`.
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<ContigRegistry> {
    let reader = open_reader(path)?;
    let mut registry = ContigRegistry::new();

    let mut current_id: Option<String> = None;
    let mut gc = 0usize;
    let mut total = 0usize;

    let flush = |registry: &mut ContigRegistry,
                 id: Option<String>,
                 gc: usize,
                 total: usize|
     -> Result<()> {
        if let Some(id) = id {
            let pct = if total == 0 {
                0.0
            } else {
                gc as f64 / total as f64 * 100.0
            };
            registry.insert(Contig::new(id).with_feature("GC", pct))?;
        }
        Ok(())
    };

    for line_result in reader.lines() {
        let line = line_result?;
        let line = line.trim_end();
        if let Some(header) = line.strip_prefix('>') {
            flush(&mut registry, current_id.take(), gc, total)?;
            gc = 0;
            total = 0;
            current_id = Some(
                header
                    .split(' ')
                    .next()
                    .unwrap_or(header)
                    .to_string(),
            );
        } else if current_id.is_some() {
            for b in line.bytes() {
                match b {
                    b'G' | b'g' | b'C' | b'c' | b'S' | b's' => {
                        gc += 1;
                        total += 1;
                    }
                    b if b.is_ascii_alphabetic() => total += 1,
                    _ => {}
                }
            }
        }
    }
    flush(&mut registry, current_id, gc, total)?;

    log::info!("FASTA loaded, {} contigs", registry.len());
    Ok(registry)
}
