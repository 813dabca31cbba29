use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use flate2::read::MultiGzDecoder;

use crate::errors::{Result, SidrError};

/// One entry in the loaded taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonRecord {
    /// A live taxon. `parent_id` chains (transitively) to the root id `"1"`,
    /// which is its own parent with rank `"no rank"`.
    Active {
        name: String,
        parent_id: String,
        rank: String,
    },
    /// An id retired in favor of a surviving one.
    Merged { target_id: String },
    /// An id removed from the database outright. Terminal, unresolvable.
    Deleted,
}

/// Reverse lookup from scientific name to taxon id. Last write wins when the
/// dump carries duplicate names.
pub type NameIndex = AHashMap<String, String>;

/// The NCBI taxonomy dump, indexed by taxon id. Built once by [`load`] and
/// immutable afterwards.
#[derive(Debug, Default)]
pub struct TaxonomyStore {
    records: AHashMap<String, TaxonRecord>,
}

impl TaxonomyStore {
    pub fn get(&self, taxid: &str) -> Option<&TaxonRecord> {
        self.records.get(taxid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Test/fixture constructor.
    pub fn from_records(records: AHashMap<String, TaxonRecord>) -> Self {
        Self { records }
    }
}

/// Opens a text input, transparently decompressing `.gz` files.
pub(crate) fn open_reader<P: AsRef<Path>>(path: P) -> std::io::Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let f = File::open(path)?;
    let is_gz = path.extension().map(|ext| ext == "gz").unwrap_or(false);
    Ok(if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    })
}

/// Loads the four NCBI dump tables (`names.dmp`, `nodes.dmp`, `merged.dmp`,
/// `delnodes.dmp`) into a [`TaxonomyStore`], streaming each table rather than
/// materializing parsed rows first.
///
/// Rows are pipe-delimited with whitespace-padded fields. From the names
/// table only rows whose designation field contains `"scientific name"` are
/// kept. Nodes must be covered by names (names are loaded first); a node id
/// without a name entry fails with [`SidrError::MissingNodeName`]. Merged and
/// deleted rows overwrite whatever entry the id had.
///
/// With `build_reverse_index` a scientific-name to taxon-id index is
/// returned as well, for inputs that reference organisms by name.
pub fn load<P: AsRef<Path>>(
    names_path: P,
    nodes_path: P,
    merged_path: P,
    delnodes_path: P,
    build_reverse_index: bool,
) -> Result<(TaxonomyStore, Option<NameIndex>)> {
    let mut names: AHashMap<String, String> = AHashMap::new();
    let mut name_index: NameIndex = NameIndex::new();

    log::info!("Reading names table");
    for_each_row(names_path, "names", 4, |fields: &[&str]| {
        if fields[3].contains("scientific name") {
            names.insert(fields[0].to_string(), fields[1].to_string());
            if build_reverse_index {
                name_index.insert(fields[1].to_string(), fields[0].to_string());
            }
        }
        Ok(())
    })?;

    let mut records: AHashMap<String, TaxonRecord> = AHashMap::with_capacity(names.len());

    log::info!("Reading nodes table");
    for_each_row(nodes_path, "nodes", 3, |fields: &[&str]| {
        let taxid = fields[0];
        let name = names
            .get(taxid)
            .ok_or_else(|| SidrError::MissingNodeName(taxid.to_string()))?;
        records.insert(
            taxid.to_string(),
            TaxonRecord::Active {
                name: name.clone(),
                parent_id: fields[1].to_string(),
                rank: fields[2].to_string(),
            },
        );
        Ok(())
    })?;

    log::info!("Reading merged table");
    for_each_row(merged_path, "merged", 2, |fields: &[&str]| {
        records.insert(
            fields[0].to_string(),
            TaxonRecord::Merged {
                target_id: fields[1].to_string(),
            },
        );
        Ok(())
    })?;

    log::info!("Reading delnodes table");
    for_each_row(delnodes_path, "delnodes", 1, |fields: &[&str]| {
        records.insert(fields[0].to_string(), TaxonRecord::Deleted);
        Ok(())
    })?;

    log::info!("Taxdump loaded, {} taxon ids", records.len());
    let index = if build_reverse_index {
        Some(name_index)
    } else {
        None
    };
    Ok((TaxonomyStore::from_records(records), index))
}

/// Streams a pipe-delimited dump table, handing each row's trimmed fields to
/// `op`. A row with fewer than `min_fields` fields is a fatal parse error.
fn for_each_row<P, F>(path: P, table: &'static str, min_fields: usize, mut op: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(&[&str]) -> Result<()>,
{
    let reader = open_reader(path)?;
    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() < min_fields {
            return Err(SidrError::MalformedTaxdumpRow {
                table,
                line: idx + 1,
            });
        }
        op(&fields)?;
    }
    Ok(())
}
