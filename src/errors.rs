use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SidrError>;

/// Every failure mode the pipeline can signal. All variants carry the
/// offending id or row so the caller can report exactly what broke.
#[derive(Debug, Error)]
pub enum SidrError {
    /// The classification source referenced a taxon id that has been removed
    /// from the NCBI dump. The dump and the BLAST results are out of sync.
    #[error("taxon id {0} has been deleted from the NCBI taxonomy; update the taxdump and re-run BLAST")]
    TaxonDeleted(String),

    /// The taxon id is absent from the loaded dump entirely.
    #[error("taxon id {0} was not found in the NCBI taxonomy; update the taxdump and try again")]
    TaxonNotFound(String),

    /// The parent walk revisited a node or exceeded the depth bound. The dump
    /// graph is corrupted; always fatal.
    #[error("taxonomy cycle detected while resolving taxon id {0}")]
    TaxonomyCycle(String),

    /// A contig id appeared more than once across the merged feature sources.
    #[error("duplicate contig id {0} in input data")]
    DuplicateContig(String),

    /// A contig's feature keys do not match the schema established by the
    /// first contig seen.
    #[error("contig {contig_id} does not match the feature schema: {detail}")]
    InconsistentFeatureSet { contig_id: String, detail: String },

    /// A taxdump table row had too few pipe-delimited fields.
    #[error("malformed row in {table} table at line {line}")]
    MalformedTaxdumpRow { table: &'static str, line: usize },

    /// A nodes-table id with no corresponding names-table entry. Names must
    /// be loaded before nodes.
    #[error("no scientific name loaded for node id {0}; names table must cover every node id")]
    MissingNodeName(String),

    /// A reader input row that could not be parsed.
    #[error("malformed row in {path} at line {line}")]
    MalformedRow { path: String, line: usize },

    /// A run-file 'Origin' organism name with no entry in the name index.
    #[error("origin name {0:?} was not found in the taxonomy names table")]
    UnknownOrigin(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
