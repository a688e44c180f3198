use std::fmt;
use std::path::PathBuf;

/// The two assembled-sequence representations published per accession.
/// Unitig sets are the larger fallback search space for sequences that were
/// not assembled into contigs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Contig,
    Unitig,
}

impl Flavor {
    pub fn name(&self) -> &'static str {
        match self {
            Flavor::Contig => "contig",
            Flavor::Unitig => "unitig",
        }
    }

    /// Top-level key prefix in the logan-pub bucket.
    pub fn bucket_prefix(&self) -> &'static str {
        match self {
            Flavor::Contig => "c",
            Flavor::Unitig => "u",
        }
    }

    pub fn archive_name(&self, accession: &str) -> String {
        format!("{}.{}s.fa.zst", accession, self.name())
    }

    pub fn recruited_name(&self, accession: &str) -> String {
        format!("{}.recruited_{}s.fa", accession, self.name())
    }

    pub fn object_uri(&self, accession: &str) -> String {
        format!(
            "s3://logan-pub/{}/{}/{}",
            self.bucket_prefix(),
            accession,
            self.archive_name(accession)
        )
    }

    pub fn object_url(&self, accession: &str) -> String {
        format!(
            "https://s3.amazonaws.com/logan-pub/{}/{}/{}",
            self.bucket_prefix(),
            accession,
            self.archive_name(accession)
        )
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable per-run configuration threaded through the batch loop.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub archive_dir: PathBuf,
    pub alignment_dir: PathBuf,
    pub query_file: PathBuf,
    pub accession_file: PathBuf,
    pub flavor: Flavor,
    pub kmer_size: usize,
    /// 0 means unlimited.
    pub limit: usize,
    pub delete_intermediates: bool,
    /// Absent in unitig flavor, which is itself the recovery path.
    pub failure_sink: Option<PathBuf>,
}

impl RunContext {
    pub fn archive_path(&self, accession: &str) -> PathBuf {
        self.archive_dir.join(self.flavor.archive_name(accession))
    }

    pub fn recruited_path(&self, accession: &str) -> PathBuf {
        self.archive_dir.join(self.flavor.recruited_name(accession))
    }
}
