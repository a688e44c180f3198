use crate::utils::Result;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub const ARCHIVE_DIR: &str = "logan_data";
pub const ALIGNMENT_DIR: &str = "alignments";
pub const INPUT_DIR: &str = "input_data";
pub const FAILED_LIST: &str = "failed_accessions.txt";

const MAX_NAME_CANDIDATES: usize = 1000;

/// On-disk layout of one run: the root plus the raw-archive cache, the
/// alignments-and-syntheses directory, and the input-data copy directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub archive_dir: PathBuf,
    pub alignment_dir: PathBuf,
    pub input_dir: PathBuf,
}

impl Workspace {
    pub fn create(root: PathBuf) -> Result<Self> {
        let workspace = Self {
            archive_dir: root.join(ARCHIVE_DIR),
            alignment_dir: root.join(ALIGNMENT_DIR),
            input_dir: root.join(INPUT_DIR),
            root,
        };
        for dir in [
            &workspace.root,
            &workspace.archive_dir,
            &workspace.alignment_dir,
            &workspace.input_dir,
        ] {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
        }
        Ok(workspace)
    }

    /// Creates the failure list if needed so that even an all-success run
    /// leaves a readable (empty) list behind.
    pub fn touch_failed_list(&self) -> Result<PathBuf> {
        let path = self.root.join(FAILED_LIST);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
        Ok(path)
    }

    /// Copies the query and accession list into `input_data/` and returns the
    /// copies; the run only ever reads from inside its own workspace.
    pub fn import_inputs(&self, query: &Path, accessions: &Path) -> Result<(PathBuf, PathBuf)> {
        let query_copy = self.input_dir.join(base_name(query)?);
        let accessions_copy = self.input_dir.join(base_name(accessions)?);
        for (src, dst) in [(query, &query_copy), (accessions, &accessions_copy)] {
            fs::copy(src, dst).map_err(|e| {
                format!(
                    "Failed to copy {} to {}: {}",
                    src.display(),
                    dst.display(),
                    e
                )
            })?;
        }
        Ok((query_copy, accessions_copy))
    }
}

/// Default workspace name for accession/query runs: the query basename up to
/// its first dot, suffixed with the first free number.
pub fn default_root(query: &Path, base_dir: &Path) -> Result<PathBuf> {
    let stem = query_stem(query);
    for i in 1..=MAX_NAME_CANDIDATES {
        let candidate = base_dir.join(format!("{}_{}", stem, i));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(format!(
        "Could not find a free directory name based on {} after {} attempts; use --output",
        stem, MAX_NAME_CANDIDATES
    ))
}

pub fn query_stem(query: &Path) -> String {
    query
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("query")
        .to_string()
}

fn base_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| format!("{} has no file name", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_builds_directory_tree() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::create(dir.path().join("run")).unwrap();
        assert!(workspace.archive_dir.is_dir());
        assert!(workspace.alignment_dir.is_dir());
        assert!(workspace.input_dir.is_dir());
    }

    #[test]
    fn test_touch_failed_list_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::create(dir.path().join("run")).unwrap();
        let path = workspace.touch_failed_list().unwrap();
        assert!(path.is_file());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_import_inputs_copies_into_input_dir() {
        let dir = TempDir::new().unwrap();
        let query = dir.path().join("query.fa");
        let accessions = dir.path().join("accessions.txt");
        fs::write(&query, ">q1\nACGT\n").unwrap();
        fs::write(&accessions, "SRR1\nSRR2\n").unwrap();

        let workspace = Workspace::create(dir.path().join("run")).unwrap();
        let (query_copy, accessions_copy) =
            workspace.import_inputs(&query, &accessions).unwrap();
        assert_eq!(query_copy, workspace.input_dir.join("query.fa"));
        assert_eq!(fs::read_to_string(&query_copy).unwrap(), ">q1\nACGT\n");
        assert_eq!(fs::read_to_string(&accessions_copy).unwrap(), "SRR1\nSRR2\n");
    }

    #[test]
    fn test_default_root_picks_first_free_candidate() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("query_1")).unwrap();
        fs::create_dir(dir.path().join("query_2")).unwrap();
        let root = default_root(Path::new("query.fa"), dir.path()).unwrap();
        assert_eq!(root, dir.path().join("query_3"));
    }

    #[test]
    fn test_query_stem_cuts_at_first_dot() {
        assert_eq!(query_stem(Path::new("/data/sample.fasta.gz")), "sample");
        assert_eq!(query_stem(Path::new("plain")), "plain");
    }
}
