use crate::pipeline::context::Flavor;
use crate::utils::Result;
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Narrow seam around the three external executables so that the batch loop
/// can be exercised against fakes.
pub trait ToolRunner {
    /// Downloads one accession's archive to `dest`. On failure no file may be
    /// left at `dest`.
    fn fetch(&self, accession: &str, flavor: Flavor, dest: &Path) -> Result<()>;

    /// Filters `archive` down to the sequences sharing k-mers with `query`,
    /// writing a FASTA (possibly empty) to `out`.
    fn recruit(&self, kmer_size: usize, query: &Path, archive: &Path, out: &Path) -> Result<()>;

    /// Aligns `query` against `target`, writing a textual report to `report`.
    fn align(&self, query: &Path, target: &Path, report: &Path) -> Result<()>;
}

/// Runs the real tools: `aws s3 cp` (or `wget` when the AWS CLI is absent),
/// `back_to_sequences`, and `blastn`.
pub struct SystemTools {
    use_aws: bool,
}

impl SystemTools {
    pub fn new() -> Self {
        Self {
            use_aws: find_in_path("aws").is_some(),
        }
    }
}

impl Default for SystemTools {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRunner for SystemTools {
    fn fetch(&self, accession: &str, flavor: Flavor, dest: &Path) -> Result<()> {
        let result = if self.use_aws {
            run_checked(
                Command::new("aws")
                    .args(["s3", "cp"])
                    .arg(flavor.object_uri(accession))
                    .arg(dest)
                    .arg("--no-sign-request"),
                "aws s3 cp",
            )
        } else {
            run_checked(
                Command::new("wget")
                    .arg("-q")
                    .arg("-O")
                    .arg(dest)
                    .arg(flavor.object_url(accession)),
                "wget",
            )
        };
        if result.is_err() {
            // wget -O leaves an empty file behind, which would later pass the
            // cache presence check
            let _ = fs::remove_file(dest);
        }
        result
    }

    fn recruit(&self, kmer_size: usize, query: &Path, archive: &Path, out: &Path) -> Result<()> {
        run_checked(
            Command::new("back_to_sequences")
                .arg("--kmer-size")
                .arg(kmer_size.to_string())
                .arg("--in-kmers")
                .arg(query)
                .arg("--in-sequences")
                .arg(archive)
                .arg("--out-sequences")
                .arg(out),
            "back_to_sequences",
        )
    }

    fn align(&self, query: &Path, target: &Path, report: &Path) -> Result<()> {
        run_checked(
            Command::new("blastn")
                .arg("-query")
                .arg(query)
                .arg("-subject")
                .arg(target)
                .arg("-out")
                .arg(report)
                .args(["-outfmt", "0"])
                .args(["-sorthits", "0"])
                .args(["-word_size", "11"])
                .args(["-gapextend", "2"])
                .args(["-gapopen", "5"])
                .args(["-reward", "2"])
                .args(["-penalty", "-3"]),
            "blastn",
        )
    }
}

pub(crate) fn run_checked(cmd: &mut Command, what: &str) -> Result<()> {
    log::debug!("Running command: {}", render_command(cmd));
    let output = cmd
        .stdout(Stdio::null())
        .output()
        .map_err(|e| format!("Failed to launch {}: {}", what, e))?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!(
            "{} exited with {}: {}",
            what,
            output.status,
            stderr.trim()
        ))
    }
}

fn render_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|arg| arg.to_string_lossy())
        .join(" ")
}

pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Fails with the full list of missing executables so the user can install
/// them in one go.
pub fn require_tools(names: &[&str]) -> Result<()> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| find_in_path(name).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Required tool(s) not found in PATH: {}",
            missing.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_failure_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("NO-SUCH-ACCESSION.contigs.fa.zst");
        // simulate a partial download from an interrupted earlier attempt
        fs::write(&dest, b"trunc").unwrap();
        let tools = SystemTools { use_aws: false };
        let result = tools.fetch("NO-SUCH-ACCESSION", Flavor::Contig, &dest);
        assert!(result.is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn test_render_command_joins_program_and_args() {
        let mut cmd = Command::new("blastn");
        cmd.args(["-outfmt", "0"]).arg("-query").arg("q.fa");
        assert_eq!(render_command(&cmd), "blastn -outfmt 0 -query q.fa");
    }

    #[test]
    fn test_find_in_path_misses_nonexistent_tool() {
        assert!(find_in_path("definitely-not-a-real-tool-name").is_none());
    }

    #[test]
    fn test_require_tools_lists_all_missing() {
        let err = require_tools(&["no-such-tool-a", "no-such-tool-b"]).unwrap_err();
        assert!(err.contains("no-such-tool-a"));
        assert!(err.contains("no-such-tool-b"));
    }

    #[test]
    fn test_run_checked_reports_launch_failure() {
        let mut cmd = Command::new("definitely-not-a-real-tool-name");
        let err = run_checked(&mut cmd, "fake tool").unwrap_err();
        assert!(err.contains("Failed to launch fake tool"));
    }

    #[test]
    fn test_run_checked_reports_nonzero_exit() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo boom >&2; exit 3"]);
        let err = run_checked(&mut cmd, "sh").unwrap_err();
        assert!(err.contains("boom"));
    }
}
