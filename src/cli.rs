use crate::utils::Result;
use clap::{ArgAction, Parser};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug)]
#[command(name = "loganseek",
          version,
          about = "Recruits Logan sequences matching a FASTA query and reports per-position alignment coverage",
          long_about = None,
          arg_required_else_help = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}")]
pub struct Args {
    #[clap(short = 's')]
    #[clap(long = "session")]
    #[clap(value_name = "SESSION_ID")]
    #[clap(help = "Logan Search session ID")]
    #[clap(conflicts_with_all = ["accessions", "query"])]
    pub session: Option<String>,

    #[clap(short = 'a')]
    #[clap(long = "accessions")]
    #[clap(value_name = "FILE")]
    #[clap(help = "Path to a newline-delimited accession list")]
    #[clap(required_unless_present = "session")]
    #[clap(requires = "query")]
    #[arg(value_parser = check_file_exists)]
    pub accessions: Option<PathBuf>,

    #[clap(short = 'q')]
    #[clap(long = "query")]
    #[clap(value_name = "FASTA")]
    #[clap(help = "Path to the query FASTA file")]
    #[clap(required_unless_present = "session")]
    #[clap(requires = "accessions")]
    #[arg(value_parser = check_file_exists)]
    pub query: Option<PathBuf>,

    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "DIR")]
    #[clap(help = "Output directory (default: derived from the query name or session ID)")]
    pub output: Option<String>,

    #[clap(short = 'u')]
    #[clap(long = "unitigs")]
    #[clap(help = "Search unitig sets instead of contig sets")]
    pub unitigs: bool,

    #[clap(short = 'k')]
    #[clap(long = "kmer-size")]
    #[clap(value_name = "K")]
    #[clap(help = "K-mer size for sequence recruitment")]
    #[clap(default_value = "17")]
    #[arg(value_parser = kmer_size_in_range)]
    pub kmer_size: usize,

    #[clap(short = 'l')]
    #[clap(long = "limit")]
    #[clap(value_name = "N")]
    #[clap(help = "Maximum number of accessions to attempt (0 = unlimited)")]
    #[clap(default_value = "0")]
    #[arg(value_parser = non_negative_limit)]
    pub limit: usize,

    #[clap(short = 'd')]
    #[clap(long = "delete")]
    #[clap(help = "Delete per-accession intermediate files after processing")]
    pub delete: bool,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

pub fn init_verbose(args: &Args) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn kmer_size_in_range(s: &str) -> Result<usize> {
    let kmer_size: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid k-mer size", s))?;
    if kmer_size >= 1 {
        Ok(kmer_size)
    } else {
        Err("K-mer size must be a positive integer".into())
    }
}

fn non_negative_limit(s: &str) -> Result<usize> {
    s.parse()
        .map_err(|_| format!("`{}` is not a valid non-negative limit", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_conflicts_with_accessions() {
        let result = Args::try_parse_from(["loganseek", "-s", "abc123", "-a", "accessions.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_accessions_requires_query() {
        let result = Args::try_parse_from(["loganseek", "-a", "accessions.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_alone_is_accepted() {
        let args = Args::try_parse_from(["loganseek", "-s", "abc123"]).unwrap();
        assert_eq!(args.session.as_deref(), Some("abc123"));
        assert_eq!(args.kmer_size, 17);
        assert_eq!(args.limit, 0);
        assert!(!args.unitigs);
    }

    #[test]
    fn test_zero_kmer_size_is_rejected() {
        let result = Args::try_parse_from(["loganseek", "-s", "abc123", "-k", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        let result = Args::try_parse_from(["loganseek", "-s", "abc123", "-l", "-1"]);
        assert!(result.is_err());
    }
}
