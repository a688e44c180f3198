use crate::utils::Result;
use std::fs;
use std::path::Path;

const NAME_MARKER: &str = "Query=";
const LENGTH_MARKER: &str = "Length=";
const HIT_MARKER: &str = "Query ";

/// Per-query digest of one pairwise alignment report: the declared query name
/// and length, and how many hit spans cover each query position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub query_name: Option<String>,
    pub query_length: Option<usize>,
    pub coverage: Vec<u32>,
}

impl AlignmentSummary {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Alignment report {}: {}", path.display(), e))?;
        Ok(Self::from_text(&text))
    }

    /// The first `Query=` line names the query and the first `Length=` line
    /// declares its length. Without a length declaration the coverage array
    /// stays empty. Hit lines carry 1-based inclusive coordinates in their
    /// 2nd and 4th tokens; malformed hit lines are skipped.
    pub fn from_text(text: &str) -> Self {
        let query_name = text
            .lines()
            .find_map(|line| line.strip_prefix(NAME_MARKER))
            .map(|rest| rest.trim().to_string());
        let query_length = text
            .lines()
            .find_map(|line| line.strip_prefix(LENGTH_MARKER))
            .and_then(|rest| rest.trim().parse::<usize>().ok());

        let Some(length) = query_length else {
            return Self {
                query_name,
                query_length: None,
                coverage: Vec::new(),
            };
        };

        let mut coverage = vec![0u32; length];
        for line in text.lines() {
            if !line.starts_with(HIT_MARKER) {
                continue;
            }
            let Some((start, end)) = parse_hit_span(line) else {
                continue;
            };
            if start == 0 {
                continue;
            }
            for slot in coverage.iter_mut().take(end.min(length)).skip(start - 1) {
                *slot += 1;
            }
        }

        Self {
            query_name,
            query_length,
            coverage,
        }
    }
}

fn parse_hit_span(line: &str) -> Option<(usize, usize)> {
    let mut tokens = line.split_whitespace();
    let start = tokens.nth(1)?.parse().ok()?;
    let end = tokens.nth(1)?.parse().ok()?;
    Some((start, end))
}
