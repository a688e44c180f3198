use crate::utils::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Returns the sequence of the first FASTA record, concatenated across
/// wrapped lines. Records after the first are ignored.
pub fn first_record_seq(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| format!("File {}: {}", path.display(), e))?;
    read_first_seq(BufReader::new(file))
        .map_err(|e| format!("Error reading {}: {}", path.display(), e))
}

/// Returns the identifier of the first FASTA record, i.e. the first
/// whitespace-separated token of its header line.
pub fn first_record_id(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| format!("File {}: {}", path.display(), e))?;
    read_first_id(BufReader::new(file))
        .map_err(|e| format!("Error reading {}: {}", path.display(), e))
}

fn read_first_seq<R: BufRead>(reader: R) -> Result<String> {
    let mut seq = String::new();
    for line in reader.lines() {
        let line = line.map_err(|e| e.to_string())?;
        if line.starts_with('>') {
            if !seq.is_empty() {
                break;
            }
            continue;
        }
        seq.push_str(line.trim());
    }
    Ok(seq)
}

fn read_first_id<R: BufRead>(reader: R) -> Result<String> {
    for line in reader.lines() {
        let line = line.map_err(|e| e.to_string())?;
        if let Some(header) = line.strip_prefix('>') {
            return header
                .split_whitespace()
                .next()
                .map(str::to_string)
                .ok_or_else(|| "FASTA header carries no identifier".to_string());
        }
    }
    Err("No FASTA header found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_first_seq_multiline() {
        let data = ">q1 some description\nACGT\nACGT\nTT\n";
        let seq = read_first_seq(Cursor::new(data)).unwrap();
        assert_eq!(seq, "ACGTACGTTT");
    }

    #[test]
    fn test_first_seq_stops_at_second_record() {
        let data = ">q1\nACGT\n>q2\nGGGG\n";
        let seq = read_first_seq(Cursor::new(data)).unwrap();
        assert_eq!(seq, "ACGT");
    }

    #[test]
    fn test_first_seq_no_records() {
        let seq = read_first_seq(Cursor::new("")).unwrap();
        assert_eq!(seq, "");
    }

    #[test]
    fn test_first_id_strips_description() {
        let data = ">q1 sampled from soil\nACGT\n";
        assert_eq!(read_first_id(Cursor::new(data)).unwrap(), "q1");
    }

    #[test]
    fn test_first_id_missing_header() {
        assert!(read_first_id(Cursor::new("ACGT\n")).is_err());
    }

    #[test]
    fn test_first_id_empty_header() {
        assert!(read_first_id(Cursor::new(">\nACGT\n")).is_err());
    }
}
