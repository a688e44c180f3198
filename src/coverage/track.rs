use std::io::{self, Write};

/// Positions rendered per block.
const LINE_WIDTH: usize = 80;
/// Width of the `query  ` prefix plus the two spaces after the position label.
const LABEL_PAD: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMode {
    /// `-` for uncovered positions, `|` for any coverage.
    Presence,
    /// `-` for uncovered positions, `a`..`z` for 1 to 26 hits, `Z` above.
    Abundance,
}

fn symbol(count: u32, mode: TrackMode) -> char {
    match (mode, count) {
        (_, 0) => '-',
        (TrackMode::Presence, _) => '|',
        (TrackMode::Abundance, 1..=26) => (b'a' + count as u8 - 1) as char,
        (TrackMode::Abundance, _) => 'Z',
    }
}

/// Renders the query sequence and its coverage as fixed-width wrapped blocks.
/// Each block shows the right-aligned 1-based start position, the sequence
/// slice, and one coverage symbol per position; blocks end with a blank line.
/// Output depends only on the inputs.
pub fn render<W: Write>(
    out: &mut W,
    query_name: &str,
    sequence: &str,
    coverage: &[u32],
    mode: TrackMode,
) -> io::Result<()> {
    // nucleotide sequences are ASCII; byte offsets below double as
    // character offsets
    debug_assert!(sequence.is_ascii());
    debug_assert_eq!(sequence.len(), coverage.len());
    writeln!(out, "Query: {}", query_name)?;

    let len = sequence.len();
    let width = len.to_string().len();
    let mut pos = 0;
    loop {
        let end = usize::min(pos + LINE_WIDTH, len);
        writeln!(
            out,
            "query  {:>width$}  {}",
            pos + 1,
            &sequence[pos..end],
            width = width
        )?;
        let track: String = coverage[pos..end]
            .iter()
            .map(|&count| symbol(count, mode))
            .collect();
        writeln!(out, "{:pad$}{}", "", track, pad = LABEL_PAD + width)?;
        writeln!(out)?;
        if end == len {
            break;
        }
        pos = end;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(
        name: &str,
        sequence: &str,
        coverage: &[u32],
        mode: TrackMode,
    ) -> String {
        let mut buf = Vec::new();
        render(&mut buf, name, sequence, coverage, mode).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_presence_track_single_hit() {
        let out = render_to_string("q1", "ACGTA", &[0, 1, 1, 1, 0], TrackMode::Presence);
        assert_eq!(out, "Query: q1\nquery  1  ACGTA\n          -|||-\n\n");
    }

    #[test]
    fn test_abundance_track_overlapping_hits() {
        let out = render_to_string("q1", "ACGTA", &[1, 2, 2, 2, 1], TrackMode::Abundance);
        assert_eq!(out, "Query: q1\nquery  1  ACGTA\n          abbba\n\n");
    }

    #[test]
    fn test_abundance_symbols_map_counts_to_letters() {
        assert_eq!(symbol(0, TrackMode::Abundance), '-');
        assert_eq!(symbol(1, TrackMode::Abundance), 'a');
        assert_eq!(symbol(26, TrackMode::Abundance), 'z');
        assert_eq!(symbol(27, TrackMode::Abundance), 'Z');
        assert_eq!(symbol(1000, TrackMode::Abundance), 'Z');
    }

    #[test]
    fn test_presence_symbols_are_binary() {
        assert_eq!(symbol(0, TrackMode::Presence), '-');
        assert_eq!(symbol(1, TrackMode::Presence), '|');
        assert_eq!(symbol(500, TrackMode::Presence), '|');
    }

    #[test]
    fn test_wrapping_at_eighty_positions() {
        let sequence: String = std::iter::repeat('A').take(85).collect();
        let coverage = vec![1u32; 85];
        let out = render_to_string("q1", &sequence, &coverage, TrackMode::Presence);
        let lines: Vec<&str> = out.lines().collect();
        // header, then two blocks of (label line, track line, blank)
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], format!("query   1  {}", "A".repeat(80)));
        assert_eq!(lines[2], format!("{}{}", " ".repeat(11), "|".repeat(80)));
        assert_eq!(lines[4], format!("query  81  {}", "A".repeat(5)));
        assert_eq!(lines[5], format!("{}{}", " ".repeat(11), "|".repeat(5)));
    }

    #[test]
    fn test_exact_multiple_of_width_has_no_empty_block() {
        let sequence: String = std::iter::repeat('C').take(160).collect();
        let coverage = vec![0u32; 160];
        let out = render_to_string("q1", &sequence, &coverage, TrackMode::Presence);
        // header + 2 blocks of 3 lines (the trailing blank line is not a block)
        assert_eq!(out.lines().count(), 7);
    }

    #[test]
    #[should_panic]
    fn test_non_ascii_sequence_is_rejected_in_debug_builds() {
        // "É" is two bytes, so coverage is sized to match the byte length
        let mut buf = Vec::new();
        render(&mut buf, "q1", "AÉ", &[0, 0, 0], TrackMode::Presence).unwrap();
    }

    #[test]
    fn test_render_is_deterministic() {
        let coverage = [0, 3, 27, 1, 0];
        let first = render_to_string("q1", "ACGTA", &coverage, TrackMode::Abundance);
        let second = render_to_string("q1", "ACGTA", &coverage, TrackMode::Abundance);
        assert_eq!(first, second);
        assert_eq!(first, "Query: q1\nquery  1  ACGTA\n          -cZa-\n\n");
    }
}
