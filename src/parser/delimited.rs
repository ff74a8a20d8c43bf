//! # Delimited Text Reader
//!
//! CSV/TSV ingestion on top of the `csv` crate. Records may have uneven
//! lengths; alignment to the header happens in [`ParsedTable`].

use csv::ReaderBuilder;

use super::errors::{ParseError, ParseResult};
use super::table::ParsedTable;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Candidate separators for sniffing, in tie-break order.
const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Parse delimited text with a fixed separator.
pub fn parse_delimited(content: &[u8], delimiter: u8) -> ParseResult<ParsedTable> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ParseError::malformed("delimited", e))?;
        grid.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    ParsedTable::from_grid(grid)
}

/// Guess the separator from the first line.
///
/// Picks the candidate occurring most often outside quotes; falls back to
/// a comma.
pub fn sniff_delimiter(content: &[u8]) -> u8 {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let mut counts = [0usize; CANDIDATES.len()];
    let mut quoted = false;

    for &byte in content {
        match byte {
            b'"' => quoted = !quoted,
            b'\n' | b'\r' if !quoted => break,
            _ if !quoted => {
                if let Some(pos) = CANDIDATES.iter().position(|&c| c == byte) {
                    counts[pos] += 1;
                }
            }
            _ => {}
        }
    }

    let mut best = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = i;
        }
    }
    CANDIDATES[best]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let table = parse_delimited(b"Region,Amount\nWest,100\nEast,200\n", b',').unwrap();
        assert_eq!(table.columns(), &["Region", "Amount"]);
        assert_eq!(table.rows(), &[vec!["West", "100"], vec!["East", "200"]]);
    }

    #[test]
    fn test_quoted_fields() {
        let table = parse_delimited(b"name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n", b',').unwrap();
        assert_eq!(table.rows()[0], vec!["Smith, J", "said \"hi\""]);
    }

    #[test]
    fn test_ragged_rows_are_aligned() {
        let table = parse_delimited(b"a,b,c\n1\n1,2,3,4\n", b',').unwrap();
        assert_eq!(table.rows()[0], vec!["1", "", ""]);
        assert_eq!(table.rows()[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let table = parse_delimited(b"\xEF\xBB\xBFid,name\n1,x\n", b',').unwrap();
        assert_eq!(table.columns()[0], "id");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_delimited(b"", b','), Err(ParseError::EmptyContent));
        assert_eq!(parse_delimited(b"\n\n", b','), Err(ParseError::EmptyContent));
    }

    #[test]
    fn test_tab_separated() {
        let table = parse_delimited(b"a\tb\n1\t2\n", b'\t').unwrap();
        assert_eq!(table.rows()[0], vec!["1", "2"]);
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter(b"a\tb\n"), b'\t');
        assert_eq!(sniff_delimiter(b"\"x;y\",b\n"), b',');
        assert_eq!(sniff_delimiter(b"single\n"), b',');
    }
}
