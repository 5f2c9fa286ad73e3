use crate::error::LoadError;
use crate::types::RawTable;
use csv::ReaderBuilder;
use log::{debug, warn};
use std::path::Path;

/// Candidate text encodings for the source file, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// ISO-8859-1. Every byte maps directly to the Unicode scalar with the
    /// same value, so this decode cannot fail; it belongs last in the
    /// candidate list.
    Latin1,
}

/// Default candidate order for this dataset's known export variants.
pub const DEFAULT_ENCODINGS: &[TextEncoding] = &[TextEncoding::Utf8, TextEncoding::Latin1];

/// Read a delimited text file into a [`RawTable`].
///
/// Column labels are preserved verbatim (arbitrary casing/spacing); no fixed
/// column order is assumed. Rows are padded or truncated to header width so
/// downstream code can index by column position. Only unreadable, empty or
/// structurally non-tabular input is fatal.
pub fn read_table(path: &Path, encodings: &[TextEncoding]) -> Result<RawTable, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(&bytes, encodings)
}

/// Decode and parse an already-read byte buffer.
pub fn parse_bytes(bytes: &[u8], encodings: &[TextEncoding]) -> Result<RawTable, LoadError> {
    let text = decode(bytes, encodings)?;
    parse_table(&text)
}

/// Decode raw bytes with the first candidate encoding that accepts them.
pub fn decode(bytes: &[u8], encodings: &[TextEncoding]) -> Result<String, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }
    for enc in encodings {
        match enc {
            TextEncoding::Utf8 => match std::str::from_utf8(bytes) {
                Ok(s) => return Ok(s.to_string()),
                Err(e) => debug!("utf-8 decode rejected input: {}", e),
            },
            TextEncoding::Latin1 => {
                warn!("falling back to latin-1 decode");
                return Ok(bytes.iter().map(|&b| b as char).collect());
            }
        }
    }
    Err(LoadError::Encoding)
}

fn parse_table(text: &str) -> Result<RawTable, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if columns.is_empty() {
        return Err(LoadError::Empty);
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("skipping malformed row: {}", e);
                skipped += 1;
                continue;
            }
        };
        let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }
    if skipped > 0 {
        warn!("{} malformed rows skipped during ingest", skipped);
    }
    Ok(RawTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_rows() {
        let t = parse_table("A,B\n1,2\n3,4\n").unwrap();
        assert_eq!(t.columns, vec!["A", "B"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn pads_short_rows_to_header_width() {
        let t = parse_table("A,B,C\n1,2\n").unwrap();
        assert_eq!(t.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn empty_input_is_fatal() {
        assert!(matches!(decode(b"", DEFAULT_ENCODINGS), Err(LoadError::Empty)));
    }

    #[test]
    fn latin1_fallback_decodes_accented_bytes() {
        // "Bogotá" encoded as ISO-8859-1; invalid as UTF-8.
        let bytes = b"Bogot\xe1";
        let s = decode(bytes, DEFAULT_ENCODINGS).unwrap();
        assert_eq!(s, "Bogotá");
    }

    #[test]
    fn utf8_preferred_when_valid() {
        let s = decode("Bogotá".as_bytes(), DEFAULT_ENCODINGS).unwrap();
        assert_eq!(s, "Bogotá");
    }

    #[test]
    fn exhausted_candidates_error() {
        let bytes = b"Bogot\xe1";
        assert!(matches!(
            decode(bytes, &[TextEncoding::Utf8]),
            Err(LoadError::Encoding)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_table(Path::new("definitely/not/here.csv"), DEFAULT_ENCODINGS)
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
