//src/lineage_parser.rs

use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{LineageError, Result};
use crate::types::{LineageEntry, TaxonRecord};

/// Reads a lineage listing from disk. Files ending in `.gz` are decompressed.
pub fn read_lineage_listing<P: AsRef<Path>>(path: P) -> Result<Vec<TaxonRecord>> {
    let path = path.as_ref();
    let f = File::open(path)?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let mut reader: Box<dyn Read> = if is_gz {
        Box::new(MultiGzDecoder::new(BufReader::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let records = parse_lineage_listing(&text)?;
    log::info!("Read {} lineage records from {}", records.len(), path.display());
    Ok(records)
}

/// Parses a listing of records shaped like
/// ```text
/// <taxid> <taxid>;<name>(<rank>)|<taxid>;<name>(<rank>)|...
/// ```
/// Whitespace between and inside tokens is free-form, so listings that were
/// re-wrapped one word per line parse the same as canonical ones. A leading
/// `/* ... */` block and `#` comment lines are skipped.
pub fn parse_lineage_listing(text: &str) -> Result<Vec<TaxonRecord>> {
    let mut cur = Cursor::new(text);
    cur.skip_header()?;

    let mut records = Vec::new();
    loop {
        cur.skip_trivia();
        if cur.is_eof() {
            break;
        }
        records.push(cur.parse_record()?);
    }
    log::debug!("Parsed {} records", records.len());
    Ok(records)
}

/// `<taxid>;<name>(<rank>)`
pub fn format_entry(entry: &LineageEntry) -> String {
    format!("{};{}({})", entry.tax_id, entry.scientific_name, entry.rank)
}

/// Canonical single-line form of a record, without trailing newline.
pub fn format_record(record: &TaxonRecord) -> String {
    let chain: Vec<String> = record.lineage.iter().map(format_entry).collect();
    format!("{}\t{}", record.tax_id, chain.join("|"))
}

pub fn format_listing(records: &[TaxonRecord]) -> String {
    let mut output = String::new();
    for record in records {
        writeln!(output, "{}", format_record(record)).unwrap();
    }
    output
}

/// Collapses whitespace runs (including line breaks) into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn line_at(src: &str, pos: usize) -> usize {
    src.as_bytes()[..pos].iter().filter(|&&b| b == b'\n').count() + 1
}

fn describe(b: Option<u8>) -> String {
    match b {
        Some(b) => format!("'{}'", b as char),
        None => "end of input".to_string(),
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> LineageError {
        LineageError::Parse {
            line: line_at(self.src, pos),
            message: message.into(),
        }
    }

    fn error(&self, message: impl Into<String>) -> LineageError {
        self.error_at(self.pos, message)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Whitespace plus `#` comment lines.
    fn skip_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'#') {
                break;
            }
            match self.src[self.pos..].find('\n') {
                Some(off) => self.pos += off + 1,
                None => self.pos = self.src.len(),
            }
        }
    }

    fn skip_header(&mut self) -> Result<()> {
        self.skip_whitespace();
        if !self.src[self.pos..].starts_with("/*") {
            return Ok(());
        }
        match self.src[self.pos + 2..].find("*/") {
            Some(off) => {
                self.pos += 2 + off + 2;
                Ok(())
            }
            None => Err(self.error("unterminated '/*' header block")),
        }
    }

    fn parse_taxid(&mut self) -> Result<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error(format!("expected taxid, found {}", describe(self.peek()))));
        }
        let digits = &self.src[start..self.pos];
        digits
            .parse::<u32>()
            .map_err(|_| self.error_at(start, format!("taxid '{digits}' is out of range")))
    }

    fn parse_record(&mut self) -> Result<TaxonRecord> {
        let start = self.pos;
        let tax_id = self.parse_taxid()?;

        self.skip_whitespace();
        if self.is_eof() || self.peek() == Some(b'#') {
            return Err(self.error_at(start, format!("taxid {tax_id} has no lineage entries")));
        }

        let mut lineage = Vec::new();
        loop {
            self.skip_whitespace();
            lineage.push(self.parse_entry()?);
            self.skip_whitespace();
            if self.peek() == Some(b'|') {
                self.pos += 1;
            } else {
                break;
            }
        }

        Ok(TaxonRecord { tax_id, lineage })
    }

    fn parse_entry(&mut self) -> Result<LineageEntry> {
        let start = self.pos;
        let tax_id = self.parse_taxid()?;

        self.skip_whitespace();
        if self.peek() != Some(b';') {
            return Err(self.error(format!(
                "expected ';' after taxid {tax_id}, found {}",
                describe(self.peek())
            )));
        }
        self.pos += 1;

        let body = self.scan_entry_body(tax_id)?;
        // The rank is the last parenthesised group; names may hold parentheses too.
        let open = body
            .rfind('(')
            .ok_or_else(|| self.error_at(start, format!("taxid {tax_id} is missing its '(rank)'")))?;

        let scientific_name = normalize_whitespace(&body[..open]);
        let rank = normalize_whitespace(&body[open + 1..]);
        if scientific_name.is_empty() {
            return Err(self.error_at(start, format!("taxid {tax_id} has an empty name")));
        }
        if rank.is_empty() {
            return Err(self.error_at(start, format!("taxid {tax_id} has an empty rank")));
        }

        Ok(LineageEntry {
            tax_id,
            scientific_name,
            rank,
        })
    }

    /// Returns the text between ';' and the closing ')' of the entry.
    /// An entry closes at a ')' followed by '|', a digit, a comment or end of input.
    fn scan_entry_body(&mut self, tax_id: u32) -> Result<&'a str> {
        let bytes = self.src.as_bytes();
        let mut i = self.pos;
        while i < bytes.len() {
            match bytes[i] {
                b'|' => break,
                b')' => {
                    let mut j = i + 1;
                    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    if j == bytes.len() || matches!(bytes[j], b'|' | b'#') || bytes[j].is_ascii_digit() {
                        let body = &self.src[self.pos..i];
                        self.pos = i + 1;
                        return Ok(body);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(self.error(format!("unterminated entry for taxid {tax_id}, expected '(rank)'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const WRAPPED: &str = include_str!("../testdata/taxid_list_wrapped.txt");

    #[test]
    fn test_parse_wrapped_listing() {
        let records = parse_lineage_listing(WRAPPED).expect("fixture parses");
        assert_eq!(records.len(), 3);

        let ids: Vec<u32> = records.iter().map(|r| r.tax_id).collect();
        assert_eq!(ids, vec![1370126, 1282, 451709]);
        assert_eq!(records[0].lineage.len(), 11);
        assert_eq!(records[1].lineage.len(), 10);
        assert_eq!(records[2].lineage.len(), 12);

        let root = &records[0].lineage[0];
        assert_eq!(root.tax_id, 1);
        assert_eq!(root.scientific_name, "root");
        assert_eq!(root.rank, "no rank");

        let cellular = &records[0].lineage[1];
        assert_eq!(cellular.tax_id, 131567);
        assert_eq!(cellular.scientific_name, "cellular organisms");

        let group = &records[0].lineage[8];
        assert_eq!(group.tax_id, 909768);
        assert_eq!(group.scientific_name, "Acinetobacter calcoaceticus / baumannii complex");
        assert_eq!(group.rank, "species group");
    }

    #[test]
    fn test_numeric_word_inside_name() {
        let records = parse_lineage_listing(WRAPPED).unwrap();
        let strain = records[2].terminal().unwrap();
        assert_eq!(strain.tax_id, 451709);
        assert_eq!(strain.scientific_name, "Bacillus cereus 03 BB108");
        assert_eq!(strain.rank, "no rank");
    }

    #[test]
    fn test_canonical_output_reparses() {
        let records = parse_lineage_listing(WRAPPED).unwrap();
        let text = format_listing(&records);
        assert!(text.starts_with("1370126\t1;root(no rank)|131567;cellular organisms(no rank)|2;Bacteria(superkingdom)|"));
        assert_eq!(text.lines().count(), 3);
        assert_eq!(parse_lineage_listing(&text).unwrap(), records);
    }

    #[test]
    fn test_parenthesised_name() {
        let text = "1911\t1;root(no rank)|1911;Bacillus sp. (in: Bacteria)(species)\n";
        let records = parse_lineage_listing(text).unwrap();
        let leaf = records[0].terminal().unwrap();
        assert_eq!(leaf.scientific_name, "Bacillus sp. (in: Bacteria)");
        assert_eq!(leaf.rank, "species");
    }

    #[test]
    fn test_comment_lines_are_skipped() {
        let text = "# produced by classifier\n2\t1;root(no rank)|2;Bacteria(superkingdom)\n# trailer\n";
        let records = parse_lineage_listing(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].lineage.len(), 2);
    }

    #[test]
    fn test_missing_semicolon_reports_line() {
        let text = "2\t1;root(no rank)|2;Bacteria(superkingdom)\n3\n1 root(no rank)\n";
        match parse_lineage_listing(text) {
            Err(LineageError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("expected ';'"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_rank_is_error() {
        let err = parse_lineage_listing("2\t1;root|2;Bacteria(superkingdom)\n").unwrap_err();
        assert!(matches!(err, LineageError::Parse { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn test_record_without_lineage_is_error() {
        let err = parse_lineage_listing("2\t1;root(no rank)\n\n562\n").unwrap_err();
        match err {
            LineageError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("562"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_trailing_pipe_is_error() {
        assert!(parse_lineage_listing("2\t1;root(no rank)|").is_err());
    }

    #[test]
    fn test_unterminated_header() {
        let err = parse_lineage_listing("/* licence\n1\t1;root(no rank)\n").unwrap_err();
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn test_taxid_overflow() {
        let err = parse_lineage_listing("99999999999\t1;root(no rank)\n").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_lineage_listing("").unwrap().is_empty());
        assert!(parse_lineage_listing("/* only a header */\n").unwrap().is_empty());
    }

    #[test]
    fn test_read_gzipped_listing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxid.list.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(WRAPPED.as_bytes()).unwrap();
        enc.finish().unwrap();

        let records = read_lineage_listing(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].terminal().unwrap().scientific_name, "Staphylococcus epidermidis");
    }
}
