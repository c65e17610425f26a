//! Raw text access for header-row preview.
//!
//! Reads a file as text without interpreting its structure, so a human can look at the first
//! physical rows and pick the header row. Encoding detection is best effort and never fails.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chardetng::EncodingDetector;

use crate::error::IngestionResult;
use crate::types::RawTable;

use super::csv::is_blank;
use super::header::recommend_start_row;

/// Decoded text of a file (or of its first bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
    /// Decoded content, without a byte-order mark.
    pub content: String,
    /// Name of the encoding the bytes were decoded from (e.g. `"UTF-8"`, `"windows-1252"`).
    pub encoding: &'static str,
    /// Whether `content` is only a prefix of the file.
    pub truncated: bool,
}

impl RawText {
    /// Physical lines. `\r\n`, `\n` and a lone `\r` all end a line, as they do for the CSV
    /// tokenizer.
    ///
    /// Quotes are not honoured: a quoted CSV field spanning several lines counts as several
    /// lines here but as one record in the parsed table.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content
            .split('\n')
            .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
    }

    /// Extrapolate the number of lines in a file of `byte_size` bytes from this prefix.
    ///
    /// Exact when the content is not truncated.
    pub fn estimated_total_rows(&self, byte_size: u64) -> usize {
        let lines = self.lines().filter(|l| !l.is_empty()).count();
        if !self.truncated || self.content.is_empty() || lines == 0 {
            return lines;
        }
        let bytes_per_line = self.content.len() as f64 / lines as f64;
        (byte_size as f64 / bytes_per_line).floor() as usize
    }
}

/// Read a file as text, optionally only its first `max_bytes` bytes.
pub fn read_raw_from_path(path: impl AsRef<Path>, max_bytes: Option<usize>) -> IngestionResult<RawText> {
    let file = File::open(path)?;
    let mut bytes = Vec::new();
    let truncated = match max_bytes {
        Some(limit) => {
            file.take(limit as u64 + 1).read_to_end(&mut bytes)?;
            bytes.len() > limit
        }
        None => {
            let mut file = file;
            file.read_to_end(&mut bytes)?;
            false
        }
    };
    if truncated {
        if let Some(limit) = max_bytes {
            bytes.truncate(limit);
        }
    }
    Ok(decode(&bytes, truncated))
}

/// Decode in-memory bytes, optionally only the first `max_bytes` of them.
pub fn read_raw_from_bytes(bytes: &[u8], max_bytes: Option<usize>) -> RawText {
    match max_bytes {
        Some(limit) if bytes.len() > limit => decode(&bytes[..limit], true),
        _ => decode(bytes, false),
    }
}

fn decode(bytes: &[u8], truncated: bool) -> RawText {
    let (encoding, body): (&'static encoding_rs::Encoding, &[u8]) =
        match encoding_rs::Encoding::for_bom(bytes) {
            Some((enc, bom_len)) => (enc, &bytes[bom_len..]),
            None => (guess_encoding(bytes, truncated), bytes),
        };

    let content = if encoding == encoding_rs::UTF_8 {
        let valid = utf8_prefix(body, truncated);
        String::from_utf8_lossy(valid).into_owned()
    } else {
        let (decoded, _had_errors) = encoding.decode_without_bom_handling(body);
        decoded.into_owned()
    };

    RawText {
        content,
        encoding: encoding.name(),
        truncated,
    }
}

fn guess_encoding(bytes: &[u8], truncated: bool) -> &'static encoding_rs::Encoding {
    if std::str::from_utf8(utf8_prefix(bytes, truncated)).is_ok() {
        return encoding_rs::UTF_8;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, !truncated);
    detector.guess(None, true)
}

/// For a truncated buffer, drop a multi-byte character cut off at the end.
fn utf8_prefix(bytes: &[u8], truncated: bool) -> &[u8] {
    if !truncated {
        return bytes;
    }
    match std::str::from_utf8(bytes) {
        Ok(_) => bytes,
        Err(e) if e.error_len().is_none() => &bytes[..e.valid_up_to()],
        Err(_) => bytes,
    }
}

impl RawTable {
    /// Split raw text into at most `max_rows` rows of trimmed cells.
    ///
    /// Blank rows (every cell empty or whitespace) are dropped with the same rule the CSV
    /// parser uses, so row `i` here is physical row `i` of the parsed table as long as no quoted
    /// field spans lines. Cells are split on `delimiter` without honouring quotes; this grid is
    /// for eyeballing only.
    pub fn from_text(text: &RawText, delimiter: u8, max_rows: usize) -> Self {
        let delimiter = delimiter as char;
        let rows = text
            .lines()
            .filter(|line| !is_blank(line.split(delimiter).map(str::as_bytes)))
            .take(max_rows)
            .map(|line| line.split(delimiter).map(|c| c.trim().to_string()).collect())
            .collect();
        Self::new(rows)
    }

    /// Advisory data start row; see [`recommend_start_row`].
    pub fn recommend_start_row(&self) -> usize {
        recommend_start_row(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_text_is_kept_and_bom_removed() {
        let raw = read_raw_from_bytes("\u{feff}a,b\r\n1,2\n".as_bytes(), None);
        assert_eq!(raw.encoding, "UTF-8");
        assert_eq!(raw.content, "a,b\r\n1,2\n");
        assert_eq!(raw.lines().collect::<Vec<_>>(), vec!["a,b", "1,2", ""]);
    }

    #[test]
    fn legacy_single_byte_text_is_transcoded() {
        // "café;prix\n" in windows-1252
        let bytes: &[u8] = b"caf\xe9;prix\n";
        let raw = read_raw_from_bytes(bytes, None);
        assert_ne!(raw.encoding, "UTF-8");
        assert!(raw.content.starts_with("caf"));
        assert!(raw.content.contains("prix"));
    }

    #[test]
    fn utf16_bom_is_decoded() {
        let bytes: &[u8] = &[0xFF, 0xFE, b'H', 0x00, b'i', 0x00];
        let raw = read_raw_from_bytes(bytes, None);
        assert_eq!(raw.encoding, "UTF-16LE");
        assert_eq!(raw.content, "Hi");
    }

    #[test]
    fn truncation_never_splits_a_character() {
        let text = "ab\u{e9}";
        let raw = read_raw_from_bytes(text.as_bytes(), Some(3));
        assert!(raw.truncated);
        assert_eq!(raw.encoding, "UTF-8");
        assert_eq!(raw.content, "ab");
    }

    #[test]
    fn raw_table_splits_and_skips_blank_lines() {
        let raw = read_raw_from_bytes(b"Report 2024\n\nregion, sales\nnorth, 10\n", None);
        let table = RawTable::from_text(&raw, b',', 10);
        assert_eq!(
            table.rows,
            vec![
                vec!["Report 2024".to_string()],
                vec!["region".to_string(), "sales".to_string()],
                vec!["north".to_string(), "10".to_string()],
            ]
        );
        assert_eq!(table.recommend_start_row(), 2);
    }

    #[test]
    fn delimiter_only_lines_are_blank() {
        let raw = read_raw_from_bytes(b";;\n \t; \nmonth;units\njan;3\n", None);
        let table = RawTable::from_text(&raw, b';', 10);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], ["month", "units"]);
    }

    #[test]
    fn carriage_returns_end_lines() {
        let raw = read_raw_from_bytes(b"a,b\r1,2\r\n3,4\r", None);
        assert_eq!(raw.lines().collect::<Vec<_>>(), vec!["a,b", "1,2", "3,4"]);
    }

    #[test]
    fn total_rows_extrapolate_from_prefix() {
        let raw = RawText {
            content: "a,b\n1,2\n".to_string(),
            encoding: "UTF-8",
            truncated: true,
        };
        assert_eq!(raw.estimated_total_rows(40), 10);
        let whole = RawText { truncated: false, ..raw };
        assert_eq!(whole.estimated_total_rows(40), 2);
    }
}
