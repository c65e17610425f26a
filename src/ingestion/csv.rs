//! CSV ingestion implementation.
//!
//! Delimited text is tokenized with the `csv` crate after sniffing the delimiter from a prefix
//! of the input. Blank rows (every cell empty or whitespace, e.g. `;;`) are skipped wherever
//! they appear, with the same rule [`crate::types::RawTable::from_text`] applies. The first
//! remaining row supplies the headers; every later row is dynamically typed cell by cell
//! ([`type_cell`]) and handed to the canonical assembler.
//!
//! Two strategies are available (see [`ParseStrategy`]):
//!
//! - `WholeFile`: the tokenizer runs on the calling thread.
//! - `Streaming`: the tokenizer runs on a scoped producer thread and feeds rows through a
//!   bounded channel whose capacity is [`CsvOptions::high_water_mark`]. When the consumer
//!   falls behind, the producer blocks instead of buffering more rows.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::mpsc::{self, TrySendError};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{IngestionError, IngestionResult};
use crate::inference::parse_strict_number;
use crate::types::{ParsedTable, Record, Value, placeholder_header};

use super::assemble::assemble;
use super::control::{ParseControl, ProgressTracker};
use super::format::{LARGE_FILE_THRESHOLD, ParseStrategy};

/// Default number of input bytes between progress reports.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Default capacity, in rows, of the streaming channel.
pub const DEFAULT_HIGH_WATER_MARK: usize = 50_000;

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
pub const DELIMITER_CANDIDATES: [u8; 4] = [b',', b'\t', b'|', b';'];

const SNIFF_BYTES: usize = 64 * 1024;
const SNIFF_ROWS: usize = 10;

/// Tuning knobs for CSV parsing.
///
/// Deserializable so hosts can keep them in a JSON config; missing keys take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CsvOptions {
    /// Input bytes consumed between progress reports; also the tokenizer buffer size.
    pub chunk_size: usize,
    /// Maximum number of rows buffered between producer and consumer when streaming.
    pub high_water_mark: usize,
    /// Files at or above this many bytes are streamed.
    pub large_file_threshold: u64,
    /// Force a delimiter instead of sniffing one.
    pub delimiter: Option<u8>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            large_file_threshold: LARGE_FILE_THRESHOLD,
            delimiter: None,
        }
    }
}

/// Parse a CSV file, streaming it when `strategy` says so.
pub fn parse_csv_from_path(
    path: impl AsRef<Path>,
    strategy: ParseStrategy,
    options: &CsvOptions,
    control: &ParseControl,
) -> IngestionResult<ParsedTable> {
    let file = File::open(path)?;
    let total_bytes = file.metadata()?.len();
    parse_csv_from_reader(file, total_bytes, strategy, options, control)
}

/// Parse in-memory CSV text with default options on the calling thread.
pub fn parse_csv_from_str(input: &str) -> IngestionResult<ParsedTable> {
    parse_csv_from_reader(
        input.as_bytes(),
        input.len() as u64,
        ParseStrategy::WholeFile,
        &CsvOptions::default(),
        &ParseControl::new(),
    )
}

/// Parse CSV from any reader.
///
/// `total_bytes` is the expected input length, used only for progress fractions; pass `0` if
/// unknown (progress then jumps straight to `1.0` at the end).
pub fn parse_csv_from_reader<R: Read + Send>(
    mut reader: R,
    total_bytes: u64,
    strategy: ParseStrategy,
    options: &CsvOptions,
    control: &ParseControl,
) -> IngestionResult<ParsedTable> {
    let mut prefix = Vec::with_capacity(SNIFF_BYTES);
    reader
        .by_ref()
        .take(SNIFF_BYTES as u64)
        .read_to_end(&mut prefix)?;

    let delimiter = match options.delimiter {
        Some(d) => d,
        None => detect_delimiter(sniff_window(&prefix)),
    };
    debug!(delimiter = %(delimiter as char).escape_default(), ?strategy, total_bytes, "parsing csv");

    let input = Cursor::new(prefix).chain(reader);
    let table = match strategy {
        ParseStrategy::WholeFile => parse_on_caller(input, total_bytes, delimiter, options, control),
        ParseStrategy::Streaming => parse_streaming(input, total_bytes, delimiter, options, control),
    }?;
    debug!(rows = table.row_count(), columns = table.headers().len(), "csv parsed");
    Ok(table)
}

/// Choose the delimiter among [`DELIMITER_CANDIDATES`] that splits the sample most uniformly.
///
/// For each candidate the first rows of `sample` are tokenized; candidates averaging fewer than
/// two fields per row are discarded. The winner has the smallest sum of field-count changes
/// between consecutive rows, then the most fields, then the earliest position in the candidate
/// list. Falls back to comma.
pub fn detect_delimiter(sample: &[u8]) -> u8 {
    let mut best: Option<(u8, usize, f64)> = None;
    for &candidate in &DELIMITER_CANDIDATES {
        let Some((delta, mean)) = field_count_profile(sample, candidate) else {
            continue;
        };
        if mean <= 1.99 {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, best_delta, best_mean)) => {
                delta < best_delta || (delta == best_delta && mean > best_mean)
            }
        };
        if better {
            best = Some((candidate, delta, mean));
        }
    }
    best.map_or(b',', |(d, _, _)| d)
}

fn field_count_profile(sample: &[u8], delimiter: u8) -> Option<(usize, f64)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(sample);

    let mut counts = Vec::with_capacity(SNIFF_ROWS);
    let mut record = csv::ByteRecord::new();
    while counts.len() < SNIFF_ROWS {
        match rdr.read_byte_record(&mut record) {
            Ok(true) if is_blank(record.iter()) => continue,
            Ok(true) => counts.push(record.len()),
            Ok(false) | Err(_) => break,
        }
    }
    if counts.is_empty() {
        return None;
    }

    let delta = counts.windows(2).map(|w| w[0].abs_diff(w[1])).sum();
    let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    Some((delta, mean))
}

/// Restrict a possibly truncated prefix to whole lines.
fn sniff_window(prefix: &[u8]) -> &[u8] {
    if prefix.len() < SNIFF_BYTES {
        return prefix;
    }
    match prefix.iter().rposition(|&b| b == b'\n') {
        Some(end) => &prefix[..end],
        None => prefix,
    }
}

/// Dynamically type one raw CSV cell.
///
/// Empty cells become [`Value::Null`]; unambiguous decimal numbers (optional sign, fraction and
/// exponent, surrounding whitespace allowed) become [`Value::Number`]; everything else is kept
/// verbatim as [`Value::Text`]. `Infinity`, `NaN`, hex literals and thousands separators stay
/// text.
pub fn type_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match parse_strict_number(raw) {
        Some(n) => Value::Number(n),
        None => Value::Text(raw.to_string()),
    }
}

/// A row is blank when every cell is empty after trimming ASCII whitespace.
pub(crate) fn is_blank<'a>(mut cells: impl Iterator<Item = &'a [u8]>) -> bool {
    cells.all(|c| c.trim_ascii().is_empty())
}

enum Message {
    Headers(Vec<String>),
    Row(Record),
    Progress(u64),
}

fn header_cells(record: &csv::StringRecord) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let cell = if idx == 0 {
                cell.trim_start_matches('\u{feff}')
            } else {
                cell
            };
            let cell = cell.trim();
            if cell.is_empty() {
                placeholder_header(idx)
            } else {
                cell.to_string()
            }
        })
        .collect()
}

/// Drive the tokenizer, passing every message to `emit`.
///
/// `emit` returns `false` when the receiving side has gone away, which ends the parse as
/// cancelled.
fn tokenize<R: Read>(
    input: R,
    delimiter: u8,
    options: &CsvOptions,
    control: &ParseControl,
    mut emit: impl FnMut(Message) -> bool,
) -> IngestionResult<()> {
    let chunk_size = options.chunk_size.max(1) as u64;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .buffer_capacity(options.chunk_size.max(1))
        .from_reader(input);

    let mut record = csv::StringRecord::new();
    let mut headers_seen = false;
    let mut next_report = chunk_size;

    while rdr.read_record(&mut record)? {
        control.check_cancelled()?;
        if is_blank(record.iter().map(str::as_bytes)) {
            continue;
        }

        let message = if headers_seen {
            Message::Row(record.iter().map(type_cell).collect())
        } else {
            headers_seen = true;
            Message::Headers(header_cells(&record))
        };
        if !emit(message) {
            return Err(IngestionError::Cancelled);
        }

        let consumed = rdr.position().byte();
        if consumed >= next_report {
            next_report = (consumed / chunk_size + 1) * chunk_size;
            if !emit(Message::Progress(consumed)) {
                return Err(IngestionError::Cancelled);
            }
        }
    }
    Ok(())
}

struct Accumulator<'a> {
    headers: Option<Vec<String>>,
    rows: Vec<Record>,
    progress: ProgressTracker<'a>,
    total_bytes: u64,
}

impl<'a> Accumulator<'a> {
    fn new(progress: ProgressTracker<'a>, total_bytes: u64) -> Self {
        Self {
            headers: None,
            rows: Vec::new(),
            progress,
            total_bytes,
        }
    }

    fn accept(&mut self, message: Message) {
        match message {
            Message::Headers(headers) => self.headers = Some(headers),
            Message::Row(row) => self.rows.push(row),
            Message::Progress(consumed) => self.progress.report_bytes(consumed, self.total_bytes),
        }
    }

    fn finish(mut self) -> ParsedTable {
        self.progress.finish();
        assemble(self.headers.unwrap_or_default(), self.rows)
    }
}

fn parse_on_caller<R: Read>(
    input: R,
    total_bytes: u64,
    delimiter: u8,
    options: &CsvOptions,
    control: &ParseControl,
) -> IngestionResult<ParsedTable> {
    let mut acc = Accumulator::new(control.tracker(), total_bytes);
    tokenize(input, delimiter, options, control, |message| {
        acc.accept(message);
        true
    })?;
    Ok(acc.finish())
}

fn parse_streaming<R: Read + Send>(
    input: R,
    total_bytes: u64,
    delimiter: u8,
    options: &CsvOptions,
    control: &ParseControl,
) -> IngestionResult<ParsedTable> {
    let (tx, rx) = mpsc::sync_channel::<Message>(options.high_water_mark.max(1));

    thread::scope(|scope| {
        let producer = scope.spawn(move || {
            let mut stalls = 0usize;
            let result = tokenize(input, delimiter, options, control, |message| {
                match tx.try_send(message) {
                    Ok(()) => true,
                    Err(TrySendError::Full(message)) => {
                        stalls += 1;
                        trace!("csv row buffer at high-water mark, producer waiting");
                        tx.send(message).is_ok()
                    }
                    Err(TrySendError::Disconnected(_)) => false,
                }
            });
            if stalls > 0 {
                debug!(stalls, "csv producer was throttled by backpressure");
            }
            result
        });

        let mut acc = Accumulator::new(control.tracker(), total_bytes);
        for message in &rx {
            if control.is_cancelled() {
                break;
            }
            acc.accept(message);
        }
        // Unblocks a producer parked on a full channel.
        drop(rx);

        producer
            .join()
            .map_err(|_| IngestionError::parse("csv producer thread panicked"))??;
        control.check_cancelled()?;
        Ok(acc.finish())
    })
}
