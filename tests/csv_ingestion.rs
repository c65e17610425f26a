use std::io::Write;
use std::sync::{Arc, Mutex};

use tabular_ingestion::ErrorKind;
use tabular_ingestion::ingestion::csv::{CsvOptions, parse_csv_from_path, parse_csv_from_reader, parse_csv_from_str};
use tabular_ingestion::ingestion::{CancellationToken, ParseControl, ParseStrategy};
use tabular_ingestion::types::Value;

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Deterministic CSV with `rows` data rows and a mix of numbers, text and blanks.
fn generated_csv(rows: usize) -> String {
    let mut out = String::from("id,name,amount,note\n");
    for i in 0..rows {
        let note = if i % 7 == 0 { "" } else { "ok" };
        out.push_str(&format!("{i},user {i},{}.25,{note}\n", i * 3));
    }
    out
}

fn small_chunks() -> CsvOptions {
    CsvOptions {
        chunk_size: 256,
        high_water_mark: 4,
        ..Default::default()
    }
}

fn recording_control() -> (ParseControl, Arc<Mutex<Vec<f64>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let control = ParseControl::new().with_progress(Arc::new(move |p| sink.lock().unwrap().push(p)));
    (control, seen)
}

#[test]
fn parse_csv_from_path_happy_path() {
    let t = parse_csv_from_path(
        "tests/fixtures/sales.csv",
        ParseStrategy::WholeFile,
        &CsvOptions::default(),
        &ParseControl::new(),
    )
    .unwrap();

    assert_eq!(t.headers(), ["date", "region", "revenue", "units"]);
    assert_eq!(t.row_count(), 5);
    assert_eq!(
        t.rows()[0],
        vec![text("2024-01"), text("north"), Value::Number(1200.5), Value::Number(12.0)]
    );
    // empty cell
    assert_eq!(t.get(3, "revenue"), Some(&Value::Null));
}

#[test]
fn semicolon_files_are_detected() {
    let t = parse_csv_from_str("a;b;c\n1;2;3\n").unwrap();
    assert_eq!(t.headers(), ["a", "b", "c"]);
    assert_eq!(
        t.rows()[0],
        vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]
    );
}

#[test]
fn tab_and_pipe_files_are_detected() {
    let tabs = parse_csv_from_str("x\ty\n1\t2\n").unwrap();
    assert_eq!(tabs.headers(), ["x", "y"]);
    let pipes = parse_csv_from_str("x|y\n1|2\n").unwrap();
    assert_eq!(pipes.rows()[0], vec![Value::Number(1.0), Value::Number(2.0)]);
}

#[test]
fn forced_delimiter_skips_sniffing() {
    let input = "a,b;c\n1,2;3\n";
    let opts = CsvOptions {
        delimiter: Some(b';'),
        ..Default::default()
    };
    let t = parse_csv_from_reader(
        input.as_bytes(),
        input.len() as u64,
        ParseStrategy::WholeFile,
        &opts,
        &ParseControl::new(),
    )
    .unwrap();
    assert_eq!(t.headers(), ["a,b", "c"]);
    assert_eq!(t.rows()[0], vec![text("1,2"), Value::Number(3.0)]);
}

#[test]
fn short_and_long_rows_are_normalized_to_header_width() {
    let t = parse_csv_from_str("a,b,c\n1\n1,2,3,4,5\n").unwrap();
    assert_eq!(t.rows()[0], vec![Value::Number(1.0), Value::Null, Value::Null]);
    assert_eq!(
        t.rows()[1],
        vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]
    );
    assert!(t.rows().iter().all(|r| r.len() == t.headers().len()));
}

#[test]
fn quoted_fields_keep_delimiters_and_newlines() {
    let t = parse_csv_from_str("name,comment\n\"Doe, J\",\"line one\nline two\"\n").unwrap();
    assert_eq!(t.row_count(), 1);
    assert_eq!(t.rows()[0][0], text("Doe, J"));
    assert_eq!(t.rows()[0][1], text("line one\nline two"));
}

#[test]
fn non_numeric_looking_values_stay_text() {
    let t = parse_csv_from_str("v\nNaN\n1e3\n007\n 12 \n$5\n").unwrap();
    let col: Vec<_> = t.column_values(0).cloned().collect();
    assert_eq!(
        col,
        vec![
            text("NaN"),
            Value::Number(1000.0),
            Value::Number(7.0),
            Value::Number(12.0),
            text("$5"),
        ]
    );
}

#[test]
fn row_count_matches_data_lines_and_preview_is_bounded() {
    let input = generated_csv(37);
    let t = parse_csv_from_str(&input).unwrap();
    assert_eq!(t.row_count(), 37);
    assert_eq!(t.preview().len(), 10);
    assert_eq!(t.preview(), &t.rows()[..10]);
}

#[test]
fn streaming_matches_whole_file_parse() {
    let input = generated_csv(500);
    let whole = parse_csv_from_str(&input).unwrap();

    let streamed = parse_csv_from_reader(
        input.as_bytes(),
        input.len() as u64,
        ParseStrategy::Streaming,
        &small_chunks(),
        &ParseControl::new(),
    )
    .unwrap();

    assert_eq!(streamed, whole);
    assert_eq!(streamed.row_count(), 500);
}

#[test]
fn streaming_progress_is_monotonic_and_ends_at_one() {
    let input = generated_csv(400);
    let (control, seen) = recording_control();

    parse_csv_from_reader(
        input.as_bytes(),
        input.len() as u64,
        ParseStrategy::Streaming,
        &small_chunks(),
        &control,
    )
    .unwrap();

    let seen = seen.lock().unwrap().clone();
    assert!(seen.len() > 2, "expected several progress reports, got {seen:?}");
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert!(seen.iter().all(|p| (0.0..=1.0).contains(p)));
    assert_eq!(seen.last().copied(), Some(1.0));
}

#[test]
fn whole_file_progress_ends_at_one() {
    let (control, seen) = recording_control();
    let input = "a\n1\n";
    parse_csv_from_reader(input.as_bytes(), 0, ParseStrategy::WholeFile, &CsvOptions::default(), &control)
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![1.0]);
}

#[test]
fn cancelled_parse_returns_no_table() {
    let input = generated_csv(1_000);
    let token = CancellationToken::new();
    let control = ParseControl::new().with_cancellation(token.clone());
    token.cancel();

    for strategy in [ParseStrategy::WholeFile, ParseStrategy::Streaming] {
        let err = parse_csv_from_reader(
            input.as_bytes(),
            input.len() as u64,
            strategy,
            &small_chunks(),
            &control,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}

#[test]
fn cancelling_mid_stream_stops_the_producer() {
    let input = generated_csv(5_000);
    let token = CancellationToken::new();
    let trigger = token.clone();
    let control = ParseControl::new()
        .with_cancellation(token)
        .with_progress(Arc::new(move |p| {
            if p > 0.2 {
                trigger.cancel();
            }
        }));

    let err = parse_csv_from_reader(
        input.as_bytes(),
        input.len() as u64,
        ParseStrategy::Streaming,
        &small_chunks(),
        &control,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[test]
fn parse_from_path_reads_temp_file() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(generated_csv(20).as_bytes()).unwrap();
    file.flush().unwrap();

    let t = parse_csv_from_path(file.path(), ParseStrategy::Streaming, &small_chunks(), &ParseControl::new())
        .unwrap();
    assert_eq!(t.row_count(), 20);
    assert_eq!(t.get(0, "note"), Some(&Value::Null));
    assert_eq!(t.get(1, "note"), Some(&text("ok")));
}

#[test]
fn missing_file_is_a_read_error() {
    let err = parse_csv_from_path(
        "tests/fixtures/does_not_exist.csv",
        ParseStrategy::WholeFile,
        &CsvOptions::default(),
        &ParseControl::new(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileRead);
}
