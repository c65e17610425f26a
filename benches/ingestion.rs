use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tabular_ingestion::inference::infer_column_types;
use tabular_ingestion::ingestion::csv::{CsvOptions, parse_csv_from_reader};
use tabular_ingestion::ingestion::{ParseControl, ParseStrategy};

fn sales_csv(rows: usize) -> String {
    let mut out = String::from("date,region,revenue,units,note\n");
    for i in 0..rows {
        out.push_str(&format!(
            "2024-{:02}-{:02},region {},{}.{:02},{},{}\n",
            i % 12 + 1,
            i % 28 + 1,
            i % 9,
            i * 7 % 5000,
            i % 100,
            i % 40,
            if i % 5 == 0 { "" } else { "ok" }
        ));
    }
    out
}

fn bench_csv_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_parse");
    for rows in [10_000usize, 100_000] {
        let input = sales_csv(rows);
        group.throughput(Throughput::Bytes(input.len() as u64));

        for strategy in [ParseStrategy::WholeFile, ParseStrategy::Streaming] {
            group.bench_with_input(
                BenchmarkId::new(format!("{strategy:?}"), rows),
                &input,
                |b, input| {
                    b.iter(|| {
                        parse_csv_from_reader(
                            black_box(input.as_bytes()),
                            input.len() as u64,
                            strategy,
                            &CsvOptions::default(),
                            &ParseControl::new(),
                        )
                        .unwrap()
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_inference(c: &mut Criterion) {
    let input = sales_csv(50_000);
    let table = parse_csv_from_reader(
        input.as_bytes(),
        input.len() as u64,
        ParseStrategy::WholeFile,
        &CsvOptions::default(),
        &ParseControl::new(),
    )
    .unwrap();

    c.bench_function("infer_column_types/50000", |b| {
        b.iter(|| infer_column_types(black_box(&table)))
    });
}

criterion_group!(benches, bench_csv_strategies, bench_inference);
criterion_main!(benches);
