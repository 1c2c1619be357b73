//! End-to-end generation through definitions, writers and sinks.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use datagen::error::BoxError;
use datagen::prelude::*;
use rand::RngCore;

fn letters() -> Field {
    Field::sequential_value("letter", ["A", "B", "C"]).unwrap()
}

#[test]
fn test_sequential_values_cycle() {
    let sink = MemorySink::new();
    Definition::builder()
        .add_field(letters())
        .unwrap()
        .row_count(5)
        .writer(FlatWriter::csv().with_header(false))
        .sink(sink.clone())
        .generate()
        .unwrap();

    assert_eq!(sink.lines(), vec!["A", "B", "C", "A", "B"]);
}

#[test]
fn test_line_counts_per_writer() {
    let cases: [(Writer, usize); 4] = [
        (Writer::csv(), 11),
        (FlatWriter::csv().with_header(false).into(), 10),
        (Writer::xml_elements(), 13),
        (Writer::xml_attributes(), 13),
    ];

    for (writer, expected) in cases {
        let sink = MemorySink::new();
        let summary = Definition::builder()
            .add_field(letters())
            .unwrap()
            .add_field(Field::uuid("id"))
            .unwrap()
            .row_count(10)
            .writer(writer.clone())
            .sink(sink.clone())
            .generate()
            .unwrap();

        assert_eq!(sink.len(), expected, "{writer:?}");
        assert_eq!(summary.lines, expected as u64);
        assert_eq!(summary.rows, 10);
    }
}

#[test]
fn test_duplicate_field_name() {
    let result = Definition::builder()
        .add_field(letters())
        .unwrap()
        .add_field(Field::random_ipv4("letter"));

    assert!(matches!(result, Err(DataGenError::Configuration(_))));
}

#[test]
fn test_zero_fields_or_rows_fail_build() {
    assert!(
        Definition::builder()
            .sink(MemorySink::new())
            .build()
            .unwrap_err()
            .is_configuration()
    );
    assert!(
        Definition::builder()
            .add_field(letters())
            .unwrap()
            .row_count(0)
            .sink(MemorySink::new())
            .build()
            .unwrap_err()
            .is_configuration()
    );
}

#[test]
fn test_file_sink_with_separator_writes_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("letters.txt");

    Definition::builder()
        .add_field(letters())
        .unwrap()
        .row_count(4)
        .sink(FileSink::with_separator(&path, ";"))
        .generate()
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "letter;A;B;C;A");
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn test_file_sink_line_per_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("letters.csv");

    Definition::builder()
        .add_field(letters())
        .unwrap()
        .row_count(3)
        .sink(FileSink::new(&path))
        .generate()
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "letter\nA\nB\nC\n");
}

#[test]
fn test_parallel_covers_cycle() {
    let sink = MemorySink::new();
    Definition::builder()
        .add_field(letters())
        .unwrap()
        .row_count(300)
        .worker_threads(4)
        .writer(FlatWriter::csv().with_header(false))
        .sink(sink.clone())
        .generate()
        .unwrap();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for line in sink.lines() {
        *counts.entry(line).or_default() += 1;
    }
    assert_eq!(counts.len(), 3);
    assert!(counts.values().all(|&n| n == 100));
}

#[test]
fn test_seeded_runs_repeat() {
    let run = || {
        let sink = MemorySink::new();
        Definition::builder()
            .add_field(Field::random_number("n", 0, 1_000_000).unwrap())
            .unwrap()
            .add_field(Field::uuid("id").with_null_probability(0.5).unwrap())
            .unwrap()
            .row_count(50)
            .seed(7)
            .sink(sink.clone())
            .generate()
            .unwrap();
        sink.lines()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_field_error_propagates() {
    let calls = AtomicUsize::new(0);
    let sink = MemorySink::new();
    let err = Definition::builder()
        .add_field(letters())
        .unwrap()
        .add_field(Field::custom(
            "flaky",
            move |_: &mut dyn RngCore| -> Result<String, BoxError> {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Ok("ok".to_string()),
                    n => Err(format!("call {n} failed").into()),
                }
            },
        ))
        .unwrap()
        .row_count(10)
        .writer(FlatWriter::csv().with_header(false))
        .sink(sink.clone())
        .generate()
        .unwrap_err();

    match err {
        DataGenError::FieldGeneration { field, .. } => assert_eq!(field, "flaky"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(sink.lines(), vec!["A,ok", "B,ok"]);
}

#[test]
fn test_closure_sink() {
    let summary = Definition::builder()
        .add_field(letters())
        .unwrap()
        .row_count(2)
        .consumed_by(|lines| {
            let lines = lines.collect::<Result<Vec<_>>>()?;
            assert_eq!(lines, vec!["letter", "A", "B"]);
            Ok(())
        })
        .generate()
        .unwrap();

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.lines, 3);
}

#[test]
fn test_null_probability_extremes() {
    let sink = MemorySink::new();
    Definition::builder()
        .add_field(Field::uuid("never").with_null_probability(1.0).unwrap())
        .unwrap()
        .add_field(letters().with_null_probability(0.0).unwrap())
        .unwrap()
        .row_count(6)
        .writer(FlatWriter::csv().with_header(false))
        .sink(sink.clone())
        .generate()
        .unwrap();

    assert_eq!(sink.lines(), vec![",A", ",B", ",C", ",A", ",B", ",C"]);
}

#[test]
fn test_error_reported_when_sink_ignores_it() {
    let result = Definition::builder()
        .add_field(Field::custom(
            "broken",
            |_: &mut dyn RngCore| -> Result<String, BoxError> { Err("boom".into()) },
        ))
        .unwrap()
        .row_count(5)
        .consumed_by(|lines| {
            lines.filter_map(|l| l.ok()).for_each(drop);
            Ok(())
        })
        .generate();

    assert!(matches!(
        result,
        Err(DataGenError::FieldGeneration { ref field, .. }) if field == "broken"
    ));
}

#[test]
fn test_panicking_field_in_parallel_run() {
    let sink = MemorySink::new();
    let err = Definition::builder()
        .add_field(Field::custom(
            "explosive",
            |_: &mut dyn RngCore| -> Result<String, BoxError> { panic!("fuse lit") },
        ))
        .unwrap()
        .row_count(20)
        .worker_threads(2)
        .sink(sink.clone())
        .generate()
        .unwrap_err();

    match err {
        DataGenError::FieldGeneration { field, source } => {
            assert_eq!(field, "explosive");
            assert!(source.to_string().contains("fuse lit"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_unchecked_source_fails_generation() {
    let err = Definition::builder()
        .add_field(Field::new("colour", ValueSource::RandomValue { values: vec![] }))
        .unwrap()
        .sink(MemorySink::new())
        .generate()
        .unwrap_err();

    assert!(matches!(err, DataGenError::FieldGeneration { .. }));
}

#[test]
fn test_overlapping_delimiter_and_quote_fail_build() {
    let err = Definition::builder()
        .add_field(letters())
        .unwrap()
        .writer(FlatWriter::csv().delimited_by("\""))
        .sink(MemorySink::new())
        .build()
        .unwrap_err();

    assert!(err.is_configuration());
}
