#![allow(dead_code)]

use rowgroup::{ReadOptions, WriterOptions, decode_text, encode_text};

/// Thresholds every round-trip is checked against: one row per batch, a
/// handful of rows per batch, and the default.
pub const THRESHOLDS: &[u64] = &[0, 24, 64, rowgroup::writer::DEFAULT_ROW_GROUP_BYTES];

pub fn encode(text: &str, row_group_bytes: u64) -> Vec<u8> {
    let options = WriterOptions::new().with_row_group_bytes(row_group_bytes);
    encode_text(text, &options).expect("encode text")
}

pub fn decode(bytes: &[u8]) -> String {
    decode_text(bytes, &ReadOptions::new()).expect("decode table")
}

/// Text the decoder reproduces for `input`: a single trailing terminator is
/// not preserved.
pub fn canonical(input: &str) -> &str {
    input.strip_suffix('\n').unwrap_or(input)
}

/// Parses naive delimited text with the `csv` crate so decoded output can be
/// compared record by record.
pub fn csv_records(text: &str) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());
    reader
        .records()
        .map(|record| {
            record
                .expect("csv record")
                .iter()
                .map(str::to_owned)
                .collect()
        })
        .collect()
}

/// Builds `rows` lines of `name,index,city` text without a trailing newline.
pub fn generated_people(rows: usize) -> String {
    const CITIES: &[&str] = &["NYC", "LA", "Oslo", "Reykjavík", ""];
    (0..rows)
        .map(|idx| {
            let city = CITIES[idx % CITIES.len()];
            let id = idx as i64 * 37 - 500;
            format!("person-{idx},{id},{city}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
