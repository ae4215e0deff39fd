#![allow(clippy::pedantic)]
use std::io::Cursor;

use insta::assert_snapshot;
use rowgroup::inspect_reader;
use serde_json::json;

mod common;
use common::encode;

#[test]
fn summary_lists_schema_and_batches() {
    let bytes = encode("John,25,NYC\nJane,30,LA", 1 << 20);
    let summary = inspect_reader(Cursor::new(&bytes)).unwrap();
    assert_snapshot!(summary.to_string(), @r"
    Rows: 2  Columns: 3  Batches: 1  Bytes: 157
    Schema: string, int64, string
    [  0] offset=0          bytes=61         rows=2
    ");
}

#[test]
fn summary_serializes_to_json() {
    let bytes = encode("a,1\nbb,2", 0);
    let summary = inspect_reader(Cursor::new(&bytes)).unwrap();
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(
        value,
        json!({
            "columns": ["string", "int64"],
            "total_rows": 2,
            "data_bytes": 35,
            "file_bytes": 155,
            "batches": [
                {"index": 0, "offset": 0, "byte_size": 17, "row_count": 1, "column_sizes": [9, 8]},
                {"index": 1, "offset": 17, "byte_size": 18, "row_count": 1, "column_sizes": [10, 8]}
            ]
        })
    );
}
