pub mod api;
pub mod column;
pub mod error;
pub mod footer;
pub mod logger;
pub mod reader;
pub mod schema;
pub mod sinks;
pub mod source;
pub mod value;
pub mod writer;

pub use crate::error::{Error, Result};
pub use api::{
    BatchSummary, FileSummary, decode_path, decode_text, encode_path, encode_text, inspect_path,
    inspect_reader,
};
pub use reader::{BatchView, ReadOptions, RowGroupReader};
pub use schema::{ColumnType, Schema};
pub use sinks::{RowSink, SinkContext, TextSink};
pub use source::{LineSource, Record, RowSource};
pub use writer::{RowGroupWriter, WriteSummary, WriterOptions};
