use std::borrow::Cow;
use std::fmt;
use std::io;

use crate::schema::ColumnType;

/// Result type used across the row-group reader and writer.
pub type Result<T> = std::result::Result<T, Error>;

/// High-level error type surfaced by encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure while reading from or writing to the underlying stream.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A source row does not fit the schema inferred from the first row.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The table file is truncated or internally inconsistent.
    #[error("corrupted table file while processing {section}: {details}")]
    Corrupted {
        section: Section,
        details: Cow<'static, str>,
    },

    /// The API was driven in a way it does not support.
    #[error("invalid input: {details}")]
    InvalidInput { details: Cow<'static, str> },
}

/// Rows that cannot be stored under the file-wide schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("row {row}, column {column}: cannot store {value:?} as {expected}")]
    TypeMismatch {
        row: u64,
        column: usize,
        expected: ColumnType,
        value: String,
    },

    #[error("row {row} has {found} fields but the schema has {expected} columns")]
    FieldCount {
        row: u64,
        expected: usize,
        found: usize,
    },
}

/// Failure decoding one column's byte run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("column data length {len} is not a multiple of 8")]
    Misaligned { len: usize },

    #[error("length prefix at byte {offset} is truncated")]
    TruncatedPrefix { offset: usize },

    #[error("length prefix {declared} at byte {offset} runs past the column data")]
    Overrun { offset: usize, declared: i64 },

    #[error("string at byte {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
}

/// Logical region of a table file used for diagnostic reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Footer,
    Batch { index: usize },
    Column { batch: usize, index: usize },
}

impl Error {
    pub(crate) fn corrupted(section: Section, details: impl Into<Cow<'static, str>>) -> Self {
        Self::Corrupted {
            section,
            details: details.into(),
        }
    }

    pub(crate) fn invalid_input(details: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidInput {
            details: details.into(),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Footer => write!(f, "file footer"),
            Self::Batch { index } => write!(f, "batch {index}"),
            Self::Column { batch, index } => write!(f, "column {index} of batch {batch}"),
        }
    }
}
