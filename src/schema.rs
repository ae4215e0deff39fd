use std::fmt;

use crate::source::Record;

/// Storage type of a single column, fixed for the whole file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int64,
    String,
}

impl ColumnType {
    const INT64_TAG: i64 = 1;
    const STRING_TAG: i64 = 2;

    /// Footer word identifying this type.
    #[must_use]
    pub const fn tag(self) -> i64 {
        match self {
            Self::Int64 => Self::INT64_TAG,
            Self::String => Self::STRING_TAG,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            Self::INT64_TAG => Some(Self::Int64),
            Self::STRING_TAG => Some(Self::String),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int64 => "int64",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered column types of a table file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnType>,
}

impl Schema {
    #[must_use]
    pub const fn new(columns: Vec<ColumnType>) -> Self {
        Self { columns }
    }

    /// Classifies every field of `record` on its literal text.
    ///
    /// The record is not treated as a header: callers encode it as the first
    /// data row afterwards.
    #[must_use]
    pub fn infer(record: &Record) -> Self {
        let columns = record
            .iter()
            .map(|field| {
                if is_integer_literal(field) {
                    ColumnType::Int64
                } else {
                    ColumnType::String
                }
            })
            .collect();
        Self { columns }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<ColumnType> {
        self.columns.get(index).copied()
    }
}

/// Returns true for `[+-]?[0-9]+` text that fits in an `i64`.
///
/// Out-of-range digit runs are classified as strings so that the first row
/// can always be stored under the schema it induces.
#[must_use]
pub fn is_integer_literal(text: &str) -> bool {
    text.parse::<i64>().is_ok()
}
