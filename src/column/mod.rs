//! Per-column value containers and their byte codecs.
//!
//! A batch stores each column as one contiguous byte run. `Int64` cells are
//! fixed 8-byte little-endian words; `String` cells are an 8-byte
//! little-endian byte length followed by the raw UTF-8 bytes. Nothing
//! separates cells and nothing pads the run.

mod int64;
mod string;
#[cfg(test)]
mod tests;

use std::borrow::Cow;
use std::io::{self, Write};
use std::num::ParseIntError;

use crate::error::DecodeError;
use crate::schema::ColumnType;
use crate::value::Value;

pub use int64::Int64Column;
pub use string::StringColumn;

/// Width of every fixed-size word in the table format.
pub const WORD_SIZE: usize = 8;

/// Column of one batch; the variant is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Int64(Int64Column),
    String(StringColumn),
}

impl Column {
    #[must_use]
    pub fn new(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Int64 => Self::Int64(Int64Column::default()),
            ColumnType::String => Self::String(StringColumn::default()),
        }
    }

    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        match self {
            Self::Int64(_) => ColumnType::Int64,
            Self::String(_) => ColumnType::String,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int64(column) => column.len(),
            Self::String(column) => column.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses `cell` into the column's native type and appends it.
    ///
    /// # Errors
    ///
    /// Returns the integer parse failure for `Int64` columns; `String`
    /// columns accept any text.
    pub fn append_text(&mut self, cell: &str) -> Result<(), ParseIntError> {
        match self {
            Self::Int64(column) => column.append_text(cell),
            Self::String(column) => {
                column.push(cell);
                Ok(())
            }
        }
    }

    /// Encoded footprint of the most recently appended cell.
    #[must_use]
    pub fn encoded_size_of_last(&self) -> u64 {
        match self {
            Self::Int64(column) => column.encoded_size_of_last(),
            Self::String(column) => column.encoded_size_of_last(),
        }
    }

    /// Encoded footprint of every held cell.
    #[must_use]
    pub fn encoded_size(&self) -> u64 {
        match self {
            Self::Int64(column) => column.encoded_size(),
            Self::String(column) => column.encoded_size(),
        }
    }

    /// Writes every held cell in row order.
    ///
    /// # Errors
    ///
    /// Returns any error raised by `writer`.
    pub fn serialize_into<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Self::Int64(column) => column.serialize_into(writer),
            Self::String(column) => column.serialize_into(writer),
        }
    }

    /// Replaces the held cells with the ones decoded from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a well-formed run for this variant.
    /// The column is left empty in that case.
    pub fn deserialize_from(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let result = match self {
            Self::Int64(column) => column.deserialize_from(bytes),
            Self::String(column) => column.deserialize_from(bytes),
        };
        if result.is_err() {
            self.clear();
        }
        result
    }

    #[must_use]
    pub fn value(&self, index: usize) -> Option<Value<'_>> {
        match self {
            Self::Int64(column) => column.get(index).map(Value::Int64),
            Self::String(column) => column.get(index).map(|s| Value::Str(Cow::Borrowed(s))),
        }
    }

    /// Canonical text of cell `index`.
    #[must_use]
    pub fn cell_text(&self, index: usize) -> Option<Cow<'_, str>> {
        match self {
            Self::Int64(column) => column
                .get(index)
                .map(|v| Cow::Owned(itoa::Buffer::new().format(v).to_owned())),
            Self::String(column) => column.get(index).map(Cow::Borrowed),
        }
    }

    /// Drops every cell while keeping the allocated storage.
    pub fn clear(&mut self) {
        match self {
            Self::Int64(column) => column.clear(),
            Self::String(column) => column.clear(),
        }
    }
}
