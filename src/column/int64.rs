use std::io::{self, Write};
use std::num::ParseIntError;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::WORD_SIZE;
use crate::error::DecodeError;

const CELL_SIZE: u64 = WORD_SIZE as u64;

/// Fixed-width signed integer cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Int64Column {
    values: Vec<i64>,
}

impl Int64Column {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<i64> {
        self.values.get(index).copied()
    }

    /// Accepts `[+-]?[0-9]+` within `i64` range.
    pub(super) fn append_text(&mut self, cell: &str) -> Result<(), ParseIntError> {
        self.values.push(cell.parse()?);
        Ok(())
    }

    pub(super) fn encoded_size_of_last(&self) -> u64 {
        if self.values.is_empty() { 0 } else { CELL_SIZE }
    }

    pub(super) fn encoded_size(&self) -> u64 {
        self.values.len() as u64 * CELL_SIZE
    }

    pub(super) fn serialize_into<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        for &value in &self.values {
            writer.write_i64::<LittleEndian>(value)?;
        }
        Ok(())
    }

    pub(super) fn deserialize_from(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        if bytes.len() % WORD_SIZE != 0 {
            return Err(DecodeError::Misaligned { len: bytes.len() });
        }
        self.values.clear();
        self.values.resize(bytes.len() / WORD_SIZE, 0);
        LittleEndian::read_i64_into(bytes, &mut self.values);
        Ok(())
    }

    pub(super) fn clear(&mut self) {
        self.values.clear();
    }
}
