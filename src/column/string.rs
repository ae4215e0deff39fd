use std::io::{self, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::WORD_SIZE;
use crate::error::DecodeError;

const PREFIX_SIZE: u64 = WORD_SIZE as u64;

/// Length-prefixed UTF-8 cells packed into a single text arena.
///
/// `ends[i]` is the exclusive end of cell `i` inside `data`; cell `i` starts
/// where cell `i - 1` ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringColumn {
    data: String,
    ends: Vec<usize>,
    encoded_size: u64,
}

impl StringColumn {
    #[must_use]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        let end = *self.ends.get(index)?;
        Some(&self.data[self.start_of(index)..end])
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    pub fn push(&mut self, cell: &str) {
        self.data.push_str(cell);
        self.ends.push(self.data.len());
        self.encoded_size += PREFIX_SIZE + cell.len() as u64;
    }

    fn start_of(&self, index: usize) -> usize {
        if index == 0 { 0 } else { self.ends[index - 1] }
    }

    pub(super) fn encoded_size_of_last(&self) -> u64 {
        self.ends
            .len()
            .checked_sub(1)
            .map_or(0, |last| PREFIX_SIZE + (self.ends[last] - self.start_of(last)) as u64)
    }

    pub(super) const fn encoded_size(&self) -> u64 {
        self.encoded_size
    }

    pub(super) fn serialize_into<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        for cell in self.iter() {
            writer.write_i64::<LittleEndian>(cell.len() as i64)?;
            writer.write_all(cell.as_bytes())?;
        }
        Ok(())
    }

    pub(super) fn deserialize_from(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        self.clear();
        let mut offset = 0;
        while offset < bytes.len() {
            let Some(prefix) = bytes.get(offset..offset + WORD_SIZE) else {
                return Err(DecodeError::TruncatedPrefix { offset });
            };
            let declared = LittleEndian::read_i64(prefix);
            let body_start = offset + WORD_SIZE;
            let body = usize::try_from(declared)
                .ok()
                .and_then(|len| body_start.checked_add(len))
                .and_then(|body_end| bytes.get(body_start..body_end))
                .ok_or(DecodeError::Overrun { offset, declared })?;
            let text = simdutf8::basic::from_utf8(body)
                .map_err(|_| DecodeError::InvalidUtf8 { offset: body_start })?;
            self.push(text);
            offset = body_start + body.len();
        }
        Ok(())
    }

    pub(super) fn clear(&mut self) {
        self.data.clear();
        self.ends.clear();
        self.encoded_size = 0;
    }
}
