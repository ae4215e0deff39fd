//! Trailing metadata of a table file.
//!
//! The footer is a run of 8-byte little-endian words written after the last
//! batch:
//!
//! ```text
//! batch_count
//! batch_offset        x batch_count
//! column_count
//! column_type_tag     x column_count
//! batch record        x batch_count, each:
//!     batch_byte_size
//!     column_byte_size x column_count
//!     row_count
//! footer_byte_size    (size of everything above, always the last 8 bytes)
//! ```

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::column::WORD_SIZE;
use crate::error::{Error, Result, Section};
use crate::schema::{ColumnType, Schema};

const WORD: u64 = WORD_SIZE as u64;

/// Sizing of one batch as recorded in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub byte_size: u64,
    pub column_sizes: Vec<u64>,
    pub row_count: u64,
}

/// Decoded footer: batch offsets, schema and per-batch records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footer {
    offsets: Vec<u64>,
    schema: Schema,
    batches: Vec<BatchRecord>,
    data_end: u64,
}

impl Footer {
    /// Starts an empty footer for a file with the given schema.
    #[must_use]
    pub const fn new(schema: Schema) -> Self {
        Self {
            offsets: Vec::new(),
            schema,
            batches: Vec::new(),
            data_end: 0,
        }
    }

    /// Records a batch that was written at `offset`.
    pub fn push_batch(&mut self, offset: u64, record: BatchRecord) {
        self.data_end = offset + record.byte_size;
        self.offsets.push(offset);
        self.batches.push(record);
    }

    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn batch_offsets(&self) -> &[u64] {
        &self.offsets
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn column_types(&self) -> &[ColumnType] {
        self.schema.columns()
    }

    #[must_use]
    pub fn batch(&self, index: usize) -> Option<&BatchRecord> {
        self.batches.get(index)
    }

    #[must_use]
    pub fn batches(&self) -> &[BatchRecord] {
        &self.batches
    }

    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.batches.iter().map(|batch| batch.row_count).sum()
    }

    /// Offset of the first footer byte; batch data lives before it.
    #[must_use]
    pub const fn data_end(&self) -> u64 {
        self.data_end
    }

    /// Bytes the footer occupies on disk, including the trailing size word.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        (self.word_count() + 1) * WORD
    }

    fn word_count(&self) -> u64 {
        let columns = self.schema.len() as u64;
        let batches = self.batches.len() as u64;
        2 + batches + columns + batches * (columns + 2)
    }

    /// Writes the footer words followed by the footer size.
    ///
    /// # Errors
    ///
    /// Returns any error raised by `writer`.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<u64> {
        writer.write_i64::<LittleEndian>(self.offsets.len() as i64)?;
        for &offset in &self.offsets {
            writer.write_i64::<LittleEndian>(offset as i64)?;
        }
        writer.write_i64::<LittleEndian>(self.schema.len() as i64)?;
        for column_type in self.schema.columns() {
            writer.write_i64::<LittleEndian>(column_type.tag())?;
        }
        for batch in &self.batches {
            writer.write_i64::<LittleEndian>(batch.byte_size as i64)?;
            for &size in &batch.column_sizes {
                writer.write_i64::<LittleEndian>(size as i64)?;
            }
            writer.write_i64::<LittleEndian>(batch.row_count as i64)?;
        }
        writer.write_i64::<LittleEndian>((self.word_count() * WORD) as i64)?;
        Ok(self.encoded_len())
    }

    /// Locates the footer from the end of `reader` and decodes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupted`] if the size word or any footer field is
    /// missing or inconsistent, and [`Error::Io`] for other read failures.
    pub fn load<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<Self> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        if file_len < WORD {
            return Err(metadata_size("file is shorter than the footer size word"));
        }
        reader.seek(SeekFrom::Start(file_len - WORD))?;
        let declared = reader.read_i64::<LittleEndian>()?;
        let footer_len = u64::try_from(declared)
            .ok()
            .filter(|len| len % WORD == 0 && *len <= file_len - WORD)
            .ok_or_else(|| metadata_size(format!("footer size {declared} does not fit the file")))?;

        let data_end = file_len - WORD - footer_len;
        reader.seek(SeekFrom::Start(data_end))?;
        let mut bytes = vec![0u8; usize::try_from(footer_len).map_err(|_| {
            metadata_size(format!("footer size {footer_len} exceeds addressable memory"))
        })?];
        reader.read_exact(&mut bytes).map_err(|err| {
            metadata_size(format!("footer of {footer_len} bytes is unreadable: {err}"))
        })?;

        Self::decode(&bytes, data_end)
    }

    fn decode(bytes: &[u8], data_end: u64) -> Result<Self> {
        let mut words = Words::new(bytes);

        let batch_count = words.count("batch count")?;
        let mut offsets = Vec::with_capacity(batch_count);
        for _ in 0..batch_count {
            offsets.push(words.unsigned("batch offset")?);
        }

        let column_count = words.count("column count")?;
        if column_count == 0 && batch_count > 0 {
            return Err(footer_error(format!(
                "{batch_count} batches recorded for a table without columns"
            )));
        }
        let mut columns = Vec::with_capacity(column_count);
        for index in 0..column_count {
            let tag = words.next("column type")?;
            let column_type = ColumnType::from_tag(tag).ok_or_else(|| {
                footer_error(format!("column {index} has unknown type tag {tag}"))
            })?;
            columns.push(column_type);
        }

        let mut batches = Vec::with_capacity(batch_count);
        for index in 0..batch_count {
            let byte_size = words.unsigned("batch byte size")?;
            let mut column_sizes = Vec::with_capacity(column_count);
            for _ in 0..column_count {
                column_sizes.push(words.unsigned("column byte size")?);
            }
            let row_count = words.unsigned("row count")?;

            let column_total = column_sizes
                .iter()
                .try_fold(0u64, |acc, &size| acc.checked_add(size));
            if column_total != Some(byte_size) {
                return Err(Error::corrupted(
                    Section::Batch { index },
                    format!("batch size {byte_size} does not match its column sizes"),
                ));
            }
            let offset = offsets[index];
            if offset.checked_add(byte_size).is_none_or(|end| end > data_end) {
                return Err(Error::corrupted(
                    Section::Batch { index },
                    format!(
                        "{byte_size} bytes at offset {offset} run past the data region ending at {data_end}"
                    ),
                ));
            }
            batches.push(BatchRecord {
                byte_size,
                column_sizes,
                row_count,
            });
        }

        if words.remaining() != 0 {
            return Err(footer_error(format!(
                "{} unexpected trailing footer words",
                words.remaining()
            )));
        }

        Ok(Self {
            offsets,
            schema: Schema::new(columns),
            batches,
            data_end,
        })
    }
}

fn metadata_size(details: impl Into<std::borrow::Cow<'static, str>>) -> Error {
    let details = details.into();
    Error::corrupted(Section::Footer, format!("metadata size: {details}"))
}

fn footer_error(details: String) -> Error {
    Error::corrupted(Section::Footer, details)
}

/// Cursor over the footer's little-endian words.
struct Words<'a> {
    bytes: &'a [u8],
}

impl<'a> Words<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    const fn remaining(&self) -> usize {
        self.bytes.len() / WORD_SIZE
    }

    fn next(&mut self, field: &'static str) -> Result<i64> {
        self.bytes
            .read_i64::<LittleEndian>()
            .map_err(|_| footer_error(format!("footer ends before {field}")))
    }

    fn unsigned(&mut self, field: &'static str) -> Result<u64> {
        let value = self.next(field)?;
        u64::try_from(value).map_err(|_| footer_error(format!("negative {field} {value}")))
    }

    /// Reads a count and checks that the footer could hold that many words.
    fn count(&mut self, field: &'static str) -> Result<usize> {
        let value = self.unsigned(field)?;
        usize::try_from(value)
            .ok()
            .filter(|&count| count <= self.remaining())
            .ok_or_else(|| footer_error(format!("{field} {value} exceeds the footer size")))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn sample_footer() -> Footer {
        let mut footer = Footer::new(Schema::new(vec![ColumnType::String, ColumnType::Int64]));
        footer.push_batch(
            0,
            BatchRecord {
                byte_size: 30,
                column_sizes: vec![14, 16],
                row_count: 2,
            },
        );
        footer.push_batch(
            30,
            BatchRecord {
                byte_size: 17,
                column_sizes: vec![9, 8],
                row_count: 1,
            },
        );
        footer
    }

    fn file_with(footer: &Footer) -> Vec<u8> {
        let mut bytes = vec![0xAB; usize::try_from(footer.data_end()).unwrap()];
        footer.write_to(&mut bytes).unwrap();
        bytes
    }

    fn words(bytes: &[u8]) -> Vec<i64> {
        bytes
            .chunks_exact(8)
            .map(|chunk| i64::from_le_bytes(chunk.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn writes_words_in_documented_order() {
        let footer = sample_footer();
        let bytes = file_with(&footer);
        let tail = words(&bytes[47..]);
        assert_eq!(
            tail,
            [2, 0, 30, 2, 2, 1, 30, 14, 16, 2, 17, 9, 8, 1, 14 * 8]
        );
        assert_eq!(footer.encoded_len(), 15 * 8);
    }

    #[test]
    fn load_round_trips_written_footer() {
        let footer = sample_footer();
        let loaded = Footer::load(&mut Cursor::new(file_with(&footer))).unwrap();
        assert_eq!(loaded, footer);
        assert_eq!(loaded.total_rows(), 3);
        assert_eq!(loaded.data_end(), 47);
        assert_eq!(loaded.batch(1).unwrap().column_sizes, [9, 8]);
        assert_eq!(loaded.batch(2), None);
    }

    #[test]
    fn empty_footer_is_three_words() {
        let footer = Footer::new(Schema::default());
        let mut bytes = Vec::new();
        footer.write_to(&mut bytes).unwrap();
        assert_eq!(words(&bytes), [0, 0, 16]);

        let loaded = Footer::load(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(loaded.batch_count(), 0);
        assert!(loaded.schema().is_empty());
    }

    #[test]
    fn short_file_reports_metadata_size() {
        let err = Footer::load(&mut Cursor::new(vec![1u8, 2, 3])).unwrap_err();
        match err {
            Error::Corrupted {
                section: Section::Footer,
                details,
            } => assert!(details.starts_with("metadata size"), "{details}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn oversized_or_misaligned_size_word_is_rejected() {
        for declared in [1_000i64, 12, -8] {
            let mut bytes = vec![0u8; 24];
            bytes.extend_from_slice(&declared.to_le_bytes());
            let err = Footer::load(&mut Cursor::new(bytes)).unwrap_err();
            assert!(
                matches!(err, Error::Corrupted { section: Section::Footer, .. }),
                "declared {declared}: {err}"
            );
        }
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let mut bytes = Vec::new();
        for word in [0i64, 1, 9, 24] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        let err = Footer::load(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("unknown type tag 9"), "{err}");
    }

    #[test]
    fn batch_outside_data_region_is_rejected() {
        let footer = sample_footer();
        let mut bytes = file_with(&footer);
        // Second batch offset word sits right after the batch count.
        let offset_pos = 47 + 16;
        bytes[offset_pos..offset_pos + 8].copy_from_slice(&40i64.to_le_bytes());
        let err = Footer::load(&mut Cursor::new(bytes)).unwrap_err();
        assert!(
            matches!(err, Error::Corrupted { section: Section::Batch { index: 1 }, .. }),
            "{err}"
        );
    }

    #[test]
    fn inconsistent_batch_size_is_rejected() {
        let footer = sample_footer();
        let mut bytes = file_with(&footer);
        // First record's batch_byte_size follows count, 2 offsets, count, 2 tags.
        let record_pos = 47 + 6 * 8;
        bytes[record_pos..record_pos + 8].copy_from_slice(&31i64.to_le_bytes());
        let err = Footer::load(&mut Cursor::new(bytes)).unwrap_err();
        assert!(
            matches!(err, Error::Corrupted { section: Section::Batch { index: 0 }, .. }),
            "{err}"
        );
    }

    #[test]
    fn absurd_batch_count_does_not_allocate() {
        let mut bytes = Vec::new();
        for word in [i64::MAX, 8] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        let err = Footer::load(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("batch count"), "{err}");
    }

    #[test]
    fn batches_without_columns_are_rejected() {
        let mut bytes = Vec::new();
        for word in [1i64, 0, 0, 0, 3, 40] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        let err = Footer::load(&mut Cursor::new(bytes)).unwrap_err();
        assert!(
            matches!(err, Error::Corrupted { section: Section::Footer, .. }),
            "{err}"
        );
    }
}
