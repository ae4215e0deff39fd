mod batch;
mod options;

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::column::Column;
use crate::error::{Error, Result, Section};
use crate::footer::Footer;
use crate::logger::log_warn;
use crate::schema::Schema;
use crate::sinks::{RowSink, SinkContext};

pub use batch::BatchView;
pub use options::ReadOptions;

/// Decodes a table file batch by batch.
///
/// One set of column buffers is reused for every batch, so at most one
/// batch of cells is materialised at a time.
pub struct RowGroupReader<R: Read + Seek> {
    reader: R,
    footer: Footer,
    columns: Vec<Column>,
    scratch: Vec<u8>,
}

impl RowGroupReader<BufReader<File>> {
    /// Opens a table file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its footer cannot be
    /// decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> RowGroupReader<R> {
    /// Builds a reader from any `Read + Seek` implementor.
    ///
    /// # Errors
    ///
    /// Returns an error if the footer is missing or inconsistent.
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let footer = Footer::load(&mut reader)?;
        let batch_end = footer
            .batch_offsets()
            .iter()
            .zip(footer.batches())
            .map(|(offset, batch)| offset + batch.byte_size)
            .max()
            .unwrap_or(0);
        if batch_end < footer.data_end() {
            log_warn(&format!(
                "{} bytes between the last batch and the footer are not referenced",
                footer.data_end() - batch_end
            ));
        }
        let columns = footer.column_types().iter().map(|&ty| Column::new(ty)).collect();
        Ok(Self {
            reader,
            footer,
            columns,
            scratch: Vec::new(),
        })
    }

    #[must_use]
    pub const fn footer(&self) -> &Footer {
        &self.footer
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        self.footer.schema()
    }

    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.footer.batch_count()
    }

    /// Seeks to batch `index` and decodes all of its columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an out-of-range index and
    /// [`Error::Corrupted`] if the batch bytes are short or malformed.
    pub fn load_batch(&mut self, index: usize) -> Result<BatchView<'_>> {
        self.clear_columns();
        let count = self.footer.batch_count();
        let record = self.footer.batch(index).ok_or_else(|| {
            Error::invalid_input(format!("batch index {index} out of range ({count} batches)"))
        })?;
        let offset = self.footer.batch_offsets()[index];
        let row_count = usize::try_from(record.row_count).map_err(|_| {
            Error::corrupted(
                Section::Batch { index },
                format!("row count {} exceeds addressable memory", record.row_count),
            )
        })?;

        self.reader.seek(SeekFrom::Start(offset))?;
        for (column_index, (column, &size)) in self
            .columns
            .iter_mut()
            .zip(&record.column_sizes)
            .enumerate()
        {
            let section = Section::Column {
                batch: index,
                index: column_index,
            };
            let len = usize::try_from(size).map_err(|_| {
                Error::corrupted(section, format!("{size} bytes exceed addressable memory"))
            })?;
            self.scratch.clear();
            self.scratch.resize(len, 0);
            self.reader
                .read_exact(&mut self.scratch)
                .map_err(|err| match err.kind() {
                    io::ErrorKind::UnexpectedEof => Error::corrupted(
                        section,
                        format!("expected {size} bytes at offset {offset}, found fewer"),
                    ),
                    _ => Error::Io(err),
                })?;
            column
                .deserialize_from(&self.scratch)
                .map_err(|err| Error::corrupted(section, err.to_string()))?;
            if column.len() != row_count {
                return Err(Error::corrupted(
                    section,
                    format!(
                        "decoded {} cells but the batch records {row_count} rows",
                        column.len()
                    ),
                ));
            }
        }

        Ok(BatchView::new(index, row_count, &self.columns))
    }

    /// Streams every batch, in file order, into `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if a batch cannot be decoded or the sink fails. Rows
    /// handed to the sink before the failure are not retracted.
    pub fn decode_all<S: RowSink>(&mut self, sink: &mut S) -> Result<u64> {
        let indices: Vec<usize> = (0..self.footer.batch_count()).collect();
        self.decode_batches(&indices, sink)
    }

    /// Streams the batches selected by `options` into `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is invalid, a batch cannot be
    /// decoded, or the sink fails.
    pub fn decode_with_options<S: RowSink>(
        &mut self,
        options: &ReadOptions,
        sink: &mut S,
    ) -> Result<u64> {
        let indices = options.resolve_batches(self.footer.batch_count())?;
        self.decode_batches(&indices, sink)
    }

    /// Streams the given batches, in the given order, into `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if an index is out of range, a batch cannot be
    /// decoded, or the sink fails.
    pub fn decode_batches<S: RowSink>(&mut self, indices: &[usize], sink: &mut S) -> Result<u64> {
        sink.begin(SinkContext::new(&self.footer))?;
        let mut rows = 0u64;
        for &index in indices {
            {
                let view = self.load_batch(index)?;
                let mut row = Vec::with_capacity(view.columns().len());
                for row_index in 0..view.row_count() {
                    view.fill_row(row_index, &mut row);
                    sink.write_row(&row)?;
                }
                rows += view.row_count() as u64;
            }
            self.clear_columns();
        }
        sink.finish()?;
        Ok(rows)
    }

    fn clear_columns(&mut self) {
        for column in &mut self.columns {
            column.clear();
        }
    }
}
