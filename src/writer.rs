//! Row-group batching writer.

use std::io::{self, BufWriter, Write};

use crate::column::Column;
use crate::error::{Error, Result, SchemaError};
use crate::footer::{BatchRecord, Footer};
use crate::logger::log_warn;
use crate::schema::Schema;
use crate::source::{DEFAULT_DELIMITER, Record, RowSource};

/// Batch size threshold used unless overridden: 128 MiB of encoded cells.
pub const DEFAULT_ROW_GROUP_BYTES: u64 = 128 * 1024 * 1024;

/// Configures batching and text splitting for the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    row_group_bytes: u64,
    delimiter: char,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl WriterOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            row_group_bytes: DEFAULT_ROW_GROUP_BYTES,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Sets the encoded size a batch may reach before the next row starts a
    /// new batch. The row that crosses the threshold stays in the batch.
    #[must_use]
    pub const fn with_row_group_bytes(mut self, bytes: u64) -> Self {
        self.row_group_bytes = bytes;
        self
    }

    /// Field separator used when the options drive a [`LineSource`].
    ///
    /// [`LineSource`]: crate::source::LineSource
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub const fn row_group_bytes(&self) -> u64 {
        self.row_group_bytes
    }

    #[must_use]
    pub const fn delimiter(&self) -> char {
        self.delimiter
    }
}

/// Totals reported once a write completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows: u64,
    pub batches: usize,
    pub bytes_written: u64,
    pub source_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Accumulating,
    Finalized,
    Failed,
}

/// Streams rows from a [`RowSource`] into row-group batches followed by the
/// footer.
///
/// The schema is inferred from the first source row, which is then stored
/// as row 0. Column buffers are cleared and reused after every batch so only
/// one batch is held in memory.
pub struct RowGroupWriter<S: RowSource, W: Write> {
    source: S,
    output: CountingWriter<BufWriter<W>>,
    row_group_bytes: u64,
    columns: Vec<Column>,
    footer: Footer,
    record: Record,
    has_pending: bool,
    rows_read: u64,
    state: WriterState,
}

impl<S: RowSource, W: Write> RowGroupWriter<S, W> {
    /// Reads the first row of `source` and infers the file schema from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the first row cannot be read.
    pub fn new(mut source: S, output: W, options: &WriterOptions) -> Result<Self> {
        let mut record = Record::new();
        let has_pending = source.next_record(&mut record)?;
        let schema = if has_pending {
            Schema::infer(&record)
        } else {
            Schema::default()
        };
        let columns = schema.columns().iter().map(|&ty| Column::new(ty)).collect();

        Ok(Self {
            source,
            output: CountingWriter::new(BufWriter::new(output)),
            row_group_bytes: options.row_group_bytes(),
            columns,
            footer: Footer::new(schema),
            record,
            has_pending,
            rows_read: 0,
            state: WriterState::Accumulating,
        })
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        self.footer.schema()
    }

    /// Footer accumulated so far; complete once [`Self::write_all`] returns.
    #[must_use]
    pub const fn footer(&self) -> &Footer {
        &self.footer
    }

    /// Consumes the whole source and writes every batch plus the footer.
    ///
    /// On failure the batches flushed so far stay in the output, but no
    /// footer is written and the writer cannot be resumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if a row does not fit the inferred schema,
    /// [`Error::Io`] if reading or writing fails, and
    /// [`Error::InvalidInput`] if the writer already finished.
    pub fn write_all(&mut self) -> Result<WriteSummary> {
        if self.state != WriterState::Accumulating {
            return Err(Error::invalid_input("row-group writer already finished"));
        }
        let result = self.drive();
        self.state = if result.is_ok() {
            WriterState::Finalized
        } else {
            WriterState::Failed
        };
        result
    }

    /// Returns the underlying output after flushing buffered bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn into_inner(self) -> Result<W> {
        self.output
            .inner
            .into_inner()
            .map_err(|err| Error::Io(err.into_error()))
    }

    fn drive(&mut self) -> Result<WriteSummary> {
        while self.has_pending {
            self.write_batch()?;
        }
        self.footer.write_to(&mut self.output)?;
        self.output.flush()?;

        Ok(WriteSummary {
            rows: self.rows_read,
            batches: self.footer.batch_count(),
            bytes_written: self.output.position,
            source_bytes: self.source.position(),
        })
    }

    fn write_batch(&mut self) -> Result<()> {
        let offset = self.output.position;
        let mut capacity = 0u64;
        let mut row_count = 0u64;
        while self.has_pending && capacity <= self.row_group_bytes {
            capacity += self.append_pending()?;
            row_count += 1;
            self.has_pending = self.source.next_record(&mut self.record)?;
        }
        if row_count == 1 && capacity > self.row_group_bytes {
            log_warn(&format!(
                "row {} alone encodes to {capacity} bytes, above the {} byte batch threshold",
                self.rows_read - 1,
                self.row_group_bytes
            ));
        }
        self.flush_batch(offset, row_count)
    }

    /// Appends the pending record and returns its encoded size.
    fn append_pending(&mut self) -> Result<u64> {
        let row = self.rows_read;
        if self.record.len() != self.columns.len() {
            return Err(SchemaError::FieldCount {
                row,
                expected: self.columns.len(),
                found: self.record.len(),
            }
            .into());
        }

        let mut row_size = 0;
        for (index, (column, cell)) in self.columns.iter_mut().zip(self.record.iter()).enumerate()
        {
            column
                .append_text(cell)
                .map_err(|_| SchemaError::TypeMismatch {
                    row,
                    column: index,
                    expected: column.column_type(),
                    value: cell.to_owned(),
                })?;
            row_size += column.encoded_size_of_last();
        }
        self.rows_read += 1;
        Ok(row_size)
    }

    fn flush_batch(&mut self, offset: u64, row_count: u64) -> Result<()> {
        let mut column_sizes = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            column.serialize_into(&mut self.output)?;
            column_sizes.push(column.encoded_size());
        }
        let byte_size = self.output.position - offset;
        self.footer.push_batch(
            offset,
            BatchRecord {
                byte_size,
                column_sizes,
                row_count,
            },
        );
        for column in &mut self.columns {
            column.clear();
        }
        self.output.flush()?;
        Ok(())
    }
}

/// Tracks the absolute position of everything written through it.
struct CountingWriter<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> CountingWriter<W> {
    const fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
