use std::io::{BufWriter, Write};

use itoa::Buffer as ItoaBuffer;

use crate::error::{Error, Result};
use crate::sinks::{RowSink, SinkContext};
use crate::source::DEFAULT_DELIMITER;
use crate::value::Value;

const ROW_TERMINATOR: &[u8] = b"\n";

/// Writes decoded rows back out as naive delimited text.
///
/// Fields are joined by the delimiter without quoting and rows are separated
/// by `\n`; no terminator follows the final row.
pub struct TextSink<W: Write> {
    output: Option<BufWriter<W>>,
    delimiter: [u8; 4],
    delimiter_len: usize,
    column_count: Option<usize>,
    rows_written: u64,
    itoa: ItoaBuffer,
}

impl<W: Write> TextSink<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            output: Some(BufWriter::new(writer)),
            delimiter: [0; 4],
            delimiter_len: 0,
            column_count: None,
            rows_written: 0,
            itoa: ItoaBuffer::new(),
        }
        .with_delimiter(DEFAULT_DELIMITER)
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = [0; 4];
        self.delimiter_len = delimiter.encode_utf8(&mut self.delimiter).len();
        self
    }

    #[must_use]
    pub const fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered output cannot be flushed or the sink was
    /// already consumed.
    pub fn into_inner(mut self) -> Result<W> {
        let output = self
            .output
            .take()
            .ok_or_else(|| Error::invalid_input("text sink output already taken"))?;
        output.into_inner().map_err(|err| Error::Io(err.into_error()))
    }
}

impl<W: Write> RowSink for TextSink<W> {
    fn begin(&mut self, context: SinkContext<'_>) -> Result<()> {
        if self.column_count.is_some() {
            return Err(Error::invalid_input(
                "text sink cannot be reused without finishing",
            ));
        }
        self.column_count = Some(context.schema.len());
        Ok(())
    }

    fn write_row(&mut self, row: &[Value<'_>]) -> Result<()> {
        let expected = self
            .column_count
            .ok_or_else(|| Error::invalid_input("text sink received a row before begin"))?;
        if row.len() != expected {
            return Err(Error::invalid_input(format!(
                "row length {} does not match expected {expected}",
                row.len()
            )));
        }

        let first_row = self.rows_written == 0;
        let delimiter = &self.delimiter[..self.delimiter_len];
        let output = self
            .output
            .as_mut()
            .ok_or_else(|| Error::invalid_input("text sink output already taken"))?;
        if !first_row {
            output.write_all(ROW_TERMINATOR)?;
        }
        for (idx, value) in row.iter().enumerate() {
            if idx > 0 {
                output.write_all(delimiter)?;
            }
            match value {
                Value::Int64(v) => output.write_all(self.itoa.format(*v).as_bytes())?,
                Value::Str(s) => output.write_all(s.as_bytes())?,
            }
        }
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(output) = self.output.as_mut() {
            output.flush()?;
        }
        self.column_count = None;
        Ok(())
    }
}
