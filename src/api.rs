use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::footer::Footer;
use crate::reader::{ReadOptions, RowGroupReader};
use crate::sinks::TextSink;
use crate::source::LineSource;
use crate::writer::{RowGroupWriter, WriteSummary, WriterOptions};

/// Encodes the delimited text file at `input` into a table file at `output`.
///
/// # Errors
///
/// Returns an error if either file cannot be opened or a row does not fit the
/// schema inferred from the first row.
pub fn encode_path<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &WriterOptions,
) -> Result<WriteSummary> {
    let source = LineSource::new(BufReader::new(File::open(input)?))
        .with_delimiter(options.delimiter());
    let file = File::create(output)?;
    let mut writer = RowGroupWriter::new(source, file, options)?;
    let summary = writer.write_all()?;
    writer.into_inner()?.sync_all()?;
    Ok(summary)
}

/// Encodes in-memory delimited text and returns the table file bytes.
///
/// # Errors
///
/// Returns [`Error::Schema`] if a row does not fit the inferred schema.
pub fn encode_text(text: &str, options: &WriterOptions) -> Result<Vec<u8>> {
    let source = LineSource::new(text.as_bytes()).with_delimiter(options.delimiter());
    let mut writer = RowGroupWriter::new(source, Vec::new(), options)?;
    writer.write_all()?;
    writer.into_inner()
}

/// Decodes the table file at `input` back to delimited text at `output`,
/// returning the number of rows written.
///
/// # Errors
///
/// Returns an error if either file cannot be opened or the table file is
/// corrupted.
pub fn decode_path<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ReadOptions,
) -> Result<u64> {
    let mut reader = RowGroupReader::open(input)?;
    let mut sink = TextSink::new(File::create(output)?).with_delimiter(options.delimiter());
    let rows = reader.decode_with_options(options, &mut sink)?;
    sink.into_inner()?.sync_all()?;
    Ok(rows)
}

/// Decodes in-memory table file bytes back to delimited text.
///
/// # Errors
///
/// Returns [`Error::Corrupted`] if the bytes are not a valid table file.
pub fn decode_text(bytes: &[u8], options: &ReadOptions) -> Result<String> {
    let mut reader = RowGroupReader::from_reader(Cursor::new(bytes))?;
    let mut sink = TextSink::new(Vec::new()).with_delimiter(options.delimiter());
    reader.decode_with_options(options, &mut sink)?;
    String::from_utf8(sink.into_inner()?).map_err(|err| Error::invalid_input(err.to_string()))
}

/// Footer-level description of a table file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub columns: Vec<&'static str>,
    pub total_rows: u64,
    pub data_bytes: u64,
    pub file_bytes: u64,
    pub batches: Vec<BatchSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub index: usize,
    pub offset: u64,
    pub byte_size: u64,
    pub row_count: u64,
    pub column_sizes: Vec<u64>,
}

impl FileSummary {
    #[must_use]
    pub fn from_footer(footer: &Footer) -> Self {
        let batches = footer
            .batch_offsets()
            .iter()
            .zip(footer.batches())
            .enumerate()
            .map(|(index, (&offset, batch))| BatchSummary {
                index,
                offset,
                byte_size: batch.byte_size,
                row_count: batch.row_count,
                column_sizes: batch.column_sizes.clone(),
            })
            .collect();
        Self {
            columns: footer.column_types().iter().map(|ty| ty.name()).collect(),
            total_rows: footer.total_rows(),
            data_bytes: footer.data_end(),
            file_bytes: footer.data_end() + footer.encoded_len(),
            batches,
        }
    }
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Rows: {}  Columns: {}  Batches: {}  Bytes: {}",
            self.total_rows,
            self.columns.len(),
            self.batches.len(),
            self.file_bytes
        )?;
        writeln!(f, "Schema: {}", self.columns.join(", "))?;
        for batch in &self.batches {
            writeln!(
                f,
                "[{idx:>3}] offset={offset:<10} bytes={bytes:<10} rows={rows}",
                idx = batch.index,
                offset = batch.offset,
                bytes = batch.byte_size,
                rows = batch.row_count,
            )?;
        }
        Ok(())
    }
}

/// Reads only the footer of the table file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its footer is corrupted.
pub fn inspect_path<P: AsRef<Path>>(path: P) -> Result<FileSummary> {
    inspect_reader(BufReader::new(File::open(path)?))
}

/// Reads only the footer from any seekable table file.
///
/// # Errors
///
/// Returns [`Error::Corrupted`] if the footer is missing or inconsistent.
pub fn inspect_reader<R: Read + Seek>(mut reader: R) -> Result<FileSummary> {
    let footer = Footer::load(&mut reader)?;
    Ok(FileSummary::from_footer(&footer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip_with_custom_delimiter() {
        let input = "a|1\nb|2\nc|3";
        let bytes = encode_text(input, &WriterOptions::new().with_delimiter('|')).unwrap();
        let decoded = decode_text(&bytes, &ReadOptions::new().with_delimiter('|')).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn selected_batches_decode_in_requested_order() {
        let bytes = encode_text("1\n2\n3", &WriterOptions::new().with_row_group_bytes(0)).unwrap();
        let decoded = decode_text(&bytes, &ReadOptions::new().with_batches([2, 0])).unwrap();
        assert_eq!(decoded, "3\n1");
    }

    #[test]
    fn summary_accounts_for_every_byte() {
        let bytes = encode_text("John,25\nJane,30", &WriterOptions::new()).unwrap();
        let summary = inspect_reader(Cursor::new(&bytes)).unwrap();
        assert_eq!(summary.file_bytes, bytes.len() as u64);
        assert_eq!(summary.columns, ["string", "int64"]);
        assert_eq!(summary.total_rows, 2);
    }
}
