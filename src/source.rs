use std::io::BufRead;

use crate::error::Result;

/// Default field separator for delimited text.
pub const DEFAULT_DELIMITER: char = ',';

/// One source row: a line of text plus the byte spans of its fields.
///
/// The line buffer and span vector are reused from row to row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    line: String,
    spans: Vec<(usize, usize)>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record by splitting `line` on `delimiter`.
    #[must_use]
    pub fn from_line(line: impl Into<String>, delimiter: char) -> Self {
        let mut record = Self {
            line: line.into(),
            spans: Vec::new(),
        };
        record.split(delimiter);
        record
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        let &(start, end) = self.spans.get(index)?;
        Some(&self.line[start..end])
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans
            .iter()
            .map(move |&(start, end)| &self.line[start..end])
    }

    fn split(&mut self, delimiter: char) {
        self.spans.clear();
        let mut start = 0;
        for (idx, _) in self.line.match_indices(delimiter) {
            self.spans.push((start, idx));
            start = idx + delimiter.len_utf8();
        }
        self.spans.push((start, self.line.len()));
    }
}

/// Row-oriented input consumed by the table writer.
pub trait RowSource {
    /// Reads the next row into `record`, returning `false` once the input is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input cannot be read.
    fn next_record(&mut self, record: &mut Record) -> Result<bool>;

    /// Bytes consumed from the input so far.
    fn position(&self) -> u64;
}

/// Line-per-row delimited text with naive field splitting.
///
/// There is no quoting or escaping: every occurrence of the delimiter starts
/// a new field. Lines end at `\n`; a final line without a terminator is still
/// a row, and a trailing terminator does not produce an extra empty row.
pub struct LineSource<R: BufRead> {
    reader: R,
    delimiter: char,
    position: u64,
}

impl<R: BufRead> LineSource<R> {
    #[must_use]
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            delimiter: DEFAULT_DELIMITER,
            position: 0,
        }
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl<R: BufRead> RowSource for LineSource<R> {
    fn next_record(&mut self, record: &mut Record) -> Result<bool> {
        record.line.clear();
        let read = self.reader.read_line(&mut record.line)?;
        if read == 0 {
            record.spans.clear();
            return Ok(false);
        }
        self.position += read as u64;
        if record.line.ends_with('\n') {
            record.line.pop();
        }
        record.split(self.delimiter);
        Ok(true)
    }

    fn position(&self) -> u64 {
        self.position
    }
}
