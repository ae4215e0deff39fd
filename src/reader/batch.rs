use crate::column::Column;
use crate::value::Value;

/// Decoded columns of one batch, borrowed from the reader.
///
/// The view is invalidated by the next batch load, which clears and refills
/// the same column buffers.
#[derive(Debug, Clone, Copy)]
pub struct BatchView<'a> {
    index: usize,
    row_count: usize,
    columns: &'a [Column],
}

impl<'a> BatchView<'a> {
    pub(crate) const fn new(index: usize, row_count: usize, columns: &'a [Column]) -> Self {
        Self {
            index,
            row_count,
            columns,
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub const fn columns(&self) -> &'a [Column] {
        self.columns
    }

    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> Option<Value<'a>> {
        self.columns.get(column)?.value(row)
    }

    /// Replaces the contents of `out` with the cells of `row`.
    pub fn fill_row(&self, row: usize, out: &mut Vec<Value<'a>>) {
        out.clear();
        out.extend(self.columns.iter().filter_map(|column| column.value(row)));
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<Value<'a>>> + '_ {
        (0..self.row_count).map(move |row| {
            let mut values = Vec::with_capacity(self.columns.len());
            self.fill_row(row, &mut values);
            values
        })
    }
}
