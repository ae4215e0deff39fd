use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::source::DEFAULT_DELIMITER;

/// Configures text reconstruction and batch selection for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    delimiter: char,
    batches: Option<Vec<usize>>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            batches: None,
        }
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Restricts decoding to the given batch indices, in the given order.
    /// An empty selection means every batch.
    #[must_use]
    pub fn with_batches<I>(mut self, batches: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let collected: Vec<usize> = batches.into_iter().collect();
        self.batches = if collected.is_empty() {
            None
        } else {
            Some(collected)
        };
        self
    }

    #[must_use]
    pub const fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Resolves the batch indices to decode for a file with `batch_count`
    /// batches.
    pub(crate) fn resolve_batches(&self, batch_count: usize) -> Result<Vec<usize>> {
        let Some(batches) = &self.batches else {
            return Ok((0..batch_count).collect());
        };
        let mut seen = HashSet::with_capacity(batches.len());
        for &index in batches {
            if index >= batch_count {
                return Err(Error::invalid_input(format!(
                    "batch index {index} out of range ({batch_count} batches)"
                )));
            }
            if !seen.insert(index) {
                return Err(Error::invalid_input(format!(
                    "duplicate batch index {index} in selection"
                )));
            }
        }
        Ok(batches.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection_is_every_batch() {
        let options = ReadOptions::new().with_batches(Vec::new());
        assert_eq!(options.resolve_batches(3).unwrap(), [0, 1, 2]);
    }

    #[test]
    fn selection_keeps_order_and_rejects_bad_indices() {
        let options = ReadOptions::new().with_batches([2, 0]);
        assert_eq!(options.resolve_batches(3).unwrap(), [2, 0]);
        assert!(options.resolve_batches(2).is_err());
        assert!(
            ReadOptions::new()
                .with_batches([1, 1])
                .resolve_batches(3)
                .is_err()
        );
    }
}
