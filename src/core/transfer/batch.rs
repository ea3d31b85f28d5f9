//! Batch accumulation
//!
//! Collects normalized values into batches of at most `batch_size` elements.
//! A full batch is handed back from [`BatchAccumulator::push`]; whatever is
//! left at end of stream comes back from [`BatchAccumulator::drain`].

use crate::domain::value::FieldValue;
use std::num::NonZeroUsize;

/// Ordered group of normalized values written by one store operation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    values: Vec<FieldValue>,
}

impl Batch {
    /// Wrap values into a batch
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { values }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the batch holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the values
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Consume the batch
    pub fn into_values(self) -> Vec<FieldValue> {
        self.values
    }
}

/// Accumulates values up to a fixed batch size
#[derive(Debug)]
pub struct BatchAccumulator {
    batch_size: NonZeroUsize,
    pending: Vec<FieldValue>,
}

impl BatchAccumulator {
    /// Create an accumulator that flushes every `batch_size` values
    pub fn new(batch_size: NonZeroUsize) -> Self {
        Self {
            batch_size,
            pending: Vec::new(),
        }
    }

    /// Configured flush threshold
    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Number of values waiting for the next flush
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Append a value; returns the full batch when the threshold is reached
    ///
    /// Callers only push values that survived normalization.
    pub fn push(&mut self, value: FieldValue) -> Option<Batch> {
        self.pending.push(value);
        if self.pending.len() >= self.batch_size.get() {
            Some(self.take())
        } else {
            None
        }
    }

    /// Return the partial batch left at end of stream, if any
    pub fn drain(&mut self) -> Option<Batch> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    fn take(&mut self) -> Batch {
        Batch::new(std::mem::take(&mut self.pending))
    }
}
