//! Configuration for buffered readers.
//!
//! The reader configuration controls:
//! - Buffer capacity (clamped to [`MIN_BUF_SIZE`])
//! - How many consecutive empty reads a source may return before the reader
//!   gives up with [`Error::NoProgress`](crate::Error::NoProgress)

/// Default buffer capacity for [`BufferedReader`](crate::io::BufferedReader).
pub const DEFAULT_BUF_SIZE: usize = 4096;

/// Smallest buffer capacity a reader will use.
pub const MIN_BUF_SIZE: usize = 16;

/// Default bound on consecutive zero-byte reads from a source.
pub const MAX_CONSECUTIVE_EMPTY_READS: usize = 100;

/// Configuration for a buffered reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Requested buffer capacity in bytes.
    pub capacity: usize,
    /// Consecutive zero-byte reads tolerated before failing.
    pub max_empty_reads: usize,
}

impl ReaderConfig {
    /// Creates a configuration with the default capacity and retry bound.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: DEFAULT_BUF_SIZE,
            max_empty_reads: MAX_CONSECUTIVE_EMPTY_READS,
        }
    }

    /// Sets the requested buffer capacity.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the bound on consecutive empty reads.
    ///
    /// A bound of zero is treated as one attempt.
    #[must_use]
    pub const fn max_empty_reads(mut self, attempts: usize) -> Self {
        self.max_empty_reads = attempts;
        self
    }

    /// Returns the capacity the reader will actually allocate.
    #[must_use]
    pub const fn effective_capacity(&self) -> usize {
        if self.capacity < MIN_BUF_SIZE {
            MIN_BUF_SIZE
        } else {
            self.capacity
        }
    }

    /// Returns the retry bound the reader will actually use.
    #[must_use]
    pub const fn effective_max_empty_reads(&self) -> usize {
        if self.max_empty_reads == 0 {
            1
        } else {
            self.max_empty_reads
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::new()
    }
}
