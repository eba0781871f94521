//! Error types for buffered reads.
//!
//! Error handling follows these principles:
//!
//! - Clean end-of-stream is not an error: read methods return `Ok(None)`.
//! - Errors never silently drop data. Any bytes gathered before a failure are
//!   attached to the error and available through [`Error::partial`].
//! - Contract violations by the byte source are fatal and are never retried.
//!
//! # Recovery Classification
//!
//! All errors can be classified by [`Recoverability`]:
//! - `Recoverable`: the reader is still usable and the caller decides policy
//!   (for example, "line too long")
//! - `Fatal`: the source is broken or an internal invariant failed
//! - `Unknown`: depends on the underlying I/O error

use std::io;

/// Result type for buffered read operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by [`BufferedReader`](crate::io::BufferedReader) and its adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The buffer filled up before a delimiter was found or a peek was satisfied.
    #[error("buffer full: {} bytes buffered without satisfying the request", .partial.len())]
    BufferOverflow {
        /// Everything that was buffered at the time of the overflow.
        partial: Vec<u8>,
    },

    /// A fixed-size read reached end-of-stream before completing.
    #[error("unexpected end of stream after {} bytes", .partial.len())]
    IncompleteRead {
        /// Bytes gathered before end-of-stream.
        partial: Vec<u8>,
    },

    /// The source kept returning zero bytes without data or end-of-stream.
    #[error("no progress after {attempts} consecutive empty reads")]
    NoProgress {
        /// Number of empty reads observed.
        attempts: usize,
        /// Bytes buffered or gathered when the reader gave up.
        partial: Vec<u8>,
    },

    /// The source reported more bytes than the region it was given.
    #[error("source reported {count} bytes for a {len}-byte region")]
    InvalidReadCount {
        /// Count reported by the source.
        count: usize,
        /// Length of the region handed to the source.
        len: usize,
        /// Bytes buffered when the violation was detected.
        partial: Vec<u8>,
    },

    /// A refill was requested while the buffer had no free space.
    #[error("refill requested on a full buffer")]
    FillOnFullBuffer,

    /// A text delimiter could not be represented as a single byte.
    #[error("delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),

    /// A line exceeded the configured maximum length.
    #[error("line exceeds maximum length of {max_length} bytes")]
    LineTooLong {
        /// Configured limit.
        max_length: usize,
        /// Bytes of the line collected so far.
        partial: Vec<u8>,
    },

    /// A line was not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8 {
        /// The raw line bytes.
        partial: Vec<u8>,
    },

    /// The byte source failed.
    #[error("I/O error: {source}")]
    Io {
        /// The error returned by the source.
        source: io::Error,
        /// Bytes buffered or scanned when the source failed.
        partial: Vec<u8>,
    },
}

impl Error {
    /// Returns the bytes attached to this error, if any.
    #[must_use]
    pub fn partial(&self) -> &[u8] {
        match self {
            Self::BufferOverflow { partial }
            | Self::IncompleteRead { partial }
            | Self::NoProgress { partial, .. }
            | Self::InvalidReadCount { partial, .. }
            | Self::LineTooLong { partial, .. }
            | Self::InvalidUtf8 { partial }
            | Self::Io { partial, .. } => partial,
            Self::FillOnFullBuffer | Self::InvalidDelimiter(_) => &[],
        }
    }

    /// Consumes the error and returns the attached bytes.
    #[must_use]
    pub fn into_partial(self) -> Vec<u8> {
        match self {
            Self::BufferOverflow { partial }
            | Self::IncompleteRead { partial }
            | Self::NoProgress { partial, .. }
            | Self::InvalidReadCount { partial, .. }
            | Self::LineTooLong { partial, .. }
            | Self::InvalidUtf8 { partial }
            | Self::Io { partial, .. } => partial,
            Self::FillOnFullBuffer | Self::InvalidDelimiter(_) => Vec::new(),
        }
    }

    /// Attaches context bytes to errors raised while refilling.
    ///
    /// Errors that already describe their own payload (overflow, short reads,
    /// line limits) keep it.
    #[must_use]
    pub(crate) fn with_partial(mut self, bytes: &[u8]) -> Self {
        match &mut self {
            Self::NoProgress { partial, .. }
            | Self::InvalidReadCount { partial, .. }
            | Self::Io { partial, .. } => {
                partial.clear();
                partial.extend_from_slice(bytes);
            }
            _ => {}
        }
        self
    }

    /// Puts bytes consumed by an outer adapter in front of the attached bytes.
    #[must_use]
    pub(crate) fn with_consumed_prefix(mut self, prefix: Vec<u8>) -> Self {
        if prefix.is_empty() {
            return self;
        }
        match &mut self {
            Self::NoProgress { partial, .. }
            | Self::InvalidReadCount { partial, .. }
            | Self::Io { partial, .. } => {
                let mut joined = prefix;
                joined.append(partial);
                *partial = joined;
            }
            _ => {}
        }
        self
    }

    /// Returns the recoverability classification for this error.
    #[must_use]
    pub fn recoverability(&self) -> Recoverability {
        match self {
            Self::BufferOverflow { .. }
            | Self::IncompleteRead { .. }
            | Self::InvalidDelimiter(_)
            | Self::LineTooLong { .. }
            | Self::InvalidUtf8 { .. } => Recoverability::Recoverable,
            Self::NoProgress { .. } | Self::InvalidReadCount { .. } | Self::FillOnFullBuffer => {
                Recoverability::Fatal
            }
            Self::Io { .. } => Recoverability::Unknown,
        }
    }

    /// Returns true if this error indicates a broken source or a violated invariant.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self.recoverability(), Recoverability::Fatal)
    }

    /// Returns true if this is a [`Error::BufferOverflow`].
    #[must_use]
    pub const fn is_buffer_overflow(&self) -> bool {
        matches!(self, Self::BufferOverflow { .. })
    }
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Self::Io {
            source,
            partial: Vec::new(),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::Io { source, .. } => source.kind(),
            Error::IncompleteRead { .. } => io::ErrorKind::UnexpectedEof,
            Error::InvalidDelimiter(_) => io::ErrorKind::InvalidInput,
            Error::LineTooLong { .. } | Error::InvalidUtf8 { .. } => io::ErrorKind::InvalidData,
            Error::BufferOverflow { .. }
            | Error::NoProgress { .. }
            | Error::InvalidReadCount { .. }
            | Error::FillOnFullBuffer => io::ErrorKind::Other,
        };
        Self::new(kind, err)
    }
}

/// Classification of error recoverability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recoverability {
    /// The reader remains usable; the caller applies its own policy.
    Recoverable,
    /// The source is broken or an invariant was violated; do not retry.
    Fatal,
    /// Depends on the underlying I/O error.
    Unknown,
}
