//! Async line iterator.

use super::{BufferedReader, ByteSource};
use crate::error::{Error, Result};
use crate::tracing_compat::debug;
use std::mem;

/// Iterator over the lines of a [`BufferedReader`].
///
/// Fragments of lines longer than the reader's buffer are joined, so every
/// call yields a complete line. An optional length limit guards against
/// unbounded growth.
#[derive(Debug)]
pub struct Lines<S> {
    reader: BufferedReader<S>,
    buf: Vec<u8>,
    max_length: Option<usize>,
}

impl<S> Lines<S> {
    /// Creates a new `Lines` iterator without a length limit.
    #[must_use]
    pub fn new(reader: BufferedReader<S>) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            max_length: None,
        }
    }

    /// Creates a `Lines` iterator that rejects lines longer than `max_length`
    /// bytes (terminator excluded).
    #[must_use]
    pub fn with_max_length(reader: BufferedReader<S>, max_length: usize) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            max_length: Some(max_length),
        }
    }

    /// Returns the configured length limit.
    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Returns a reference to the underlying reader.
    #[must_use]
    pub fn get_ref(&self) -> &BufferedReader<S> {
        &self.reader
    }

    /// Consumes the iterator and returns the underlying reader.
    #[must_use]
    pub fn into_inner(self) -> BufferedReader<S> {
        self.reader
    }
}

impl<S: ByteSource + Unpin> Lines<S> {
    /// Returns the next line without its terminator, or `Ok(None)` at
    /// end-of-stream.
    ///
    /// Fails with [`Error::LineTooLong`] once a line exceeds the limit; the
    /// remainder of that line is returned by the next call. Lines that are not
    /// valid UTF-8 fail with [`Error::InvalidUtf8`]. When the source fails
    /// part way through a long line, the fragments already joined are part of
    /// the error's partial bytes.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();

        loop {
            let next = match self.reader.read_line().await {
                Ok(next) => next,
                Err(err) => return Err(err.with_consumed_prefix(mem::take(&mut self.buf))),
            };
            let Some(fragment) = next else {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                break;
            };
            self.buf.extend_from_slice(&fragment.line);
            let more = fragment.more;

            if let Some(max_length) = self.max_length {
                if self.buf.len() > max_length {
                    debug!(max_length, len = self.buf.len(), "line exceeds limit");
                    return Err(Error::LineTooLong {
                        max_length,
                        partial: mem::take(&mut self.buf),
                    });
                }
            }

            if !more {
                break;
            }
        }

        String::from_utf8(mem::take(&mut self.buf))
            .map(Some)
            .map_err(|e| Error::InvalidUtf8 {
                partial: e.into_bytes(),
            })
    }
}
