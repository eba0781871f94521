//! Buffered async reader.
//!
//! This module provides [`BufferedReader`], a fixed-capacity buffer in front of
//! a [`ByteSource`]. Besides plain reads it offers delimiter scanning that
//! hands out borrowed views into the buffer instead of copies.
//!
//! # Borrowed views
//!
//! [`read_slice`](BufferedReader::read_slice), [`peek`](BufferedReader::peek)
//! and [`read_line`](BufferedReader::read_line) return slices that borrow the
//! reader. The borrow checker rejects any further call on the reader while such
//! a slice is alive, so a view can never observe a refill.
//!
//! When a delimiter search fills the whole buffer, the full buffer is moved into
//! [`Error::BufferOverflow`] and the reader continues on a freshly allocated
//! buffer of the same capacity. Nothing is copied and nothing is lost.
//!
//! # Cancel Safety
//!
//! Cursor updates never straddle an `.await`. Dropping any read future leaves
//! the reader consistent: bytes already pulled from the source stay buffered.
//! `read_full` is **not** cancel-safe with respect to `dest` (it may be
//! partially written).

use super::ext::ByteSourceExt;
use super::{ByteSource, Lines};
use crate::config::{ReaderConfig, DEFAULT_BUF_SIZE};
use crate::error::{Error, Result};
use crate::tracing_compat::{debug, trace, warn};
use std::borrow::Cow;
use std::future::poll_fn;
use std::io;
use std::ops::Range;
use std::pin::Pin;
use std::task::{Context, Poll};

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Async buffered reader over a [`ByteSource`].
///
/// # Example
///
/// ```
/// use asupersync_bufio::io::BufferedReader;
///
/// # futures_lite::future::block_on(async {
/// let mut reader = BufferedReader::new(&b"ab\r\ncd\n"[..]);
///
/// {
///     let line = reader.read_line().await?.expect("first line");
///     assert_eq!(&*line.line, b"ab");
///     assert!(!line.more);
/// }
///
/// let rest = reader.read_line().await?.map(|l| l.line.into_owned());
/// assert_eq!(rest.as_deref(), Some(&b"cd"[..]));
///
/// assert!(reader.read_line().await?.is_none());
/// # Ok::<(), asupersync_bufio::Error>(())
/// # }).unwrap();
/// ```
#[derive(Debug)]
pub struct BufferedReader<S> {
    source: S,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    eof: bool,
    max_empty_reads: usize,
}

/// A line returned by [`BufferedReader::read_line`].
///
/// `more` is true when the line did not fit in the buffer: `line` is then a
/// fragment and the rest follows on subsequent calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFragment<'a> {
    /// Line bytes without the trailing LF or CRLF.
    pub line: Cow<'a, [u8]>,
    /// Whether the line continues in the next fragment.
    pub more: bool,
}

impl<S> BufferedReader<S> {
    /// Creates a new `BufferedReader` with the default capacity (4096 bytes).
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_config(ReaderConfig::new(), source)
    }

    /// Creates a new `BufferedReader` with the specified capacity.
    ///
    /// Capacities below [`MIN_BUF_SIZE`](crate::config::MIN_BUF_SIZE) are raised
    /// to it.
    #[must_use]
    pub fn with_capacity(capacity: usize, source: S) -> Self {
        Self::with_config(ReaderConfig::new().capacity(capacity), source)
    }

    /// Creates a new `BufferedReader` from a configuration.
    #[must_use]
    pub fn with_config(config: ReaderConfig, source: S) -> Self {
        Self {
            source,
            buf: vec![0u8; config.effective_capacity()].into_boxed_slice(),
            pos: 0,
            filled: 0,
            eof: false,
            max_empty_reads: config.effective_max_empty_reads(),
        }
    }

    /// Wraps `source` with the default capacity unless it already is a
    /// `BufferedReader`, in which case it is returned unchanged.
    pub fn create<T>(source: T) -> Self
    where
        T: IntoBufferedReader<Source = S>,
    {
        source.into_buffered_reader(DEFAULT_BUF_SIZE)
    }

    /// Like [`create`](Self::create) with an explicit capacity for new readers.
    pub fn create_with_capacity<T>(source: T, capacity: usize) -> Self
    where
        T: IntoBufferedReader<Source = S>,
    {
        source.into_buffered_reader(capacity)
    }

    /// Returns a reference to the underlying source.
    #[must_use]
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Returns a mutable reference to the underlying source.
    ///
    /// Reading directly from the source skips any buffered bytes.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consumes the reader and returns the underlying source.
    ///
    /// Buffered bytes that were not consumed are lost.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Returns the unread buffered bytes.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buf[self.pos..self.filled]
    }

    /// Returns the capacity of the internal buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the number of unread buffered bytes.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.filled - self.pos
    }

    /// Returns true once the source has reported end-of-stream.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Discards buffered bytes without touching the source.
    pub fn discard_buffer(&mut self) {
        self.pos = 0;
        self.filled = 0;
    }

    /// Rebinds the reader to `source`, clearing the buffer and the EOF flag.
    ///
    /// The buffer allocation is reused. Returns the previous source.
    pub fn reset(&mut self, source: S) -> S {
        self.discard_buffer();
        self.eof = false;
        std::mem::replace(&mut self.source, source)
    }

    /// Wraps the reader in a [`Lines`] adapter.
    #[must_use]
    pub fn lines(self) -> Lines<S> {
        Lines::new(self)
    }

    /// Moves the full buffer into a `BufferOverflow` error and continues on a
    /// fresh allocation.
    fn overflow(&mut self) -> Error {
        debug_assert_eq!(self.pos, 0);
        debug_assert_eq!(self.filled, self.buf.len());
        let fresh = vec![0u8; self.buf.len()].into_boxed_slice();
        let full = std::mem::replace(&mut self.buf, fresh);
        self.pos = 0;
        self.filled = 0;
        debug!(capacity = full.len(), "buffer overflow without delimiter");
        Error::BufferOverflow {
            partial: full.into_vec(),
        }
    }

    /// Puts `byte` back in front of the unread region.
    ///
    /// Returns false when there is no room, leaving the buffer untouched.
    fn unread_byte(&mut self, byte: u8) -> bool {
        if self.pos > 0 {
            self.pos -= 1;
            self.buf[self.pos] = byte;
            return true;
        }
        if self.filled == self.buf.len() {
            return false;
        }
        self.buf.copy_within(0..self.filled, 1);
        self.buf[0] = byte;
        self.filled += 1;
        true
    }

    fn invalid_count(&self, count: usize, len: usize) -> Error {
        warn!(count, len, "source reported more bytes than requested");
        Error::InvalidReadCount {
            count,
            len,
            partial: self.buffer().to_vec(),
        }
    }
}

impl<S: ByteSource + Unpin> BufferedReader<S> {
    /// Pulls more bytes from the source into the free tail of the buffer.
    async fn fill(&mut self) -> Result<()> {
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.filled, 0);
            self.filled -= self.pos;
            self.pos = 0;
        }

        if self.filled >= self.buf.len() {
            return Err(Error::FillOnFullBuffer);
        }

        for _ in 0..self.max_empty_reads {
            let len = self.buf.len() - self.filled;
            match self.source.read_some(&mut self.buf[self.filled..]).await? {
                None => {
                    debug!(buffered = self.filled, "source reached end of stream");
                    self.eof = true;
                    return Ok(());
                }
                Some(n) if n > len => return Err(self.invalid_count(n, len)),
                Some(0) => {
                    trace!("source returned an empty read");
                }
                Some(n) => {
                    self.filled += n;
                    trace!(read = n, buffered = self.filled, "buffer refilled");
                    return Ok(());
                }
            }
        }

        warn!(
            attempts = self.max_empty_reads,
            "source made no progress; giving up"
        );
        Err(Error::NoProgress {
            attempts: self.max_empty_reads,
            partial: self.buffer().to_vec(),
        })
    }

    /// Poll-based core of [`read`](Self::read).
    fn poll_read_buffered(
        &mut self,
        cx: &mut Context<'_>,
        dest: &mut [u8],
    ) -> Poll<Result<Option<usize>>> {
        if dest.is_empty() {
            return Poll::Ready(Ok(Some(0)));
        }

        if self.pos == self.filled {
            // Large request on an empty buffer: skip the extra copy.
            if dest.len() >= self.buf.len() {
                let len = dest.len();
                trace!(len, "large read bypasses the buffer");
                return match Pin::new(&mut self.source).poll_read(cx, dest) {
                    Poll::Pending => Poll::Pending,
                    Poll::Ready(Err(err)) => Poll::Ready(Err(err.into())),
                    Poll::Ready(Ok(Some(n))) if n > len => {
                        Poll::Ready(Err(self.invalid_count(n, len)))
                    }
                    Poll::Ready(Ok(outcome)) => {
                        if outcome.is_none() {
                            self.eof = true;
                        }
                        Poll::Ready(Ok(outcome))
                    }
                };
            }

            self.pos = 0;
            self.filled = 0;
            let len = self.buf.len();
            match Pin::new(&mut self.source).poll_read(cx, &mut self.buf) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(err)) => return Poll::Ready(Err(err.into())),
                Poll::Ready(Ok(None)) => {
                    self.eof = true;
                    return Poll::Ready(Ok(None));
                }
                Poll::Ready(Ok(Some(0))) => return Poll::Ready(Ok(Some(0))),
                Poll::Ready(Ok(Some(n))) if n > len => {
                    return Poll::Ready(Err(self.invalid_count(n, len)));
                }
                Poll::Ready(Ok(Some(n))) => self.filled = n,
            }
        }

        let to_copy = std::cmp::min(self.buffered(), dest.len());
        dest[..to_copy].copy_from_slice(&self.buf[self.pos..self.pos + to_copy]);
        self.pos += to_copy;
        Poll::Ready(Ok(Some(to_copy)))
    }

    /// Reads up to `dest.len()` bytes.
    ///
    /// Issues at most one read on the source. A short count is not an error;
    /// use [`read_full`](Self::read_full) when an exact amount is needed.
    /// Returns `Ok(Some(0))` for an empty `dest` (without touching the source)
    /// or when the source itself returned zero bytes, and `Ok(None)` at
    /// end-of-stream.
    pub async fn read(&mut self, dest: &mut [u8]) -> Result<Option<usize>> {
        poll_fn(|cx| self.poll_read_buffered(cx, &mut *dest)).await
    }

    /// Reads exactly `dest.len()` bytes.
    ///
    /// Returns `Ok(None)` if the stream ended before any byte was read and
    /// [`Error::IncompleteRead`] if it ended part way.
    pub async fn read_full(&mut self, dest: &mut [u8]) -> Result<Option<usize>> {
        let mut gathered = 0;
        let mut empty_reads = 0;

        while gathered < dest.len() {
            match self.read(&mut dest[gathered..]).await {
                Ok(None) if gathered == 0 => return Ok(None),
                Ok(None) => {
                    return Err(Error::IncompleteRead {
                        partial: dest[..gathered].to_vec(),
                    });
                }
                Ok(Some(0)) => {
                    empty_reads += 1;
                    if empty_reads >= self.max_empty_reads {
                        warn!(attempts = empty_reads, "source made no progress; giving up");
                        return Err(Error::NoProgress {
                            attempts: empty_reads,
                            partial: dest[..gathered].to_vec(),
                        });
                    }
                }
                Ok(Some(n)) => {
                    gathered += n;
                    empty_reads = 0;
                }
                Err(err) => return Err(err.with_partial(&dest[..gathered])),
            }
        }

        Ok(Some(dest.len()))
    }

    /// Reads a single byte, or `Ok(None)` at end-of-stream.
    pub async fn read_byte(&mut self) -> Result<Option<u8>> {
        while self.pos == self.filled {
            if self.eof {
                return Ok(None);
            }
            self.fill().await?;
        }

        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    /// Scans for `delim`, consumes through it, and returns the consumed range
    /// of `buf`.
    async fn scan_slice(&mut self, delim: u8) -> Result<Option<Range<usize>>> {
        // Bytes of the unread region already known not to contain `delim`.
        let mut scanned = 0;

        let range = loop {
            let start = self.pos + scanned;
            if let Some(i) = self.buf[start..self.filled].iter().position(|&b| b == delim) {
                break self.pos..start + i + 1;
            }

            if self.eof {
                if self.pos == self.filled {
                    return Ok(None);
                }
                break self.pos..self.filled;
            }

            if self.buffered() >= self.buf.len() {
                return Err(self.overflow());
            }

            scanned = self.filled - self.pos;
            if let Err(err) = self.fill().await {
                return Err(err.with_partial(self.buffer()));
            }
        };

        self.pos = range.end;
        Ok(Some(range))
    }

    /// Reads through the first occurrence of `delim`.
    ///
    /// The returned slice borrows the internal buffer and includes the
    /// delimiter. At end-of-stream the remaining bytes are returned without a
    /// delimiter, and `Ok(None)` once nothing is left.
    ///
    /// Fails with [`Error::BufferOverflow`] when the buffer fills without a
    /// delimiter; the error owns the full buffer contents and those bytes are
    /// consumed.
    pub async fn read_slice(&mut self, delim: u8) -> Result<Option<&[u8]>> {
        match self.scan_slice(delim).await? {
            Some(range) => Ok(Some(&self.buf[range])),
            None => Ok(None),
        }
    }

    /// Reads through `delim` and decodes the bytes as UTF-8 (lossily).
    ///
    /// `delim` must be a single ASCII character.
    pub async fn read_string(&mut self, delim: char) -> Result<Option<String>> {
        if !delim.is_ascii() {
            return Err(Error::InvalidDelimiter(delim));
        }
        let bytes = self.read_slice(delim as u8).await?;
        Ok(bytes.map(|bytes| String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Reads through `delim`, appending to `out` across buffer overflows.
    ///
    /// Unlike [`read_slice`](Self::read_slice) this is not limited by the
    /// buffer capacity. Returns the number of bytes appended, or `Ok(None)` if
    /// the stream ended before any byte was read.
    pub async fn read_until(&mut self, delim: u8, out: &mut Vec<u8>) -> Result<Option<usize>> {
        let start = out.len();
        loop {
            match self.scan_slice(delim).await {
                Ok(Some(range)) => {
                    out.extend_from_slice(&self.buf[range]);
                    return Ok(Some(out.len() - start));
                }
                Ok(None) if out.len() == start => return Ok(None),
                Ok(None) => return Ok(Some(out.len() - start)),
                Err(Error::BufferOverflow { partial }) => out.extend_from_slice(&partial),
                Err(err) => return Err(err),
            }
        }
    }

    /// Reads one line, accepting both LF and CRLF terminators.
    ///
    /// The terminator is stripped. If the line does not fit in the buffer a
    /// fragment is returned with `more` set, and the rest of the line follows
    /// on subsequent calls. A CR at the very end of a fragment is held back so
    /// a CRLF split across the boundary is still recognised.
    ///
    /// Returns `Ok(None)` at end-of-stream.
    pub async fn read_line(&mut self) -> Result<Option<LineFragment<'_>>> {
        let range = match self.scan_slice(LF).await {
            Ok(Some(range)) => range,
            Ok(None) => return Ok(None),
            Err(Error::BufferOverflow { mut partial }) => {
                if !self.eof && partial.last() == Some(&CR) && self.unread_byte(CR) {
                    partial.pop();
                }
                debug!(len = partial.len(), "returning partial line fragment");
                return Ok(Some(LineFragment {
                    line: Cow::Owned(partial),
                    more: true,
                }));
            }
            Err(err) => return Err(err),
        };

        let line = strip_line_ending(&self.buf[range]);
        Ok(Some(LineFragment {
            line: Cow::Borrowed(line),
            more: false,
        }))
    }

    /// Returns the next `n` bytes without consuming them.
    ///
    /// At end-of-stream fewer bytes may be returned, and `Ok(None)` once
    /// nothing is buffered. Fails with [`Error::BufferOverflow`] (carrying a
    /// copy of the buffered bytes) when `n` exceeds the capacity; the reader is
    /// not advanced in that case.
    pub async fn peek(&mut self, n: usize) -> Result<Option<&[u8]>> {
        while self.buffered() < n && self.buffered() < self.buf.len() && !self.eof {
            if let Err(err) = self.fill().await {
                return Err(err.with_partial(self.buffer()));
            }
        }

        let available = self.buffered();
        if available == 0 && self.eof {
            return Ok(None);
        }
        if available < n {
            if self.eof {
                return Ok(Some(self.buffer()));
            }
            return Err(Error::BufferOverflow {
                partial: self.buffer().to_vec(),
            });
        }

        Ok(Some(&self.buf[self.pos..self.pos + n]))
    }
}

impl<S: ByteSource + Unpin> ByteSource for BufferedReader<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        self.get_mut()
            .poll_read_buffered(cx, buf)
            .map_err(io::Error::from)
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    match line {
        [rest @ .., CR, LF] | [rest @ .., LF] => rest,
        _ => line,
    }
}

/// Conversion into a [`BufferedReader`].
///
/// Implemented for `BufferedReader` itself (returned unchanged) and for the
/// standard sources, which are wrapped in a new reader.
pub trait IntoBufferedReader {
    /// The source of the resulting reader.
    type Source;

    /// Wraps `self`, using `capacity` only when a new reader is created.
    fn into_buffered_reader(self, capacity: usize) -> BufferedReader<Self::Source>;
}

impl<S> IntoBufferedReader for BufferedReader<S> {
    type Source = S;

    fn into_buffered_reader(self, _capacity: usize) -> BufferedReader<S> {
        self
    }
}

impl<'a> IntoBufferedReader for &'a [u8] {
    type Source = &'a [u8];

    fn into_buffered_reader(self, capacity: usize) -> BufferedReader<Self> {
        BufferedReader::with_capacity(capacity, self)
    }
}

impl<T> IntoBufferedReader for io::Cursor<T>
where
    T: AsRef<[u8]> + Unpin,
{
    type Source = Self;

    fn into_buffered_reader(self, capacity: usize) -> BufferedReader<Self> {
        BufferedReader::with_capacity(capacity, self)
    }
}

impl<S> IntoBufferedReader for Box<S>
where
    S: ByteSource + Unpin + ?Sized,
{
    type Source = Self;

    fn into_buffered_reader(self, capacity: usize) -> BufferedReader<Self> {
        BufferedReader::with_capacity(capacity, self)
    }
}
