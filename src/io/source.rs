//! The `ByteSource` trait and its standard implementations.

use std::io;
use std::ops::DerefMut;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Async byte source consumed by [`BufferedReader`](super::BufferedReader).
///
/// A source writes up to `buf.len()` bytes into `buf` and reports how many it
/// wrote. Unlike `std::io::Read`, a zero count does **not** mean end-of-stream:
/// end-of-stream is reported explicitly as `Ok(None)`, and a zero count is a
/// short read that the caller may retry.
///
/// Readers always call `poll_read` with a non-empty `buf`. Reporting a count
/// larger than `buf.len()` is a contract violation.
pub trait ByteSource {
    /// Attempt to read bytes into `buf`.
    ///
    /// Returns `Ok(Some(n))` when `n` bytes were written, `Ok(None)` at
    /// end-of-stream.
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>>;
}

impl ByteSource for &[u8] {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        let this = self.get_mut();
        if this.is_empty() {
            return Poll::Ready(Ok(None));
        }

        let to_copy = std::cmp::min(this.len(), buf.len());
        buf[..to_copy].copy_from_slice(&this[..to_copy]);
        *this = &this[to_copy..];

        Poll::Ready(Ok(Some(to_copy)))
    }
}

impl<T> ByteSource for io::Cursor<T>
where
    T: AsRef<[u8]> + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        use std::io::Read as _;

        let this = self.get_mut();
        let len = this.get_ref().as_ref().len() as u64;
        if this.position() >= len && !buf.is_empty() {
            return Poll::Ready(Ok(None));
        }
        let n = this.read(buf)?;
        Poll::Ready(Ok(Some(n)))
    }
}

impl<S> ByteSource for &mut S
where
    S: ByteSource + Unpin + ?Sized,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        let this = self.get_mut();
        Pin::new(&mut **this).poll_read(cx, buf)
    }
}

impl<S> ByteSource for Box<S>
where
    S: ByteSource + Unpin + ?Sized,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        let this = self.get_mut();
        Pin::new(&mut **this).poll_read(cx, buf)
    }
}

impl<S, P> ByteSource for Pin<P>
where
    P: DerefMut<Target = S> + Unpin,
    S: ByteSource + ?Sized,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        self.get_mut().as_mut().poll_read(cx, buf)
    }
}
