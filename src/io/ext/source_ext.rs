//! ByteSource extension methods.

use crate::io::ByteSource;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Extension trait for `ByteSource`.
pub trait ByteSourceExt: ByteSource {
    /// Issue a single read into `buf`.
    ///
    /// The future resolves to the raw result of one `poll_read`: a byte
    /// count (possibly zero) or `None` at end-of-stream.
    fn read_some<'a>(&'a mut self, buf: &'a mut [u8]) -> ReadSome<'a, Self>
    where
        Self: Unpin,
    {
        ReadSome { source: self, buf }
    }
}

impl<S: ByteSource + ?Sized> ByteSourceExt for S {}

/// Future for [`ByteSourceExt::read_some`].
#[derive(Debug)]
pub struct ReadSome<'a, S: ?Sized> {
    source: &'a mut S,
    buf: &'a mut [u8],
}

impl<S> Future for ReadSome<'_, S>
where
    S: ByteSource + Unpin + ?Sized,
{
    type Output = io::Result<Option<usize>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut *this.source).poll_read(cx, this.buf)
    }
}
